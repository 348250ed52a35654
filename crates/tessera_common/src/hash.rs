//! Fingerprints of cached bytes, printed by cache dumps.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use xxhash_rust::xxh3::{xxh3_128, Xxh3};

/// XXH3-128 digest of a byte buffer, rendered as 32 lowercase hex digits.
///
/// Serialized as its hex string so dumps stay readable in JSON.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ContentHash(u128);

impl ContentHash {
    /// Hashes one buffer.
    pub fn from_bytes(data: &[u8]) -> Self {
        Self(xxh3_128(data))
    }

    /// Hashes several buffers as one value.
    ///
    /// Each section is framed by its length, so moving bytes across a
    /// section boundary changes the digest.
    pub fn from_sections(sections: &[&[u8]]) -> Self {
        let mut hasher = Xxh3::new();
        for section in sections {
            hasher.update(&(section.len() as u64).to_le_bytes());
            hasher.update(section);
        }
        Self(hasher.digest128())
    }

    /// The raw digest.
    pub fn as_u128(self) -> u128 {
        self.0
    }
}

/// A string that is not 32 hex digits.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid content hash '{0}'")]
pub struct ParseHashError(String);

impl FromStr for ContentHash {
    type Err = ParseHashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 32 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ParseHashError(s.to_string()));
        }
        u128::from_str_radix(s, 16)
            .map(Self)
            .map_err(|_| ParseHashError(s.to_string()))
    }
}

impl TryFrom<String> for ContentHash {
    type Error = ParseHashError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ContentHash> for String {
    fn from(hash: ContentHash) -> Self {
        hash.to_string()
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({:08x}..)", self.0 >> 96)
    }
}
