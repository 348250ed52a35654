//! Canonical identity of a source file tracked by the cache.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Reasons a path cannot become a [`SourceId`].
#[derive(Debug, thiserror::Error)]
pub enum SourceIdError {
    /// The path is not valid UTF-8 and has no lossless string key.
    #[error("source path is not valid UTF-8: {}", path.display())]
    NonUtf8 {
        /// The rejected path.
        path: PathBuf,
    },

    /// A stored key is not an absolute path.
    #[error("source key '{key}' is not an absolute path")]
    NotAbsolute {
        /// The rejected key.
        key: String,
    },

    /// The working directory needed to resolve a relative path is unavailable.
    #[error("cannot resolve {} against the working directory: {source}", path.display())]
    CurrentDir {
        /// The relative path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Resolving symlinks failed.
    #[error("cannot canonicalize {}: {source}", path.display())]
    Canonicalize {
        /// The path that failed to resolve.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

/// Canonical, unique key for one source file.
///
/// A `SourceId` always holds an absolute, lexically normalized UTF-8 path:
/// `.` components are dropped and `..` components pop their parent. Two
/// spellings of the same path produce equal identities, and distinct
/// identities always have distinct [`canonical_key`](SourceId::canonical_key)s.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SourceId(PathBuf);

impl SourceId {
    /// Creates an identity from a path without touching the filesystem.
    ///
    /// Relative paths are resolved against the current working directory.
    /// Paths that are not valid UTF-8 are rejected.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, SourceIdError> {
        let path = path.as_ref();
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            let cwd = std::env::current_dir().map_err(|source| SourceIdError::CurrentDir {
                path: path.to_path_buf(),
                source,
            })?;
            cwd.join(path)
        };
        Self::from_normalized(normalize(&absolute))
    }

    /// Creates an identity from an existing file, resolving symlinks.
    pub fn canonicalize(path: impl AsRef<Path>) -> Result<Self, SourceIdError> {
        let path = path.as_ref();
        let resolved =
            std::fs::canonicalize(path).map_err(|source| SourceIdError::Canonicalize {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_normalized(normalize(&resolved))
    }

    /// Rebuilds an identity from the string produced by
    /// [`SourceId::canonical_key`]. Relative keys are rejected.
    pub fn from_canonical_key(key: &str) -> Result<Self, SourceIdError> {
        let path = Path::new(key);
        if !path.is_absolute() {
            return Err(SourceIdError::NotAbsolute {
                key: key.to_string(),
            });
        }
        Self::from_normalized(normalize(path))
    }

    fn from_normalized(path: PathBuf) -> Result<Self, SourceIdError> {
        if path.to_str().is_none() {
            return Err(SourceIdError::NonUtf8 { path });
        }
        Ok(Self(path))
    }

    /// Returns the canonical string form used as the storage key.
    pub fn canonical_key(&self) -> String {
        // Construction guarantees UTF-8, so this never substitutes.
        self.0.to_string_lossy().into_owned()
    }

    /// Returns the normalized path.
    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Returns the file name without its extension, or an empty string for
    /// a bare root path.
    pub fn base_name(&self) -> &str {
        self.0.file_stem().and_then(|s| s.to_str()).unwrap_or("")
    }
}

impl TryFrom<String> for SourceId {
    type Error = SourceIdError;

    fn try_from(key: String) -> Result<Self, Self::Error> {
        Self::from_canonical_key(&key)
    }
}

impl From<SourceId> for String {
    fn from(id: SourceId) -> Self {
        id.canonical_key()
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl fmt::Debug for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SourceId({})", self.0.display())
    }
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(part) => out.push(part),
        }
    }
    out
}
