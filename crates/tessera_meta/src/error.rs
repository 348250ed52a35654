//! Error types for decoding and resolving structural metadata.

use crate::names::NameKind;

/// Errors produced while decoding a fragment or resolving its name tables.
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    /// The input is shorter than the fixed fragment header.
    #[error("metadata truncated: expected at least {expected} bytes, got {actual}")]
    Truncated {
        /// Minimum number of bytes required.
        expected: usize,
        /// Number of bytes available.
        actual: usize,
    },

    /// The input does not start with the fragment magic bytes.
    #[error("invalid metadata magic: {found:02x?}")]
    BadMagic {
        /// The four bytes found at the start of the input.
        found: [u8; 4],
    },

    /// The fragment was written by an incompatible format version.
    #[error("metadata version mismatch: expected {expected}, got {actual}")]
    VersionMismatch {
        /// The format version this decoder understands.
        expected: u32,
        /// The format version found in the input.
        actual: u32,
    },

    /// The fragment payload could not be decoded.
    #[error("failed to decode metadata: {reason}")]
    Decode {
        /// Description of the decode failure.
        reason: String,
    },

    /// The fragment could not be encoded.
    #[error("failed to encode metadata: {reason}")]
    Encode {
        /// Description of the encode failure.
        reason: String,
    },

    /// A table index points past the end of its table.
    #[error("{table} index {index} out of range (table has {len} entries)")]
    IndexOutOfRange {
        /// Name of the table being indexed.
        table: &'static str,
        /// The offending index.
        index: u32,
        /// Number of entries in the table.
        len: usize,
    },

    /// A qualified name has a different kind than its use requires.
    #[error("qualified name {index} is a {found} name, expected a {expected} name")]
    UnexpectedNameKind {
        /// Index of the qualified name.
        index: u32,
        /// The kind the caller required.
        expected: NameKind,
        /// The kind found in the table.
        found: NameKind,
    },

    /// Following parent links from a qualified name never reaches a root.
    #[error("qualified name {index} has a cyclic parent chain")]
    CyclicName {
        /// Index where resolution started.
        index: u32,
    },
}
