//! Error types for cache operations.

use std::path::PathBuf;

use tessera_common::SourceId;
use tessera_meta::MetadataError;

use crate::config::ConfigError;

/// Errors that can occur during cache operations.
///
/// The cache is an optimization over full recompilation, so nothing here is
/// retried or recovered internally. Every variant reaches the caller, whose
/// sanctioned response is to discard the cache and rebuild from scratch.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// An I/O error occurred while reading or writing cache files.
    #[error("cache I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Stored bytes do not parse according to their fixed layout.
    #[error("corrupt cache data in {location}: {reason}")]
    StorageCorruption {
        /// The storage key or file that holds the corrupt bytes.
        location: String,
        /// Description of the layout violation.
        reason: String,
    },

    /// A source marked dirty has no stored record to remove.
    #[error("dirty source {id} has no stored artifact")]
    MissingDirtyEntry {
        /// The dirty source.
        id: SourceId,
    },

    /// The header was read before it was ever written.
    #[error("cache header not found at {path}")]
    HeaderNotFound {
        /// Where the header was expected.
        path: PathBuf,
    },

    /// A record's structural metadata could not be decoded.
    #[error("malformed metadata for {id}: {source}")]
    MalformedMetadata {
        /// The source whose metadata failed to decode.
        id: SourceId,
        /// The decoder error.
        source: MetadataError,
    },

    /// A storage engine failed to serialize its contents.
    #[error("serialization error: {reason}")]
    Serialization {
        /// Description of the serialization failure.
        reason: String,
    },

    /// The configuration a cache was opened with is invalid.
    #[error("invalid cache configuration: {source}")]
    Config {
        /// The validation error.
        #[from]
        source: ConfigError,
    },

    /// Two persistent maps were registered under the same name.
    #[error("persistent map '{name}' is already registered")]
    DuplicateMap {
        /// The duplicated map name.
        name: String,
    },
}

impl CacheError {
    /// Wraps an I/O error with the path it occurred at.
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
