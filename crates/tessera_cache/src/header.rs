//! The cache-wide header blob.
//!
//! The header is a single opaque file next to the persistent maps. Drivers
//! use it to fingerprint the state the cache was built for (compiler
//! version, flags); its contents are never interpreted here.

use std::path::{Path, PathBuf};

use crate::error::CacheError;

/// Reads and writes the header file of one cache directory.
#[derive(Debug, Clone)]
pub struct HeaderStore {
    cache_dir: PathBuf,
    file_name: String,
}

impl HeaderStore {
    /// Creates a header store for `<cache_dir>/<file_name>`.
    pub fn new(cache_dir: &Path, file_name: impl Into<String>) -> Self {
        Self {
            cache_dir: cache_dir.to_path_buf(),
            file_name: file_name.into(),
        }
    }

    /// Path of the header file.
    pub fn path(&self) -> PathBuf {
        self.cache_dir.join(&self.file_name)
    }

    /// Returns `true` if a header has been written.
    pub fn exists(&self) -> bool {
        self.path().is_file()
    }

    /// Reads the header; fails with [`CacheError::HeaderNotFound`] if it was
    /// never written.
    pub fn get(&self) -> Result<Vec<u8>, CacheError> {
        let path = self.path();
        match std::fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(CacheError::HeaderNotFound { path })
            }
            Err(e) => Err(CacheError::io(path, e)),
        }
    }

    /// Replaces the header, creating the cache directory if needed.
    ///
    /// The blob is written to a temporary file and renamed into place, so a
    /// later [`HeaderStore::get`] sees either the old or the new blob.
    pub fn set(&self, bytes: &[u8]) -> Result<(), CacheError> {
        std::fs::create_dir_all(&self.cache_dir).map_err(|e| CacheError::io(&self.cache_dir, e))?;
        let path = self.path();
        let temp = path.with_extension("tmp");
        std::fs::write(&temp, bytes).map_err(|e| CacheError::io(&temp, e))?;
        std::fs::rename(&temp, &path).map_err(|e| CacheError::io(&path, e))?;
        tracing::debug!(path = %path.display(), len = bytes.len(), "wrote cache header");
        Ok(())
    }

    /// Deletes the header; a missing header is a no-op.
    pub fn remove(&self) -> Result<(), CacheError> {
        let path = self.path();
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::io(path, e)),
        }
    }
}
