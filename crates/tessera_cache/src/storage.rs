//! Durable key-value storage engines behind the artifact store.
//!
//! [`KeyValueStorage`] is the narrow interface the cache needs: get, put,
//! remove, key listing and flush. [`FileStorage`] keeps one map per file,
//! loaded on open and rewritten atomically on flush. [`MemoryStorage`]
//! keeps everything in memory and is used for ephemeral caches and tests.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::CacheError;

/// Magic bytes identifying a Tessera storage file.
const STORAGE_MAGIC: [u8; 4] = *b"TSKV";

/// Current storage file format version.
const STORAGE_FORMAT_VERSION: u32 = 1;

/// Synchronous string-keyed byte storage.
pub trait KeyValueStorage {
    /// Returns the value stored under `key`.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Stores `value` under `key`, replacing any previous value.
    fn put(&mut self, key: &str, value: Vec<u8>) -> Result<(), CacheError>;

    /// Removes `key`; removing a missing key is a no-op.
    fn remove(&mut self, key: &str) -> Result<(), CacheError>;

    /// Returns every stored key in ascending order.
    fn keys(&self) -> Result<Vec<String>, CacheError>;

    /// Makes all previous writes durable.
    fn flush(&mut self) -> Result<(), CacheError>;

    /// Removes every entry.
    fn clear(&mut self) -> Result<(), CacheError>;
}

/// Header written before the entries of a storage file.
#[derive(Debug, Serialize, Deserialize)]
struct StorageHeader {
    magic: [u8; 4],
    format_version: u32,
}

/// A map persisted as a single bincode file.
///
/// Entries are loaded when the file is opened and held in memory. `flush`
/// writes the whole map to a temporary sibling file and renames it over the
/// original, so a reader never observes a partially written map.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: BTreeMap<String, Vec<u8>>,
    dirty: bool,
}

impl FileStorage {
    /// Opens the storage file at `path`; a missing file is an empty map.
    pub fn open(path: &Path) -> Result<Self, CacheError> {
        let entries = if path.exists() {
            let raw = std::fs::read(path).map_err(|e| CacheError::io(path, e))?;
            decode_entries(path, &raw)?
        } else {
            BTreeMap::new()
        };
        tracing::debug!(path = %path.display(), entries = entries.len(), "opened storage");
        Ok(Self {
            path: path.to_path_buf(),
            entries,
            dirty: false,
        })
    }

    /// Returns the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `true` if there are writes not yet flushed.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: Vec<u8>) -> Result<(), CacheError> {
        self.entries.insert(key.to_string(), value);
        self.dirty = true;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), CacheError> {
        if self.entries.remove(key).is_some() {
            self.dirty = true;
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, CacheError> {
        Ok(self.entries.keys().cloned().collect())
    }

    fn flush(&mut self) -> Result<(), CacheError> {
        if !self.dirty {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CacheError::io(parent, e))?;
        }

        let header = StorageHeader {
            magic: STORAGE_MAGIC,
            format_version: STORAGE_FORMAT_VERSION,
        };
        let bytes =
            bincode::serde::encode_to_vec((&header, &self.entries), bincode::config::standard())
                .map_err(|e| CacheError::Serialization {
                    reason: e.to_string(),
                })?;

        // Write to a temporary file first, then atomically rename
        let temp = self.path.with_extension("tmp");
        std::fs::write(&temp, &bytes).map_err(|e| CacheError::io(&temp, e))?;
        std::fs::rename(&temp, &self.path).map_err(|e| CacheError::io(&self.path, e))?;

        tracing::debug!(
            path = %self.path.display(),
            entries = self.entries.len(),
            bytes = bytes.len(),
            "flushed storage"
        );
        self.dirty = false;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), CacheError> {
        self.entries.clear();
        self.dirty = true;
        Ok(())
    }
}

fn decode_entries(path: &Path, raw: &[u8]) -> Result<BTreeMap<String, Vec<u8>>, CacheError> {
    let corrupt = |reason: String| CacheError::StorageCorruption {
        location: path.display().to_string(),
        reason,
    };
    let ((header, entries), consumed): ((StorageHeader, BTreeMap<String, Vec<u8>>), usize) =
        bincode::serde::decode_from_slice(raw, bincode::config::standard())
            .map_err(|e| corrupt(e.to_string()))?;
    if header.magic != STORAGE_MAGIC {
        return Err(corrupt(format!("invalid magic {:02x?}", header.magic)));
    }
    if header.format_version != STORAGE_FORMAT_VERSION {
        return Err(corrupt(format!(
            "format version {} (expected {STORAGE_FORMAT_VERSION})",
            header.format_version
        )));
    }
    if consumed != raw.len() {
        return Err(corrupt(format!("{} trailing bytes", raw.len() - consumed)));
    }
    Ok(entries)
}

/// In-memory storage with no durability.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    entries: BTreeMap<String, Vec<u8>>,
}

impl MemoryStorage {
    /// Creates an empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: Vec<u8>) -> Result<(), CacheError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), CacheError> {
        self.entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, CacheError> {
        Ok(self.entries.keys().cloned().collect())
    }

    fn flush(&mut self) -> Result<(), CacheError> {
        Ok(())
    }

    fn clear(&mut self) -> Result<(), CacheError> {
        self.entries.clear();
        Ok(())
    }
}
