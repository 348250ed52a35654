//! Bookkeeping for the named persistent maps owned by a cache.
//!
//! A cache owns a [`MapRegistry`] that hands out storage file locations and
//! rejects duplicate names, and it exposes its maps through the
//! [`CacheMaps`] capability so that flushing, cleaning and dumping apply to
//! every map uniformly.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::error::CacheError;

/// File extension of persistent map storage files.
const STORAGE_EXT: &str = "tab";

/// Operations every registered persistent map supports.
pub trait PersistentMap {
    /// The logical name the map was registered under.
    fn name(&self) -> &str;

    /// Makes all previous writes durable.
    fn flush(&mut self) -> Result<(), CacheError>;

    /// Removes every entry.
    fn clean(&mut self) -> Result<(), CacheError>;

    /// Renders one human-readable line per entry.
    fn dump(&self) -> Result<Vec<String>, CacheError>;
}

/// Tracks which logical map names a cache has registered and where their
/// storage files live.
#[derive(Debug)]
pub struct MapRegistry {
    cache_dir: PathBuf,
    names: BTreeSet<String>,
}

impl MapRegistry {
    /// Creates an empty registry rooted at the cache directory.
    pub fn new(cache_dir: &Path) -> Self {
        Self {
            cache_dir: cache_dir.to_path_buf(),
            names: BTreeSet::new(),
        }
    }

    /// Registers a map name and returns its storage file path.
    pub fn register(&mut self, name: &str) -> Result<PathBuf, CacheError> {
        if !self.names.insert(name.to_string()) {
            return Err(CacheError::DuplicateMap {
                name: name.to_string(),
            });
        }
        tracing::trace!(map = name, "registered persistent map");
        Ok(self.storage_file(name))
    }

    /// Returns the storage file path for a map name.
    pub fn storage_file(&self, name: &str) -> PathBuf {
        self.cache_dir.join(format!("{name}.{STORAGE_EXT}"))
    }

    /// Returns `true` if `name` has been registered.
    pub fn is_registered(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Registered names in ascending order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// The cache root directory.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }
}

/// Capability of an owner of persistent maps.
///
/// Implementors only list their maps; the provided methods apply an
/// operation to each of them in order, stopping at the first error.
pub trait CacheMaps {
    /// The maps owned by this value.
    fn maps(&self) -> Vec<&dyn PersistentMap>;

    /// Mutable access to the maps owned by this value.
    fn maps_mut(&mut self) -> Vec<&mut dyn PersistentMap>;

    /// Flushes every map.
    fn flush_maps(&mut self) -> Result<(), CacheError> {
        for map in self.maps_mut() {
            map.flush()?;
        }
        Ok(())
    }

    /// Cleans every map.
    fn clean_maps(&mut self) -> Result<(), CacheError> {
        for map in self.maps_mut() {
            map.clean()?;
        }
        Ok(())
    }

    /// Dumps every map under a `name:` heading.
    fn dump_maps(&self) -> Result<String, CacheError> {
        let mut out = String::new();
        for map in self.maps() {
            out.push_str(map.name());
            out.push_str(":\n");
            for line in map.dump()? {
                out.push_str("  ");
                out.push_str(&line);
                out.push('\n');
            }
        }
        Ok(out)
    }
}
