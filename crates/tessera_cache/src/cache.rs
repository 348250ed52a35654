//! High-level cache orchestrator.
//!
//! [`IncrementalCache`] ties the artifact store, the header and the dirty-set
//! together. A build round looks like this:
//!
//! 1. [`mark_dirty`](IncrementalCache::mark_dirty) with every source that was
//!    removed or is about to be recompiled;
//! 2. [`compare_and_update`](IncrementalCache::compare_and_update) with the
//!    freshly compiled artifacts, which stores them and reports symbol-level
//!    changes to a [`ChangeCollector`];
//! 3. [`non_dirty_package_parts`](IncrementalCache::non_dirty_package_parts)
//!    to reuse the artifacts of untouched sources.
//!
//! The cache assumes a single driver and performs no locking. A failed
//! `compare_and_update` can leave the store partially updated; callers are
//! expected to [`clean`](IncrementalCache::clean) and rebuild.

use std::collections::{BTreeMap, BTreeSet};

use tessera_common::SourceId;

use crate::changes::ChangeCollector;
use crate::config::CacheConfig;
use crate::error::CacheError;
use crate::header::HeaderStore;
use crate::record::ArtifactRecord;
use crate::registry::{CacheMaps, MapRegistry, PersistentMap};
use crate::storage::{FileStorage, KeyValueStorage};
use crate::store::ArtifactStore;
use crate::symbols::{extract_symbols, SymbolMap};

/// Artifacts keyed by source, ordered by source identity.
pub type ArtifactMap = BTreeMap<SourceId, ArtifactRecord>;

/// Incremental compilation cache for one build.
///
/// The store and header are owned exclusively by one instance. Call
/// [`close`](IncrementalCache::close) when the round ends; dropping an
/// unclosed cache still flushes, but can only log a failure.
pub struct IncrementalCache<S: KeyValueStorage = FileStorage> {
    config: CacheConfig,
    registry: MapRegistry,
    artifacts: ArtifactStore<S>,
    header: HeaderStore,
    dirty: BTreeSet<SourceId>,
    closed: bool,
}

impl IncrementalCache<FileStorage> {
    /// Opens the cache described by `config`, loading any persisted records.
    ///
    /// Fails with [`CacheError::Config`] if `config` does not validate.
    pub fn open(config: CacheConfig) -> Result<Self, CacheError> {
        config.validate()?;
        let mut registry = MapRegistry::new(&config.dir);
        let storage_file = registry.register(&config.map_name)?;
        let storage = FileStorage::open(&storage_file)?;
        Ok(Self::assemble(config, registry, storage))
    }
}

impl<S: KeyValueStorage> IncrementalCache<S> {
    /// Creates a cache over an already opened storage engine.
    ///
    /// Fails with [`CacheError::Config`] if `config` does not validate.
    pub fn with_storage(config: CacheConfig, storage: S) -> Result<Self, CacheError> {
        config.validate()?;
        let mut registry = MapRegistry::new(&config.dir);
        registry.register(&config.map_name)?;
        Ok(Self::assemble(config, registry, storage))
    }

    fn assemble(config: CacheConfig, registry: MapRegistry, storage: S) -> Self {
        let header = HeaderStore::new(&config.dir, config.header_file.clone());
        let artifacts = ArtifactStore::new(config.map_name.clone(), storage);
        Self {
            config,
            registry,
            artifacts,
            header,
            dirty: BTreeSet::new(),
            closed: false,
        }
    }

    /// Adds removed or about-to-be-recompiled sources to the dirty set.
    /// Marking a source twice has no further effect.
    pub fn mark_dirty<I>(&mut self, sources: I)
    where
        I: IntoIterator<Item = SourceId>,
    {
        self.dirty.extend(sources);
    }

    /// Sources marked dirty since the last reconciliation.
    pub fn dirty_sources(&self) -> &BTreeSet<SourceId> {
        &self.dirty
    }

    /// Reconciles the store with the artifacts compiled this round.
    ///
    /// Dirty sources missing from `new_artifacts` are removed, reporting each
    /// of their symbols as `(old, None)`. Every entry of `new_artifacts` is
    /// then diffed against its stored record, reporting each symbol of the
    /// union of both symbol maps once, and stored. Pairs are reported even
    /// when nothing changed.
    ///
    /// The dirty set is empty afterwards, also when an error is returned.
    ///
    /// The update is not transactional. A source's change pairs are reported
    /// before its new record is stored, so a failed store leaves the
    /// collector holding pairs for a record the cache does not have, and
    /// earlier sources of the same call stay updated.
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(dirty = self.dirty.len(), compiled = new_artifacts.len())
    )]
    pub fn compare_and_update<C>(
        &mut self,
        new_artifacts: &ArtifactMap,
        collector: &mut C,
    ) -> Result<(), CacheError>
    where
        C: ChangeCollector + ?Sized,
    {
        let dirty = std::mem::take(&mut self.dirty);
        for id in dirty.iter().filter(|id| !new_artifacts.contains_key(*id)) {
            self.remove_source(id, collector)?;
        }

        for (id, record) in new_artifacts {
            self.update_source(id, record, collector)?;
        }
        Ok(())
    }

    fn remove_source<C>(&mut self, id: &SourceId, collector: &mut C) -> Result<(), CacheError>
    where
        C: ChangeCollector + ?Sized,
    {
        let record = self
            .artifacts
            .get(id)?
            .ok_or_else(|| CacheError::MissingDirtyEntry { id: id.clone() })?;
        let symbols = extract_symbols(id, record.metadata())?;
        tracing::debug!(source = %id, symbols = symbols.len(), "removing artifact");

        for descriptor in symbols.into_values() {
            collector.collect_change(Some(descriptor), None);
        }
        self.artifacts.remove(id)
    }

    fn update_source<C>(
        &mut self,
        id: &SourceId,
        record: &ArtifactRecord,
        collector: &mut C,
    ) -> Result<(), CacheError>
    where
        C: ChangeCollector + ?Sized,
    {
        let old_symbols = match self.artifacts.get(id)? {
            Some(old) => extract_symbols(id, old.metadata())?,
            None => SymbolMap::new(),
        };
        let mut new_symbols = extract_symbols(id, record.metadata())?;
        tracing::debug!(
            source = %id,
            old = old_symbols.len(),
            new = new_symbols.len(),
            "updating artifact"
        );

        for (symbol, old) in old_symbols {
            let new = new_symbols.remove(&symbol);
            collector.collect_change(Some(old), new);
        }
        for new in new_symbols.into_values() {
            collector.collect_change(None, Some(new));
        }
        self.artifacts.put(id, record)
    }

    /// Stored artifacts of every source not currently marked dirty.
    pub fn non_dirty_package_parts(&self) -> Result<ArtifactMap, CacheError> {
        let mut parts = ArtifactMap::new();
        for id in self.artifacts.keys()? {
            if self.dirty.contains(&id) {
                continue;
            }
            if let Some(record) = self.artifacts.get(&id)? {
                parts.insert(id, record);
            }
        }
        Ok(parts)
    }

    /// Reads the cache header.
    pub fn header(&self) -> Result<Vec<u8>, CacheError> {
        self.header.get()
    }

    /// Replaces the cache header.
    pub fn set_header(&self, bytes: &[u8]) -> Result<(), CacheError> {
        self.header.set(bytes)
    }

    /// The artifact store.
    pub fn artifacts(&self) -> &ArtifactStore<S> {
        &self.artifacts
    }

    /// The configuration this cache was opened with.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// The registry of persistent maps owned by this cache.
    pub fn registry(&self) -> &MapRegistry {
        &self.registry
    }

    /// Makes every write so far durable.
    pub fn flush(&mut self) -> Result<(), CacheError> {
        self.flush_maps()
    }

    /// Drops every stored artifact, the header and the dirty set.
    pub fn clean(&mut self) -> Result<(), CacheError> {
        tracing::info!(dir = %self.config.dir.display(), "cleaning cache");
        self.dirty.clear();
        self.clean_maps()?;
        self.header.remove()?;
        self.flush_maps()
    }

    /// Flushes and releases the cache.
    pub fn close(mut self) -> Result<(), CacheError> {
        self.closed = true;
        self.flush_maps()
    }
}

impl<S: KeyValueStorage> CacheMaps for IncrementalCache<S> {
    fn maps(&self) -> Vec<&dyn PersistentMap> {
        vec![&self.artifacts]
    }

    fn maps_mut(&mut self) -> Vec<&mut dyn PersistentMap> {
        vec![&mut self.artifacts]
    }
}

impl<S: KeyValueStorage> Drop for IncrementalCache<S> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(e) = self.flush_maps() {
            tracing::warn!(error = %e, "failed to flush cache on drop");
        }
    }
}
