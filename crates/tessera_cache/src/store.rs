//! Persistent mapping from source identity to artifact record.

use std::collections::BTreeSet;

use tessera_common::{ContentHash, SourceId};

use crate::error::CacheError;
use crate::record::{ArtifactRecord, RecordError};
use crate::registry::PersistentMap;
use crate::storage::KeyValueStorage;

/// Artifact records keyed by the canonical form of their [`SourceId`].
///
/// Values are stored in the fixed record layout of [`ArtifactRecord`]. The
/// store adds no caching of its own on top of the storage engine.
#[derive(Debug)]
pub struct ArtifactStore<S> {
    name: String,
    storage: S,
}

impl<S: KeyValueStorage> ArtifactStore<S> {
    /// Creates a store named `name` over `storage`.
    pub fn new(name: impl Into<String>, storage: S) -> Self {
        Self {
            name: name.into(),
            storage,
        }
    }

    /// Returns the record stored for `id`.
    pub fn get(&self, id: &SourceId) -> Result<Option<ArtifactRecord>, CacheError> {
        self.get_by_key(&id.canonical_key())
    }

    /// Returns the record stored under a canonical key.
    pub fn get_by_key(&self, key: &str) -> Result<Option<ArtifactRecord>, CacheError> {
        let Some(bytes) = self.storage.get(key)? else {
            return Ok(None);
        };
        ArtifactRecord::decode(&bytes)
            .map(Some)
            .map_err(|e| CacheError::StorageCorruption {
                location: key.to_string(),
                reason: e.to_string(),
            })
    }

    /// Stores `record` for `id`, replacing any previous record.
    pub fn put(&mut self, id: &SourceId, record: &ArtifactRecord) -> Result<(), CacheError> {
        let key = id.canonical_key();
        let bytes = record.encode().map_err(|e| encode_error(&key, e))?;
        self.storage.put(&key, bytes)
    }

    /// Removes the record for `id`; a missing record is a no-op.
    pub fn remove(&mut self, id: &SourceId) -> Result<(), CacheError> {
        self.storage.remove(&id.canonical_key())
    }

    /// Returns every stored source identity.
    ///
    /// A key that is not a canonical source path is reported as corruption.
    pub fn keys(&self) -> Result<BTreeSet<SourceId>, CacheError> {
        self.storage
            .keys()?
            .into_iter()
            .map(|key| {
                SourceId::from_canonical_key(&key).map_err(|e| CacheError::StorageCorruption {
                    location: key.clone(),
                    reason: e.to_string(),
                })
            })
            .collect()
    }

    /// Returns `true` if a record is stored for `id`.
    pub fn contains(&self, id: &SourceId) -> Result<bool, CacheError> {
        Ok(self.storage.get(&id.canonical_key())?.is_some())
    }

    /// The underlying storage engine.
    pub fn storage(&self) -> &S {
        &self.storage
    }
}

impl<S: KeyValueStorage> PersistentMap for ArtifactStore<S> {
    fn name(&self) -> &str {
        &self.name
    }

    fn flush(&mut self) -> Result<(), CacheError> {
        self.storage.flush()
    }

    fn clean(&mut self) -> Result<(), CacheError> {
        self.storage.clear()
    }

    fn dump(&self) -> Result<Vec<String>, CacheError> {
        let mut lines = Vec::new();
        for key in self.storage.keys()? {
            if let Some(record) = self.get_by_key(&key)? {
                lines.push(format!(
                    "{key} -> Metadata: {}, Output: {}",
                    ContentHash::from_bytes(record.metadata()),
                    ContentHash::from_bytes(record.output())
                ));
            }
        }
        Ok(lines)
    }
}

/// A record that cannot be laid out is a serialization failure of the new
/// value; nothing stored is affected.
fn encode_error(key: &str, e: RecordError) -> CacheError {
    CacheError::Serialization {
        reason: format!("record for {key}: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn store() -> ArtifactStore<MemoryStorage> {
        ArtifactStore::new("artifact-records", MemoryStorage::new())
    }

    #[test]
    fn put_then_get() {
        let mut store = store();
        let id = SourceId::new("/a/A.src").unwrap();
        let record = ArtifactRecord::new(b"meta".to_vec(), b"code".to_vec());
        store.put(&id, &record).unwrap();
        assert_eq!(store.get(&id).unwrap(), Some(record));
        assert!(store.contains(&id).unwrap());
    }

    #[test]
    fn get_missing_is_none() {
        assert_eq!(store().get(&SourceId::new("/nope.src").unwrap()).unwrap(), None);
    }

    #[test]
    fn put_overwrites() {
        let mut store = store();
        let id = SourceId::new("/a/A.src").unwrap();
        store.put(&id, &ArtifactRecord::new(vec![1u8], vec![1u8])).unwrap();
        store.put(&id, &ArtifactRecord::new(vec![2u8], vec![2u8])).unwrap();
        assert_eq!(store.keys().unwrap().len(), 1);
        assert_eq!(store.get(&id).unwrap().unwrap().metadata(), &[2]);
    }

    #[test]
    fn equivalent_paths_share_one_record() {
        let mut store = store();
        store
            .put(&SourceId::new("/a/./x/../A.src").unwrap(), &ArtifactRecord::default())
            .unwrap();
        assert!(store.contains(&SourceId::new("/a/A.src").unwrap()).unwrap());
    }

    #[test]
    fn remove_missing_is_noop() {
        let mut store = store();
        store.remove(&SourceId::new("/never.src").unwrap()).unwrap();
        assert!(store.keys().unwrap().is_empty());
    }

    #[test]
    fn keys_are_source_ids() {
        let mut store = store();
        store
            .put(&SourceId::new("/b/B.src").unwrap(), &ArtifactRecord::default())
            .unwrap();
        store
            .put(&SourceId::new("/a/A.src").unwrap(), &ArtifactRecord::default())
            .unwrap();
        let keys: Vec<_> = store.keys().unwrap().into_iter().collect();
        assert_eq!(keys, vec![SourceId::new("/a/A.src").unwrap(), SourceId::new("/b/B.src").unwrap()]);
    }

    #[test]
    fn corrupt_value_reported_with_key() {
        let mut storage = MemoryStorage::new();
        storage.put("/a/A.src", vec![0, 0, 0, 9, 1]).unwrap();
        let store = ArtifactStore::new("artifact-records", storage);
        let err = store.get(&SourceId::new("/a/A.src").unwrap()).unwrap_err();
        match err {
            CacheError::StorageCorruption { location, reason } => {
                assert_eq!(location, "/a/A.src");
                assert!(reason.contains("metadata"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn oversized_record_is_serialization_error() {
        let err = encode_error(
            "/a/A.src",
            RecordError::TooLarge {
                section: "output",
                length: 1 << 31,
            },
        );
        match err {
            CacheError::Serialization { reason } => {
                assert!(reason.starts_with("record for /a/A.src:"));
                assert!(reason.contains("does not fit"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn non_canonical_key_is_corruption() {
        let mut storage = MemoryStorage::new();
        storage
            .put("relative/A.src", ArtifactRecord::default().encode().unwrap())
            .unwrap();
        let store = ArtifactStore::new("artifact-records", storage);
        match store.keys().unwrap_err() {
            CacheError::StorageCorruption { location, .. } => {
                assert_eq!(location, "relative/A.src")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn dump_lists_hashes() {
        let mut store = store();
        store
            .put(&SourceId::new("/a/A.src").unwrap(), &ArtifactRecord::new(b"m".to_vec(), b"o".to_vec()))
            .unwrap();
        let lines = store.dump().unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(
            lines[0],
            format!(
                "/a/A.src -> Metadata: {}, Output: {}",
                ContentHash::from_bytes(b"m"),
                ContentHash::from_bytes(b"o")
            )
        );
    }

    #[test]
    fn clean_drops_everything() {
        let mut store = store();
        store
            .put(&SourceId::new("/a/A.src").unwrap(), &ArtifactRecord::default())
            .unwrap();
        store.clean().unwrap();
        assert!(store.keys().unwrap().is_empty());
        assert_eq!(store.name(), "artifact-records");
    }
}
