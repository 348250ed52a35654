//! Incremental compilation artifact cache.
//!
//! The cache persists the structural metadata and compiled output of every
//! source file across builds. When the driver recompiles a subset of sources,
//! [`IncrementalCache::compare_and_update`] replaces the stored records and
//! reports, per declared symbol, the old and new structural descriptors to a
//! [`ChangeCollector`] so that only affected dependents are rebuilt.

#![warn(missing_docs)]

pub mod cache;
pub mod changes;
pub mod config;
pub mod error;
pub mod header;
pub mod record;
pub mod registry;
pub mod storage;
pub mod store;
pub mod symbols;

pub use cache::{ArtifactMap, IncrementalCache};
pub use changes::{ChangeCollector, ChangeRecord, RecordingCollector};
pub use config::{load_config, load_config_from_str, CacheConfig, ConfigError};
pub use error::CacheError;
pub use header::HeaderStore;
pub use record::{ArtifactRecord, RecordError};
pub use registry::{CacheMaps, MapRegistry, PersistentMap};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage};
pub use store::ArtifactStore;
pub use symbols::{
    extract_symbols, FileScopeDescriptor, SymbolDescriptor, SymbolId, SymbolMap, TypeDescriptor,
};
