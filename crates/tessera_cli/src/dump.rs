//! `tessera dump`: list stored artifact records.

use serde::Serialize;
use tessera_cache::{CacheError, CacheMaps, IncrementalCache, KeyValueStorage};
use tessera_common::ContentHash;

use crate::project::open_cache;
use crate::{DumpArgs, GlobalArgs, OutputFormat};

/// One stored record as reported in JSON output.
#[derive(Debug, Serialize)]
pub struct DumpEntry {
    /// Canonical source key.
    pub source: String,
    /// Metadata length in bytes.
    pub metadata_len: usize,
    /// Hash of the metadata bytes.
    pub metadata_hash: String,
    /// Output length in bytes.
    pub output_len: usize,
    /// Hash of the output bytes.
    pub output_hash: String,
    /// Hash over both sections; equal exactly when the stored records are.
    pub record_hash: String,
}

/// Runs the `tessera dump` command. Returns exit code 0.
pub fn run(args: &DumpArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let cache = open_cache(global)?;
    if global.verbose {
        eprintln!("     Reading {}", cache.config().dir.display());
    }

    match args.format {
        OutputFormat::Text => print!("{}", cache.dump_maps()?),
        OutputFormat::Json => {
            let entries = collect_entries(&cache)?;
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
    }

    cache.close()?;
    Ok(0)
}

/// Collects a [`DumpEntry`] per stored record, ordered by source.
pub fn collect_entries<S: KeyValueStorage>(
    cache: &IncrementalCache<S>,
) -> Result<Vec<DumpEntry>, CacheError> {
    let mut entries = Vec::new();
    for id in cache.artifacts().keys()? {
        let Some(record) = cache.artifacts().get(&id)? else {
            continue;
        };
        entries.push(DumpEntry {
            source: id.canonical_key(),
            metadata_len: record.metadata().len(),
            metadata_hash: ContentHash::from_bytes(record.metadata()).to_string(),
            output_len: record.output().len(),
            output_hash: ContentHash::from_bytes(record.output()).to_string(),
            record_hash: ContentHash::from_sections(&[record.metadata(), record.output()])
                .to_string(),
        });
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_cache::{ArtifactMap, ArtifactRecord, CacheConfig, RecordingCollector};
    use tessera_common::SourceId;
    use tessera_meta::FragmentBuilder;
    use tempfile::TempDir;

    fn populated(dir: &TempDir) -> IncrementalCache {
        let mut cache = IncrementalCache::open(CacheConfig::new(dir.path())).unwrap();
        let mut b = FragmentBuilder::new();
        b.set_package("p");
        let metadata = b.encode().unwrap();
        let artifacts = ArtifactMap::from([(
            SourceId::new("/p/A.src").unwrap(),
            ArtifactRecord::new(metadata, b"out".to_vec()),
        )]);
        cache
            .compare_and_update(&artifacts, &mut RecordingCollector::new())
            .unwrap();
        cache
    }

    #[test]
    fn entries_report_sizes_and_hashes() {
        let tmp = TempDir::new().unwrap();
        let cache = populated(&tmp);
        let entries = collect_entries(&cache).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].source, "/p/A.src");
        assert_eq!(entries[0].output_len, 3);
        assert_eq!(
            entries[0].output_hash,
            ContentHash::from_bytes(b"out").to_string()
        );
    }

    #[test]
    fn json_shape() {
        let tmp = TempDir::new().unwrap();
        let cache = populated(&tmp);
        let json = serde_json::to_value(collect_entries(&cache).unwrap()).unwrap();
        assert_eq!(json[0]["source"], "/p/A.src");
        assert_eq!(json[0]["output_len"], 3);
        let record_hash: ContentHash = json[0]["record_hash"].as_str().unwrap().parse().unwrap();
        assert_ne!(record_hash, ContentHash::from_bytes(b"out"));
    }

    #[test]
    fn run_on_empty_cache() {
        let tmp = TempDir::new().unwrap();
        let global = GlobalArgs {
            verbose: false,
            config: Some(tmp.path().to_str().unwrap().to_string()),
            cache_dir: None,
        };
        let args = DumpArgs {
            format: OutputFormat::Json,
        };
        assert_eq!(run(&args, &global).unwrap(), 0);
        // Reading does not create the storage file.
        assert!(!tmp.path().join(".tessera-cache").exists());
    }
}
