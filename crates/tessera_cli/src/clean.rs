//! `tessera clean`: drop every stored record and the header.

use crate::project::open_cache;
use crate::GlobalArgs;

/// Runs the `tessera clean` command. Returns exit code 0.
pub fn run(global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let mut cache = open_cache(global)?;
    let count = cache.artifacts().keys()?.len();
    cache.clean()?;
    let dir = cache.config().dir.clone();
    cache.close()?;
    eprintln!("     Cleaned {count} record(s) in {}", dir.display());
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_cache::{ArtifactMap, ArtifactRecord, CacheConfig, IncrementalCache, RecordingCollector};
    use tessera_common::SourceId;
    use tessera_meta::FragmentBuilder;
    use tempfile::TempDir;

    #[test]
    fn clean_empties_cache() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("ic");
        {
            let mut cache = IncrementalCache::open(CacheConfig::new(&dir)).unwrap();
            let mut b = FragmentBuilder::new();
            b.set_package("p");
            let artifacts = ArtifactMap::from([(
                SourceId::new("/p/A.src").unwrap(),
                ArtifactRecord::new(b.encode().unwrap(), Vec::<u8>::new()),
            )]);
            cache
                .compare_and_update(&artifacts, &mut RecordingCollector::new())
                .unwrap();
            cache.set_header(b"h").unwrap();
            cache.close().unwrap();
        }

        let global = GlobalArgs {
            verbose: false,
            config: None,
            cache_dir: Some(dir.to_str().unwrap().to_string()),
        };
        assert_eq!(run(&global).unwrap(), 0);

        let cache = IncrementalCache::open(CacheConfig::new(&dir)).unwrap();
        assert!(cache.artifacts().keys().unwrap().is_empty());
        assert!(cache.header().is_err());
    }
}
