//! Locating the cache configuration from global CLI args.

use std::path::{Path, PathBuf};

use tessera_cache::{load_config, load_config_from_str, CacheConfig, IncrementalCache};

use crate::GlobalArgs;

/// Resolves the cache configuration.
///
/// `--config` may name a configuration file or the directory holding
/// `tessera.toml`; without it the current directory is used. A relative
/// cache directory is resolved against the configuration's directory, and
/// `--cache-dir` replaces it outright.
pub fn resolve_config(global: &GlobalArgs) -> Result<CacheConfig, Box<dyn std::error::Error>> {
    let mut config = match global.config {
        Some(ref path) => {
            let p = PathBuf::from(path);
            if p.is_file() {
                let project_dir = p
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from("."));
                let mut config = load_config_from_str(&std::fs::read_to_string(&p)?)?;
                if config.dir.is_relative() {
                    config.dir = project_dir.join(&config.dir);
                }
                config
            } else {
                load_config(&p)?
            }
        }
        None => load_config(&std::env::current_dir()?)?,
    };

    if let Some(ref dir) = global.cache_dir {
        config.dir = PathBuf::from(dir);
    }
    tracing::debug!(dir = %config.dir.display(), map = %config.map_name, "resolved cache config");
    Ok(config)
}

/// Opens the cache selected by the global args.
pub fn open_cache(global: &GlobalArgs) -> Result<IncrementalCache, Box<dyn std::error::Error>> {
    let config = resolve_config(global)?;
    Ok(IncrementalCache::open(config)?)
}
