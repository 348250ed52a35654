//! Cache configuration and `tessera.toml` loading.
//!
//! ```toml
//! [cache]
//! dir = "build/caches"
//! map_name = "artifact-records"
//! header_file = "header.meta"
//! ```
//!
//! Every key is optional. A relative `dir` is resolved against the
//! directory containing the configuration file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Name of the configuration file looked up in a project directory.
pub const CONFIG_FILE: &str = "tessera.toml";

/// Default cache root, relative to the project directory.
pub const DEFAULT_CACHE_DIR: &str = ".tessera-cache";

/// Default logical name of the artifact map.
pub const DEFAULT_MAP_NAME: &str = "artifact-records";

/// Default header file name.
pub const DEFAULT_HEADER_FILE: &str = "header.meta";

/// Errors that can occur when loading or validating a configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An I/O error occurred while reading the configuration file.
    #[error("failed to read configuration: {0}")]
    IoError(#[from] std::io::Error),

    /// The TOML content could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// A configuration value failed validation.
    #[error("validation error: {0}")]
    ValidationError(String),
}

/// Fixed names and locations a cache instance is constructed with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Root directory holding the map storage files and the header.
    pub dir: PathBuf,
    /// Logical name of the artifact map.
    pub map_name: String,
    /// File name of the header blob inside `dir`.
    pub header_file: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_CACHE_DIR),
            map_name: DEFAULT_MAP_NAME.to_string(),
            header_file: DEFAULT_HEADER_FILE.to_string(),
        }
    }
}

impl CacheConfig {
    /// Default names rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ..Self::default()
        }
    }

    /// Checks that the names are usable as single file names and that the
    /// header cannot clash with the map's storage files.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_file_name("cache.map_name", &self.map_name)?;
        validate_file_name("cache.header_file", &self.header_file)?;
        let header_stem = Path::new(&self.header_file)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        if header_stem == self.map_name {
            return Err(ConfigError::ValidationError(format!(
                "cache.header_file '{}' clashes with map '{}'",
                self.header_file, self.map_name
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    cache: CacheConfig,
}

/// Loads `<project_dir>/tessera.toml`, or the defaults if it does not exist.
///
/// The returned `dir` is resolved against `project_dir`.
pub fn load_config(project_dir: &Path) -> Result<CacheConfig, ConfigError> {
    let path = project_dir.join(CONFIG_FILE);
    let mut config = if path.exists() {
        load_config_from_str(&std::fs::read_to_string(&path)?)?
    } else {
        CacheConfig::default()
    };
    if config.dir.is_relative() {
        config.dir = project_dir.join(&config.dir);
    }
    Ok(config)
}

/// Parses and validates a configuration from a string.
pub fn load_config_from_str(content: &str) -> Result<CacheConfig, ConfigError> {
    let file: ConfigFile =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    file.cache.validate()?;
    Ok(file.cache)
}

fn validate_file_name(field: &str, name: &str) -> Result<(), ConfigError> {
    if name.is_empty() {
        return Err(ConfigError::ValidationError(format!("{field} is empty")));
    }
    if name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(ConfigError::ValidationError(format!(
            "{field} '{name}' is not a plain file name"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config, CacheConfig::default());
        assert_eq!(config.map_name, "artifact-records");
        assert_eq!(config.header_file, "header.meta");
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
[cache]
dir = "build/caches"
map_name = "translation-results"
header_file = "state.bin"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.dir, PathBuf::from("build/caches"));
        assert_eq!(config.map_name, "translation-results");
        assert_eq!(config.header_file, "state.bin");
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config = load_config_from_str("[cache]\nmap_name = \"m\"\n").unwrap();
        assert_eq!(config.map_name, "m");
        assert_eq!(config.header_file, DEFAULT_HEADER_FILE);
    }

    #[test]
    fn invalid_toml_is_parse_error() {
        let err = load_config_from_str("[cache\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn empty_map_name_rejected() {
        let err = load_config_from_str("[cache]\nmap_name = \"\"\n").unwrap_err();
        assert_eq!(err.to_string(), "validation error: cache.map_name is empty");
    }

    #[test]
    fn path_in_header_file_rejected() {
        let err = load_config_from_str("[cache]\nheader_file = \"../h\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn header_clashing_with_map_rejected() {
        let err =
            load_config_from_str("[cache]\nmap_name = \"state\"\nheader_file = \"state.bin\"\n")
                .unwrap_err();
        assert!(err.to_string().contains("clashes"));
    }

    #[test]
    fn load_config_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.dir, dir.path().join(DEFAULT_CACHE_DIR));
    }

    #[test]
    fn load_config_resolves_relative_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "[cache]\ndir = \"out/ic\"\n").unwrap();
        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.dir, dir.path().join("out/ic"));
    }

    #[test]
    fn io_error_display() {
        let err = ConfigError::IoError(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "file not found",
        ));
        assert!(err.to_string().starts_with("failed to read configuration:"));
    }
}
