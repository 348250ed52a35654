//! `tessera header`: show the cache header.

use tessera_cache::CacheError;
use tessera_common::ContentHash;

use crate::project::open_cache;
use crate::GlobalArgs;

/// Runs the `tessera header` command.
///
/// Prints the header length and hash. Returns exit code 1 if no header has
/// been written.
pub fn run(global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let cache = open_cache(global)?;
    let code = match cache.header() {
        Ok(bytes) => {
            println!("{}", describe(&bytes));
            0
        }
        Err(CacheError::HeaderNotFound { path }) => {
            eprintln!("no cache header at {}", path.display());
            1
        }
        Err(e) => return Err(e.into()),
    };
    cache.close()?;
    Ok(code)
}

fn describe(bytes: &[u8]) -> String {
    format!("{} bytes, hash {}", bytes.len(), ContentHash::from_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_cache::{CacheConfig, IncrementalCache};
    use tempfile::TempDir;

    fn global(tmp: &TempDir) -> GlobalArgs {
        GlobalArgs {
            verbose: false,
            config: None,
            cache_dir: Some(tmp.path().join("ic").to_str().unwrap().to_string()),
        }
    }

    #[test]
    fn missing_header_exits_with_one() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(run(&global(&tmp)).unwrap(), 1);
    }

    #[test]
    fn present_header_exits_with_zero() {
        let tmp = TempDir::new().unwrap();
        let cache = IncrementalCache::open(CacheConfig::new(tmp.path().join("ic"))).unwrap();
        cache.set_header(b"abc").unwrap();
        cache.close().unwrap();
        assert_eq!(run(&global(&tmp)).unwrap(), 0);
    }

    #[test]
    fn describe_format() {
        let text = describe(b"abc");
        assert!(text.starts_with("3 bytes, hash "));
        assert!(text.ends_with(&ContentHash::from_bytes(b"abc").to_string()));
    }
}
