//! `tessera symbols`: print the symbols declared by a metadata file.

use tessera_cache::{extract_symbols, CacheError, SymbolDescriptor};
use tessera_common::SourceId;

use crate::SymbolsArgs;

/// Runs the `tessera symbols` command. Returns exit code 0.
pub fn run(args: &SymbolsArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let metadata = std::fs::read(&args.metadata_file)?;
    let source = SourceId::new(args.source.as_deref().unwrap_or(&args.metadata_file))?;
    for line in render(&source, &metadata)? {
        println!("{line}");
    }
    Ok(0)
}

/// One `kind identity` line per symbol, in identity order.
fn render(source: &SourceId, metadata: &[u8]) -> Result<Vec<String>, CacheError> {
    let symbols = extract_symbols(source, metadata)?;
    Ok(symbols
        .values()
        .map(|descriptor| {
            let kind = match descriptor {
                SymbolDescriptor::Type(_) => "type",
                SymbolDescriptor::FileScope(_) => "file-scope",
            };
            format!("{kind:<10} {}", descriptor.id())
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_meta::fragment::flags;
    use tessera_meta::{ClassEntry, FragmentBuilder};

    fn metadata() -> Vec<u8> {
        let mut b = FragmentBuilder::new();
        b.set_package("com.x");
        let name = b.class_name("com.x", "Widget");
        b.add_class(ClassEntry::new(name, flags::PUBLIC));
        b.encode().unwrap()
    }

    #[test]
    fn renders_types_then_file_scope() {
        let lines = render(&SourceId::new("/src/widget.src").unwrap(), &metadata()).unwrap();
        assert_eq!(
            lines,
            vec!["type       com.x.Widget", "file-scope com.x.WidgetPart"]
        );
    }

    #[test]
    fn run_reads_file_and_uses_source_flag() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("out.meta");
        std::fs::write(&path, metadata()).unwrap();
        let args = SymbolsArgs {
            metadata_file: path.to_str().unwrap().to_string(),
            source: Some("/src/Widget.src".to_string()),
        };
        assert_eq!(run(&args).unwrap(), 0);
    }

    #[test]
    fn garbage_is_malformed() {
        let err = render(&SourceId::new("/x.src").unwrap(), b"junk").unwrap_err();
        assert!(matches!(err, CacheError::MalformedMetadata { .. }));
    }
}
