//! Symbol-level view of structural metadata.
//!
//! [`extract_symbols`] decodes one source's metadata into a map from
//! [`SymbolId`] to [`SymbolDescriptor`]: one entry per declared type plus
//! exactly one synthetic file-scope entry. The reconciler diffs these maps
//! between the stored and the freshly compiled metadata.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tessera_common::SourceId;
use tessera_meta::{
    ClassEntry, ClassName, FileScopeShape, MetadataError, NameResolver, Namespace, PackageEntry,
    PackageFragment, TypeShape,
};

use crate::error::CacheError;

/// Suffix appended to the capitalized base name of a source to form its
/// file-scope symbol name.
pub const FILE_SCOPE_SUFFIX: &str = "Part";

/// Identity of a symbol whose shape can affect dependents.
///
/// Identities are structured values: a declared type named `APart` and the
/// file-scope symbol of `A.src` print the same but never compare equal.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub enum SymbolId {
    /// A declared type.
    Type(ClassName),
    /// The synthetic symbol holding a source file's top-level members.
    FileScope {
        /// The package the source belongs to.
        namespace: Namespace,
        /// Name derived from the source's base name.
        name: String,
    },
}

impl SymbolId {
    /// Derives the file-scope identity of `source` in `namespace`.
    ///
    /// The name is the source's base name with its first character
    /// upper-cased, followed by [`FILE_SCOPE_SUFFIX`]: `widget.src` in
    /// namespace `p` becomes `p.WidgetPart`.
    pub fn file_scope(source: &SourceId, namespace: Namespace) -> Self {
        let base = source.base_name();
        let mut chars = base.chars();
        let mut name: String = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        };
        name.push_str(FILE_SCOPE_SUFFIX);
        SymbolId::FileScope { namespace, name }
    }

    /// The namespace enclosing this symbol.
    pub fn namespace(&self) -> &Namespace {
        match self {
            SymbolId::Type(class) => &class.namespace,
            SymbolId::FileScope { namespace, .. } => namespace,
        }
    }

    /// Returns `true` for the synthetic file-scope symbol.
    pub fn is_file_scope(&self) -> bool {
        matches!(self, SymbolId::FileScope { .. })
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolId::Type(class) => write!(f, "{class}"),
            SymbolId::FileScope { namespace, name } if namespace.is_root() => write!(f, "{name}"),
            SymbolId::FileScope { namespace, name } => write!(f, "{namespace}.{name}"),
        }
    }
}

/// A declared type together with the name tables it was decoded with.
#[derive(Clone, Debug)]
pub struct TypeDescriptor {
    id: SymbolId,
    entry: ClassEntry,
    names: Arc<NameResolver>,
}

impl TypeDescriptor {
    /// The type's identity.
    pub fn id(&self) -> &SymbolId {
        &self.id
    }

    /// The raw class entry.
    pub fn entry(&self) -> &ClassEntry {
        &self.entry
    }

    /// The name tables of the fragment the entry came from.
    pub fn names(&self) -> &NameResolver {
        &self.names
    }

    /// Resolves the entry into a name-independent shape.
    pub fn shape(&self) -> Result<TypeShape, MetadataError> {
        self.entry.resolve(&self.names)
    }
}

/// The file-scope members of a source together with their name tables.
#[derive(Clone, Debug)]
pub struct FileScopeDescriptor {
    id: SymbolId,
    entry: PackageEntry,
    names: Arc<NameResolver>,
}

impl FileScopeDescriptor {
    /// The file-scope identity.
    pub fn id(&self) -> &SymbolId {
        &self.id
    }

    /// The raw package entry.
    pub fn entry(&self) -> &PackageEntry {
        &self.entry
    }

    /// The name tables of the fragment the entry came from.
    pub fn names(&self) -> &NameResolver {
        &self.names
    }

    /// The package the source belongs to.
    pub fn namespace(&self) -> &Namespace {
        self.id.namespace()
    }

    /// Resolves the entry into a name-independent shape.
    pub fn shape(&self) -> Result<FileScopeShape, MetadataError> {
        self.entry.resolve(&self.names)
    }
}

/// Structural description of one symbol.
#[derive(Clone, Debug)]
pub enum SymbolDescriptor {
    /// A declared type.
    Type(TypeDescriptor),
    /// A source's file-scope members.
    FileScope(FileScopeDescriptor),
}

impl SymbolDescriptor {
    /// The described symbol's identity.
    pub fn id(&self) -> &SymbolId {
        match self {
            SymbolDescriptor::Type(d) => d.id(),
            SymbolDescriptor::FileScope(d) => d.id(),
        }
    }

    /// Compares the resolved shapes of two descriptors.
    ///
    /// Descriptors of different kinds, or whose names fail to resolve, are
    /// never structurally equal.
    pub fn structurally_equal(&self, other: &SymbolDescriptor) -> bool {
        match (self, other) {
            (SymbolDescriptor::Type(a), SymbolDescriptor::Type(b)) => {
                matches!((a.shape(), b.shape()), (Ok(x), Ok(y)) if x == y)
            }
            (SymbolDescriptor::FileScope(a), SymbolDescriptor::FileScope(b)) => {
                matches!((a.shape(), b.shape()), (Ok(x), Ok(y)) if x == y)
            }
            _ => false,
        }
    }
}

/// Symbols of one source, ordered by identity.
pub type SymbolMap = BTreeMap<SymbolId, SymbolDescriptor>;

/// Decodes `metadata` of `source` into its symbol map.
///
/// Deterministic and free of side effects. Every declared type contributes
/// one entry; the file-scope entry is always present, with its namespace
/// taken from the package's `package_fq_name` extension (root when absent).
pub fn extract_symbols(source: &SourceId, metadata: &[u8]) -> Result<SymbolMap, CacheError> {
    let malformed = |e: MetadataError| CacheError::MalformedMetadata {
        id: source.clone(),
        source: e,
    };

    let fragment = PackageFragment::decode(metadata).map_err(malformed)?;
    let (names, classes, package) = fragment.into_parts();
    let names = Arc::new(names);

    let mut symbols = SymbolMap::new();
    for entry in classes {
        let class = names.class_name(entry.fq_name).map_err(malformed)?;
        let id = SymbolId::Type(class);
        let descriptor = TypeDescriptor {
            id: id.clone(),
            entry,
            names: Arc::clone(&names),
        };
        symbols.insert(id, SymbolDescriptor::Type(descriptor));
    }

    let namespace = package.namespace(&names).map_err(malformed)?;
    let id = SymbolId::file_scope(source, namespace);
    let descriptor = FileScopeDescriptor {
        id: id.clone(),
        entry: package,
        names,
    };
    symbols.insert(id, SymbolDescriptor::FileScope(descriptor));

    Ok(symbols)
}
