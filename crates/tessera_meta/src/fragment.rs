//! The package fragment schema and its binary encoding.
//!
//! Encoded layout: 4 magic bytes, a little-endian `u32` format version, then
//! the bincode (standard config) payload. Members refer to names only through
//! table indices; see [`crate::names`].

use serde::{Deserialize, Serialize};

use crate::error::MetadataError;
use crate::names::{NameResolver, QualifiedName};

/// Magic bytes identifying a structural metadata fragment.
pub const FRAGMENT_MAGIC: [u8; 4] = *b"TSMF";

/// Current fragment format version.
pub const FRAGMENT_FORMAT_VERSION: u32 = 1;

/// Size of the magic + version prefix.
const HEADER_LEN: usize = 8;

/// Declaration flag bits shared by classes and members.
pub mod flags {
    /// Visible outside its module.
    pub const PUBLIC: u32 = 1 << 0;
    /// Visible to subclasses only.
    pub const PROTECTED: u32 = 1 << 1;
    /// Visible inside its module only.
    pub const INTERNAL: u32 = 1 << 2;
    /// May be overridden or subclassed.
    pub const OPEN: u32 = 1 << 3;
    /// Has no implementation.
    pub const ABSTRACT: u32 = 1 << 4;
    /// Declared as an interface.
    pub const INTERFACE: u32 = 1 << 5;
    /// Declared inline.
    pub const INLINE: u32 = 1 << 6;
}

/// Reference to a type by its class name, with type arguments.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct TypeRef {
    /// Qualified-name index of the referenced class.
    pub class_name: u32,
    /// Type arguments, in declaration order.
    pub arguments: Vec<TypeRef>,
    /// Whether the type admits a null value.
    pub nullable: bool,
}

/// A named value parameter of a function or constructor.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct ValueParameter {
    /// String index of the parameter name.
    pub name: u32,
    /// Declared parameter type.
    pub ty: TypeRef,
}

/// A function declared in a class or at file scope.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct FunctionEntry {
    /// String index of the function name.
    pub name: u32,
    /// Declaration flags (see [`flags`]).
    pub flags: u32,
    /// String indices of type parameter names.
    pub type_parameters: Vec<u32>,
    /// Value parameters, in declaration order.
    pub value_parameters: Vec<ValueParameter>,
    /// Declared return type.
    pub return_type: TypeRef,
}

/// A property declared in a class or at file scope.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct PropertyEntry {
    /// String index of the property name.
    pub name: u32,
    /// Declaration flags (see [`flags`]).
    pub flags: u32,
    /// Declared property type.
    pub ty: TypeRef,
    /// Whether the property has a setter.
    pub mutable: bool,
}

/// A class constructor.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct ConstructorEntry {
    /// Declaration flags (see [`flags`]).
    pub flags: u32,
    /// Value parameters, in declaration order.
    pub value_parameters: Vec<ValueParameter>,
}

/// A file-scope type alias.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct TypeAliasEntry {
    /// String index of the alias name.
    pub name: u32,
    /// The aliased type.
    pub underlying: TypeRef,
}

/// A declared type.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct ClassEntry {
    /// Qualified-name index of the class.
    pub fq_name: u32,
    /// Declaration flags (see [`flags`]).
    pub flags: u32,
    /// String indices of type parameter names.
    pub type_parameters: Vec<u32>,
    /// Direct supertypes.
    pub supertypes: Vec<TypeRef>,
    /// Declared constructors.
    pub constructors: Vec<ConstructorEntry>,
    /// Member functions.
    pub functions: Vec<FunctionEntry>,
    /// Member properties.
    pub properties: Vec<PropertyEntry>,
    /// String indices of directly nested class names.
    pub nested_classes: Vec<u32>,
}

impl ClassEntry {
    /// Creates a class entry with no members.
    pub fn new(fq_name: u32, flags: u32) -> Self {
        Self {
            fq_name,
            flags,
            type_parameters: Vec::new(),
            supertypes: Vec::new(),
            constructors: Vec::new(),
            functions: Vec::new(),
            properties: Vec::new(),
            nested_classes: Vec::new(),
        }
    }
}

/// Extension fields attached to the package entry.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct PackageExtensions {
    /// Qualified-name index of the package this file belongs to; `None` for
    /// the root package.
    pub package_fq_name: Option<u32>,
}

/// The file-scope members of one source file.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct PackageEntry {
    /// File-scope functions.
    pub functions: Vec<FunctionEntry>,
    /// File-scope properties.
    pub properties: Vec<PropertyEntry>,
    /// File-scope type aliases.
    pub type_aliases: Vec<TypeAliasEntry>,
    /// Extension fields.
    pub extensions: PackageExtensions,
}

/// Structural metadata of one compiled source file.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct PackageFragment {
    /// String table.
    pub strings: Vec<String>,
    /// Qualified-name table.
    pub qualified_names: Vec<QualifiedName>,
    /// Declared types.
    pub classes: Vec<ClassEntry>,
    /// File-scope members.
    pub package: PackageEntry,
}

impl PackageFragment {
    /// Encodes the fragment with its magic and version prefix.
    pub fn encode(&self) -> Result<Vec<u8>, MetadataError> {
        let payload = bincode::serde::encode_to_vec(self, bincode::config::standard()).map_err(
            |e| MetadataError::Encode {
                reason: e.to_string(),
            },
        )?;
        let mut output = Vec::with_capacity(HEADER_LEN + payload.len());
        output.extend_from_slice(&FRAGMENT_MAGIC);
        output.extend_from_slice(&FRAGMENT_FORMAT_VERSION.to_le_bytes());
        output.extend_from_slice(&payload);
        Ok(output)
    }

    /// Decodes a fragment, validating the magic, the version and that the
    /// payload is consumed exactly.
    pub fn decode(bytes: &[u8]) -> Result<Self, MetadataError> {
        if bytes.len() < HEADER_LEN {
            return Err(MetadataError::Truncated {
                expected: HEADER_LEN,
                actual: bytes.len(),
            });
        }
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[..4]);
        if magic != FRAGMENT_MAGIC {
            return Err(MetadataError::BadMagic { found: magic });
        }
        let mut version = [0u8; 4];
        version.copy_from_slice(&bytes[4..HEADER_LEN]);
        let version = u32::from_le_bytes(version);
        if version != FRAGMENT_FORMAT_VERSION {
            return Err(MetadataError::VersionMismatch {
                expected: FRAGMENT_FORMAT_VERSION,
                actual: version,
            });
        }

        let payload = &bytes[HEADER_LEN..];
        let (fragment, consumed): (Self, usize) =
            bincode::serde::decode_from_slice(payload, bincode::config::standard()).map_err(
                |e| MetadataError::Decode {
                    reason: e.to_string(),
                },
            )?;
        if consumed != payload.len() {
            return Err(MetadataError::Decode {
                reason: format!("{} trailing bytes", payload.len() - consumed),
            });
        }
        Ok(fragment)
    }

    /// Splits the fragment into its name resolver, classes and package entry.
    pub fn into_parts(self) -> (NameResolver, Vec<ClassEntry>, PackageEntry) {
        let resolver = NameResolver::new(self.strings, self.qualified_names);
        (resolver, self.classes, self.package)
    }
}
