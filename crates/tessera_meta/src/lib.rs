//! Structural metadata format for compiled source files.
//!
//! Every compiled source produces one [`PackageFragment`]: the declared types
//! of the file, its file-scope members, and the string and qualified-name
//! tables that both refer to. The fragment is serialized with a small magic
//! and version header so that stale or foreign bytes are rejected instead of
//! being misread. [`NameResolver`] turns table indices back into structured
//! names, and the [`shape`] module resolves entries into name-independent
//! shapes that can be compared across fragments.

#![warn(missing_docs)]

pub mod builder;
pub mod error;
pub mod fragment;
pub mod names;
pub mod shape;

pub use builder::FragmentBuilder;
pub use error::MetadataError;
pub use fragment::{
    ClassEntry, ConstructorEntry, FunctionEntry, PackageEntry, PackageExtensions, PackageFragment,
    PropertyEntry, TypeAliasEntry, TypeRef, ValueParameter,
};
pub use names::{ClassName, NameKind, NameResolver, Namespace, QualifiedName};
pub use shape::{FileScopeShape, TypeShape};
