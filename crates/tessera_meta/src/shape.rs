//! Name-independent shapes of declarations.
//!
//! Two fragments that declare the same API may number their string and
//! qualified-name tables differently. Resolving an entry through its
//! fragment's [`NameResolver`] yields a shape that only contains real names,
//! so shapes from different fragments compare meaningfully. Members are
//! sorted, so declaration order does not affect equality.

use crate::error::MetadataError;
use crate::fragment::{
    ClassEntry, ConstructorEntry, FunctionEntry, PackageEntry, PropertyEntry, TypeAliasEntry,
    TypeRef, ValueParameter,
};
use crate::names::{ClassName, NameResolver, Namespace};

/// A type reference with its class name resolved.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct ResolvedType {
    /// The referenced class.
    pub class: ClassName,
    /// Resolved type arguments.
    pub arguments: Vec<ResolvedType>,
    /// Whether the type admits a null value.
    pub nullable: bool,
}

/// Shape of a function or constructor.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct CallableShape {
    /// Function name; `<init>` for constructors.
    pub name: String,
    /// Declaration flags.
    pub flags: u32,
    /// Type parameter names.
    pub type_parameters: Vec<String>,
    /// Parameter names and types, in declaration order.
    pub parameters: Vec<(String, ResolvedType)>,
    /// Return type; `None` for constructors.
    pub return_type: Option<ResolvedType>,
}

/// Shape of a property.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct PropertyShape {
    /// Property name.
    pub name: String,
    /// Declaration flags.
    pub flags: u32,
    /// Property type.
    pub ty: ResolvedType,
    /// Whether the property has a setter.
    pub mutable: bool,
}

/// Shape of a type alias.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct TypeAliasShape {
    /// Alias name.
    pub name: String,
    /// Aliased type.
    pub underlying: ResolvedType,
}

/// Shape of a declared type.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct TypeShape {
    /// The declared class.
    pub name: ClassName,
    /// Declaration flags.
    pub flags: u32,
    /// Type parameter names, in declaration order.
    pub type_parameters: Vec<String>,
    /// Supertypes, sorted.
    pub supertypes: Vec<ResolvedType>,
    /// Constructors, sorted.
    pub constructors: Vec<CallableShape>,
    /// Member functions, sorted.
    pub functions: Vec<CallableShape>,
    /// Member properties, sorted.
    pub properties: Vec<PropertyShape>,
    /// Nested class names, sorted.
    pub nested_classes: Vec<String>,
}

/// Shape of the file-scope members of one source file.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct FileScopeShape {
    /// The package the file belongs to.
    pub namespace: Namespace,
    /// File-scope functions, sorted.
    pub functions: Vec<CallableShape>,
    /// File-scope properties, sorted.
    pub properties: Vec<PropertyShape>,
    /// Type aliases, sorted.
    pub type_aliases: Vec<TypeAliasShape>,
}

impl ClassEntry {
    /// Resolves this entry into a [`TypeShape`].
    pub fn resolve(&self, names: &NameResolver) -> Result<TypeShape, MetadataError> {
        Ok(TypeShape {
            name: names.class_name(self.fq_name)?,
            flags: self.flags,
            type_parameters: strings(&self.type_parameters, names)?,
            supertypes: sorted(self.supertypes.iter().map(|t| resolve_type(t, names)))?,
            constructors: sorted(self.constructors.iter().map(|c| resolve_constructor(c, names)))?,
            functions: sorted(self.functions.iter().map(|f| resolve_function(f, names)))?,
            properties: sorted(self.properties.iter().map(|p| resolve_property(p, names)))?,
            nested_classes: sorted(
                self.nested_classes
                    .iter()
                    .map(|&i| names.string(i).map(str::to_string)),
            )?,
        })
    }
}

impl PackageEntry {
    /// Resolves the package namespace from the `package_fq_name` extension;
    /// the root namespace when the extension is absent.
    pub fn namespace(&self, names: &NameResolver) -> Result<Namespace, MetadataError> {
        match self.extensions.package_fq_name {
            Some(index) => names.package_name(index),
            None => Ok(Namespace::root()),
        }
    }

    /// Resolves this entry into a [`FileScopeShape`].
    pub fn resolve(&self, names: &NameResolver) -> Result<FileScopeShape, MetadataError> {
        Ok(FileScopeShape {
            namespace: self.namespace(names)?,
            functions: sorted(self.functions.iter().map(|f| resolve_function(f, names)))?,
            properties: sorted(self.properties.iter().map(|p| resolve_property(p, names)))?,
            type_aliases: sorted(self.type_aliases.iter().map(|a| resolve_alias(a, names)))?,
        })
    }
}

fn resolve_type(ty: &TypeRef, names: &NameResolver) -> Result<ResolvedType, MetadataError> {
    Ok(ResolvedType {
        class: names.class_name(ty.class_name)?,
        arguments: ty
            .arguments
            .iter()
            .map(|a| resolve_type(a, names))
            .collect::<Result<_, _>>()?,
        nullable: ty.nullable,
    })
}

fn resolve_parameters(
    params: &[ValueParameter],
    names: &NameResolver,
) -> Result<Vec<(String, ResolvedType)>, MetadataError> {
    params
        .iter()
        .map(|p| Ok((names.string(p.name)?.to_string(), resolve_type(&p.ty, names)?)))
        .collect()
}

fn resolve_function(
    f: &FunctionEntry,
    names: &NameResolver,
) -> Result<CallableShape, MetadataError> {
    Ok(CallableShape {
        name: names.string(f.name)?.to_string(),
        flags: f.flags,
        type_parameters: strings(&f.type_parameters, names)?,
        parameters: resolve_parameters(&f.value_parameters, names)?,
        return_type: Some(resolve_type(&f.return_type, names)?),
    })
}

fn resolve_constructor(
    c: &ConstructorEntry,
    names: &NameResolver,
) -> Result<CallableShape, MetadataError> {
    Ok(CallableShape {
        name: "<init>".to_string(),
        flags: c.flags,
        type_parameters: Vec::new(),
        parameters: resolve_parameters(&c.value_parameters, names)?,
        return_type: None,
    })
}

fn resolve_property(
    p: &PropertyEntry,
    names: &NameResolver,
) -> Result<PropertyShape, MetadataError> {
    Ok(PropertyShape {
        name: names.string(p.name)?.to_string(),
        flags: p.flags,
        ty: resolve_type(&p.ty, names)?,
        mutable: p.mutable,
    })
}

fn resolve_alias(
    a: &TypeAliasEntry,
    names: &NameResolver,
) -> Result<TypeAliasShape, MetadataError> {
    Ok(TypeAliasShape {
        name: names.string(a.name)?.to_string(),
        underlying: resolve_type(&a.underlying, names)?,
    })
}

fn strings(indices: &[u32], names: &NameResolver) -> Result<Vec<String>, MetadataError> {
    indices
        .iter()
        .map(|&i| names.string(i).map(str::to_string))
        .collect()
}

fn sorted<T: Ord>(
    items: impl Iterator<Item = Result<T, MetadataError>>,
) -> Result<Vec<T>, MetadataError> {
    let mut out = items.collect::<Result<Vec<_>, _>>()?;
    out.sort();
    Ok(out)
}
