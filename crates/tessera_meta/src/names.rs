//! Name tables and structured names.
//!
//! A fragment never stores names as dotted strings. Each name is an entry in
//! the qualified-name table pointing at its parent entry and at a short name
//! in the string table. Resolution walks the parent chain and splits the
//! segments into the package part and the class part.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::MetadataError;

/// Kind of a qualified-name table entry.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum NameKind {
    /// A segment of a class name (top-level or nested).
    Class,
    /// A segment of a package name.
    Package,
    /// A segment of a class declared inside a function body.
    Local,
}

impl fmt::Display for NameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameKind::Class => write!(f, "class"),
            NameKind::Package => write!(f, "package"),
            NameKind::Local => write!(f, "local"),
        }
    }
}

/// One entry of the qualified-name table.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct QualifiedName {
    /// Index of the enclosing name, or `None` for a top-level segment.
    pub parent: Option<u32>,
    /// Index into the string table.
    pub short_name: u32,
    /// What this segment names.
    pub kind: NameKind,
}

/// A package namespace such as `com.x`; the root namespace has no segments.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Namespace(Vec<String>);

impl Namespace {
    /// Returns the root (unnamed) namespace.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Creates a namespace from its segments, outermost first.
    pub fn from_segments(segments: Vec<String>) -> Self {
        Self(segments)
    }

    /// Parses a dotted namespace; the empty string is the root namespace.
    pub fn from_dotted(dotted: &str) -> Self {
        if dotted.is_empty() {
            return Self::root();
        }
        Self(dotted.split('.').map(str::to_string).collect())
    }

    /// Returns `true` for the root namespace.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the namespace segments, outermost first.
    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Namespace({self})")
    }
}

/// Fully resolved identity of a declared class.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub struct ClassName {
    /// The package the class is declared in.
    pub namespace: Namespace,
    /// Class segments, outermost first (`["Outer", "Inner"]` for a nested class).
    pub relative: Vec<String>,
    /// Whether the class is declared inside a function body.
    pub local: bool,
}

impl ClassName {
    /// Creates a top-level, non-local class name.
    pub fn top_level(namespace: Namespace, name: impl Into<String>) -> Self {
        Self {
            namespace,
            relative: vec![name.into()],
            local: false,
        }
    }

    /// Returns the innermost class segment.
    pub fn simple_name(&self) -> &str {
        self.relative.last().map(String::as_str).unwrap_or("")
    }
}

impl fmt::Display for ClassName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.namespace.is_root() {
            write!(f, "{}.", self.namespace)?;
        }
        write!(f, "{}", self.relative.join("."))
    }
}

/// Resolves string and qualified-name indices of one fragment.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct NameResolver {
    strings: Vec<String>,
    qualified_names: Vec<QualifiedName>,
}

impl NameResolver {
    /// Creates a resolver over the given tables.
    pub fn new(strings: Vec<String>, qualified_names: Vec<QualifiedName>) -> Self {
        Self {
            strings,
            qualified_names,
        }
    }

    /// Resolves a string table index.
    pub fn string(&self, index: u32) -> Result<&str, MetadataError> {
        self.strings
            .get(index as usize)
            .map(String::as_str)
            .ok_or(MetadataError::IndexOutOfRange {
                table: "string",
                index,
                len: self.strings.len(),
            })
    }

    /// Resolves a qualified-name index to a class identity.
    ///
    /// The chain must be zero or more package segments followed by at least
    /// one class or local segment.
    pub fn class_name(&self, index: u32) -> Result<ClassName, MetadataError> {
        let chain = self.chain(index)?;
        let mut namespace = Vec::new();
        let mut relative = Vec::new();
        let mut local = false;
        for (entry_index, entry) in chain {
            let segment = self.string(entry.short_name)?.to_string();
            match entry.kind {
                NameKind::Package if relative.is_empty() => namespace.push(segment),
                NameKind::Package => {
                    return Err(MetadataError::UnexpectedNameKind {
                        index: entry_index,
                        expected: NameKind::Class,
                        found: NameKind::Package,
                    })
                }
                NameKind::Class => relative.push(segment),
                NameKind::Local => {
                    local = true;
                    relative.push(segment);
                }
            }
        }
        if relative.is_empty() {
            return Err(MetadataError::UnexpectedNameKind {
                index,
                expected: NameKind::Class,
                found: NameKind::Package,
            });
        }
        Ok(ClassName {
            namespace: Namespace::from_segments(namespace),
            relative,
            local,
        })
    }

    /// Resolves a qualified-name index to a package namespace.
    pub fn package_name(&self, index: u32) -> Result<Namespace, MetadataError> {
        let chain = self.chain(index)?;
        let mut segments = Vec::with_capacity(chain.len());
        for (entry_index, entry) in chain {
            if entry.kind != NameKind::Package {
                return Err(MetadataError::UnexpectedNameKind {
                    index: entry_index,
                    expected: NameKind::Package,
                    found: entry.kind,
                });
            }
            segments.push(self.string(entry.short_name)?.to_string());
        }
        Ok(Namespace::from_segments(segments))
    }

    /// Returns the entries from the outermost ancestor down to `index`.
    fn chain(&self, index: u32) -> Result<Vec<(u32, &QualifiedName)>, MetadataError> {
        let mut chain = Vec::new();
        let mut current = Some(index);
        while let Some(i) = current {
            if chain.len() > self.qualified_names.len() {
                return Err(MetadataError::CyclicName { index });
            }
            let entry =
                self.qualified_names
                    .get(i as usize)
                    .ok_or(MetadataError::IndexOutOfRange {
                        table: "qualified name",
                        index: i,
                        len: self.qualified_names.len(),
                    })?;
            chain.push((i, entry));
            current = entry.parent;
        }
        chain.reverse();
        Ok(chain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn qn(parent: Option<u32>, short_name: u32, kind: NameKind) -> QualifiedName {
        QualifiedName {
            parent,
            short_name,
            kind,
        }
    }

    /// Tables for `com.x.A`, `com.x.A.Inner` and a root-package class `Top`.
    fn resolver() -> NameResolver {
        NameResolver::new(
            vec![
                "com".to_string(),
                "x".to_string(),
                "A".to_string(),
                "Inner".to_string(),
                "Top".to_string(),
            ],
            vec![
                qn(None, 0, NameKind::Package),
                qn(Some(0), 1, NameKind::Package),
                qn(Some(1), 2, NameKind::Class),
                qn(Some(2), 3, NameKind::Class),
                qn(None, 4, NameKind::Class),
            ],
        )
    }

    #[test]
    fn resolves_top_level_class() {
        let name = resolver().class_name(2).unwrap();
        assert_eq!(name.namespace, Namespace::from_dotted("com.x"));
        assert_eq!(name.relative, vec!["A"]);
        assert!(!name.local);
        assert_eq!(name.to_string(), "com.x.A");
    }

    #[test]
    fn resolves_nested_class() {
        let name = resolver().class_name(3).unwrap();
        assert_eq!(name.to_string(), "com.x.A.Inner");
        assert_eq!(name.simple_name(), "Inner");
    }

    #[test]
    fn resolves_root_package_class() {
        let name = resolver().class_name(4).unwrap();
        assert!(name.namespace.is_root());
        assert_eq!(name.to_string(), "Top");
    }

    #[test]
    fn resolves_package() {
        let ns = resolver().package_name(1).unwrap();
        assert_eq!(ns.segments(), ["com", "x"]);
    }

    #[test]
    fn package_index_rejected_as_class() {
        let err = resolver().class_name(1).unwrap_err();
        assert!(matches!(err, MetadataError::UnexpectedNameKind { .. }));
    }

    #[test]
    fn class_index_rejected_as_package() {
        let err = resolver().package_name(2).unwrap_err();
        assert!(matches!(
            err,
            MetadataError::UnexpectedNameKind {
                found: NameKind::Class,
                ..
            }
        ));
    }

    #[test]
    fn out_of_range_index() {
        let err = resolver().class_name(40).unwrap_err();
        assert!(matches!(
            err,
            MetadataError::IndexOutOfRange { index: 40, .. }
        ));
        assert!(resolver().string(99).is_err());
    }

    #[test]
    fn cyclic_chain_detected() {
        let r = NameResolver::new(
            vec!["a".to_string()],
            vec![qn(Some(1), 0, NameKind::Class), qn(Some(0), 0, NameKind::Class)],
        );
        assert!(matches!(
            r.class_name(0).unwrap_err(),
            MetadataError::CyclicName { index: 0 }
        ));
    }

    #[test]
    fn local_class_flagged() {
        let r = NameResolver::new(
            vec!["p".to_string(), "L".to_string()],
            vec![qn(None, 0, NameKind::Package), qn(Some(0), 1, NameKind::Local)],
        );
        let name = r.class_name(1).unwrap();
        assert!(name.local);
    }

    #[test]
    fn namespace_from_dotted() {
        assert!(Namespace::from_dotted("").is_root());
        assert_eq!(Namespace::from_dotted("a.b").to_string(), "a.b");
    }
}
