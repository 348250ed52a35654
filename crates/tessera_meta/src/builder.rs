//! Incremental construction of package fragments.

use std::collections::HashMap;

use crate::error::MetadataError;
use crate::fragment::{ClassEntry, PackageEntry, PackageFragment, TypeRef};
use crate::names::{NameKind, QualifiedName};

/// Builds a [`PackageFragment`], interning strings and qualified names so
/// that every distinct name occupies one table entry.
#[derive(Debug, Default)]
pub struct FragmentBuilder {
    strings: Vec<String>,
    string_index: HashMap<String, u32>,
    qualified_names: Vec<QualifiedName>,
    name_index: HashMap<QualifiedName, u32>,
    classes: Vec<ClassEntry>,
    package: PackageEntry,
}

impl FragmentBuilder {
    /// Creates an empty builder for a root-package fragment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns a string and returns its table index.
    pub fn string(&mut self, s: &str) -> u32 {
        if let Some(&index) = self.string_index.get(s) {
            return index;
        }
        let index = self.strings.len() as u32;
        self.strings.push(s.to_string());
        self.string_index.insert(s.to_string(), index);
        index
    }

    /// Interns a dotted package name; the empty string is the root package
    /// and has no entry.
    pub fn package_name(&mut self, dotted: &str) -> Option<u32> {
        if dotted.is_empty() {
            return None;
        }
        let mut parent = None;
        for segment in dotted.split('.') {
            parent = Some(self.qualified(parent, segment, NameKind::Package));
        }
        parent
    }

    /// Interns a class name given its dotted package and dotted relative
    /// name (`"Outer.Inner"` for a nested class).
    pub fn class_name(&mut self, package: &str, relative: &str) -> u32 {
        let mut parent = self.package_name(package);
        for segment in relative.split('.') {
            parent = Some(self.qualified(parent, segment, NameKind::Class));
        }
        // `relative` always yields at least one segment
        parent.unwrap_or_default()
    }

    /// Returns a non-null type reference without arguments.
    pub fn type_ref(&mut self, package: &str, relative: &str) -> TypeRef {
        TypeRef {
            class_name: self.class_name(package, relative),
            arguments: Vec::new(),
            nullable: false,
        }
    }

    /// Sets the package this fragment belongs to.
    pub fn set_package(&mut self, dotted: &str) {
        self.package.extensions.package_fq_name = self.package_name(dotted);
    }

    /// Appends a declared type.
    pub fn add_class(&mut self, entry: ClassEntry) {
        self.classes.push(entry);
    }

    /// Gives mutable access to the file-scope members.
    pub fn package_mut(&mut self) -> &mut PackageEntry {
        &mut self.package
    }

    /// Finishes the fragment.
    pub fn build(self) -> PackageFragment {
        PackageFragment {
            strings: self.strings,
            qualified_names: self.qualified_names,
            classes: self.classes,
            package: self.package,
        }
    }

    /// Finishes and encodes the fragment.
    pub fn encode(self) -> Result<Vec<u8>, MetadataError> {
        self.build().encode()
    }

    fn qualified(&mut self, parent: Option<u32>, segment: &str, kind: NameKind) -> u32 {
        let name = QualifiedName {
            parent,
            short_name: self.string(segment),
            kind,
        };
        if let Some(&index) = self.name_index.get(&name) {
            return index;
        }
        let index = self.qualified_names.len() as u32;
        self.qualified_names.push(name.clone());
        self.name_index.insert(name, index);
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::flags;

    #[test]
    fn strings_are_interned() {
        let mut b = FragmentBuilder::new();
        let a = b.string("run");
        let again = b.string("run");
        assert_eq!(a, again);
        assert_eq!(b.build().strings, vec!["run"]);
    }

    #[test]
    fn shared_package_prefix_reused() {
        let mut b = FragmentBuilder::new();
        b.class_name("com.x", "A");
        b.class_name("com.x", "B");
        // com, x, A, B
        assert_eq!(b.build().qualified_names.len(), 4);
    }

    #[test]
    fn root_package_has_no_entry() {
        let mut b = FragmentBuilder::new();
        assert_eq!(b.package_name(""), None);
        b.set_package("");
        assert_eq!(b.build().package.extensions.package_fq_name, None);
    }

    #[test]
    fn nested_class_resolves() {
        let mut b = FragmentBuilder::new();
        let inner = b.class_name("p", "Outer.Inner");
        b.add_class(ClassEntry::new(inner, flags::PUBLIC));
        let (resolver, classes, _) = b.build().into_parts();
        let name = resolver.class_name(classes[0].fq_name).unwrap();
        assert_eq!(name.relative, vec!["Outer", "Inner"]);
    }

    #[test]
    fn package_and_class_with_same_segment_differ() {
        let mut b = FragmentBuilder::new();
        let pkg = b.package_name("a");
        let class = b.class_name("", "a");
        assert_ne!(pkg, Some(class));
    }

    mod proptest_names {
        use super::super::FragmentBuilder;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn package_names_resolve_back(
                segments in proptest::collection::vec("[a-z][a-z0-9]{0,6}", 1..5)
            ) {
                let dotted = segments.join(".");
                let mut b = FragmentBuilder::new();
                let index = b.package_name(&dotted).unwrap();
                let (names, _, _) = b.build().into_parts();
                prop_assert_eq!(names.package_name(index).unwrap().to_string(), dotted);
            }
        }
    }
}
