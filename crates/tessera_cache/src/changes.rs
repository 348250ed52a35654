//! Change records and the collector interface they are reported through.

use crate::symbols::{SymbolDescriptor, SymbolId};

/// Receives one before/after pair per affected symbol.
///
/// The cache never filters pairs whose shapes are unchanged. Collectors that
/// want to skip such pairs can use [`SymbolDescriptor::structurally_equal`].
pub trait ChangeCollector {
    /// Records a change; at least one side is present.
    fn collect_change(&mut self, old: Option<SymbolDescriptor>, new: Option<SymbolDescriptor>);
}

/// An old/new descriptor pair for one symbol.
#[derive(Clone, Debug)]
pub struct ChangeRecord {
    /// The affected symbol.
    pub id: SymbolId,
    /// The descriptor before this round, if the symbol existed.
    pub old: Option<SymbolDescriptor>,
    /// The descriptor after this round, if the symbol still exists.
    pub new: Option<SymbolDescriptor>,
}

impl ChangeRecord {
    /// Builds a record, taking the identity from whichever side is present.
    /// Returns `None` when both sides are absent.
    pub fn new(old: Option<SymbolDescriptor>, new: Option<SymbolDescriptor>) -> Option<Self> {
        let id = old.as_ref().or(new.as_ref())?.id().clone();
        Some(Self { id, old, new })
    }

    /// The symbol was added this round.
    pub fn is_addition(&self) -> bool {
        self.old.is_none() && self.new.is_some()
    }

    /// The symbol was removed this round.
    pub fn is_removal(&self) -> bool {
        self.old.is_some() && self.new.is_none()
    }

    /// Both sides are present and resolve to the same shape.
    pub fn is_structurally_unchanged(&self) -> bool {
        match (&self.old, &self.new) {
            (Some(old), Some(new)) => old.structurally_equal(new),
            _ => false,
        }
    }
}

/// Collector that keeps every record in arrival order.
#[derive(Debug, Default)]
pub struct RecordingCollector {
    changes: Vec<ChangeRecord>,
}

impl RecordingCollector {
    /// Creates an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records collected so far.
    pub fn changes(&self) -> &[ChangeRecord] {
        &self.changes
    }

    /// Identities of the collected records, in arrival order.
    pub fn ids(&self) -> Vec<&SymbolId> {
        self.changes.iter().map(|c| &c.id).collect()
    }

    /// Records whose shape actually changed.
    pub fn structural_changes(&self) -> impl Iterator<Item = &ChangeRecord> {
        self.changes
            .iter()
            .filter(|c| !c.is_structurally_unchanged())
    }

    /// Consumes the collector, returning its records.
    pub fn into_changes(self) -> Vec<ChangeRecord> {
        self.changes
    }
}

impl ChangeCollector for RecordingCollector {
    fn collect_change(&mut self, old: Option<SymbolDescriptor>, new: Option<SymbolDescriptor>) {
        if let Some(record) = ChangeRecord::new(old, new) {
            self.changes.push(record);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::extract_symbols;
    use tessera_common::SourceId;
    use tessera_meta::fragment::flags;
    use tessera_meta::{ClassEntry, FragmentBuilder};

    fn descriptors(classes: &[&str]) -> Vec<SymbolDescriptor> {
        let mut b = FragmentBuilder::new();
        b.set_package("q");
        for class in classes {
            let name = b.class_name("q", class);
            b.add_class(ClassEntry::new(name, flags::PUBLIC));
        }
        let source = SourceId::new("/q/Q.src").unwrap();
        extract_symbols(&source, &b.encode().unwrap())
            .unwrap()
            .into_values()
            .collect()
    }

    #[test]
    fn record_needs_one_side() {
        assert!(ChangeRecord::new(None, None).is_none());
    }

    #[test]
    fn addition_and_removal() {
        let d = descriptors(&["T"]).remove(0);
        let added = ChangeRecord::new(None, Some(d.clone())).unwrap();
        assert!(added.is_addition());
        assert!(!added.is_removal());
        assert_eq!(added.id.to_string(), "q.T");

        let removed = ChangeRecord::new(Some(d), None).unwrap();
        assert!(removed.is_removal());
        assert!(!removed.is_structurally_unchanged());
    }

    #[test]
    fn same_shape_is_unchanged() {
        let old = descriptors(&["T"]).remove(0);
        let new = descriptors(&["T"]).remove(0);
        let record = ChangeRecord::new(Some(old), Some(new)).unwrap();
        assert!(record.is_structurally_unchanged());
    }

    #[test]
    fn recording_collector_keeps_order() {
        let mut collector = RecordingCollector::new();
        for d in descriptors(&["A", "B"]) {
            collector.collect_change(None, Some(d));
        }
        collector.collect_change(None, None);
        let ids: Vec<String> = collector.ids().iter().map(|id| id.to_string()).collect();
        assert_eq!(ids, vec!["q.A", "q.B", "q.QPart"]);
        assert_eq!(collector.structural_changes().count(), 3);
        assert_eq!(collector.into_changes().len(), 3);
    }
}
