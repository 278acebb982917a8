#![deny(unsafe_code)]

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use bufr_model::Descriptor;

use crate::entry::{Encoding, TableBEntry, TableDEntry};
use crate::error::{Result, TablesError};
use crate::loaders::LocalTables;

/// Maximum nesting of Table D sequences during expansion.
pub const MAX_SEQUENCE_DEPTH: usize = 16;

/// Where a table came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableOrigin {
    Builtin,
    External(PathBuf),
}

impl fmt::Display for TableOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableOrigin::Builtin => write!(f, "built-in"),
            TableOrigin::External(path) => write!(f, "{}", path.display()),
        }
    }
}

/// One master-table version: Table B elements and Table D sequences.
#[derive(Debug, Clone)]
pub struct SchemaTable {
    master_version: u8,
    origin: TableOrigin,
    local_applied: bool,
    elements: BTreeMap<Descriptor, TableBEntry>,
    sequences: BTreeMap<Descriptor, TableDEntry>,
}

impl SchemaTable {
    pub fn new(master_version: u8, origin: TableOrigin) -> Self {
        Self {
            master_version,
            origin,
            local_applied: false,
            elements: BTreeMap::new(),
            sequences: BTreeMap::new(),
        }
    }

    pub fn master_version(&self) -> u8 {
        self.master_version
    }

    pub fn origin(&self) -> &TableOrigin {
        &self.origin
    }

    /// True once local override entries have been merged in.
    pub fn has_local_overrides(&self) -> bool {
        self.local_applied
    }

    pub fn insert_element(&mut self, entry: TableBEntry) {
        self.elements.insert(entry.descriptor, entry);
    }

    pub fn insert_sequence(&mut self, entry: TableDEntry) {
        self.sequences.insert(entry.descriptor, entry);
    }

    pub fn fetch_element(&self, descriptor: Descriptor) -> Option<&TableBEntry> {
        self.elements.get(&descriptor)
    }

    pub fn fetch_encoding(&self, descriptor: Descriptor) -> Option<&Encoding> {
        self.fetch_element(descriptor).map(|entry| &entry.encoding)
    }

    pub fn fetch_sequence(&self, descriptor: Descriptor) -> Option<&TableDEntry> {
        self.sequences.get(&descriptor)
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    pub fn sequence_count(&self) -> usize {
        self.sequences.len()
    }

    /// Merge local entries over this table; local definitions win.
    pub fn apply_local(&mut self, local: &LocalTables) {
        if local.is_empty() {
            return;
        }
        for entry in &local.elements {
            self.insert_element(entry.clone());
        }
        for entry in &local.sequences {
            self.insert_sequence(entry.clone());
        }
        self.local_applied = true;
    }

    /// Expand Table D sequences recursively into a flat descriptor list.
    ///
    /// Element, replication and operator descriptors are passed through.
    pub fn expand(&self, descriptors: &[Descriptor]) -> Result<Vec<Descriptor>> {
        let mut expanded = Vec::with_capacity(descriptors.len());
        for &descriptor in descriptors {
            self.expand_into(descriptor, 0, &mut expanded)?;
        }
        Ok(expanded)
    }

    fn expand_into(
        &self,
        descriptor: Descriptor,
        depth: usize,
        out: &mut Vec<Descriptor>,
    ) -> Result<()> {
        if !descriptor.is_sequence() {
            out.push(descriptor);
            return Ok(());
        }
        if depth >= MAX_SEQUENCE_DEPTH {
            return Err(TablesError::SequenceTooDeep {
                descriptor,
                limit: MAX_SEQUENCE_DEPTH,
            });
        }
        let entry = self
            .fetch_sequence(descriptor)
            .ok_or(TablesError::UnknownSequence {
                descriptor,
                version: self.master_version,
            })?;
        for &member in &entry.members {
            self.expand_into(member, depth + 1, out)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc(code: u32) -> Descriptor {
        Descriptor::from_code(code).unwrap()
    }

    fn element(code: u32, width: u16) -> TableBEntry {
        TableBEntry {
            descriptor: desc(code),
            name: format!("ELEMENT {code}"),
            encoding: Encoding {
                unit: "Numeric".to_string(),
                scale: 0,
                reference: 0,
                width,
            },
        }
    }

    fn sequence(code: u32, members: &[u32]) -> TableDEntry {
        TableDEntry {
            descriptor: desc(code),
            name: format!("SEQUENCE {code}"),
            members: members.iter().map(|&m| desc(m)).collect(),
        }
    }

    #[test]
    fn expands_nested_sequences_in_order() {
        let mut table = SchemaTable::new(14, TableOrigin::Builtin);
        table.insert_sequence(sequence(301001, &[1001, 1002]));
        table.insert_sequence(sequence(301002, &[301001, 12101]));

        let expanded = table.expand(&[desc(301002), desc(4001)]).unwrap();
        assert_eq!(expanded, vec![desc(1001), desc(1002), desc(12101), desc(4001)]);
    }

    #[test]
    fn unknown_sequence_fails() {
        let table = SchemaTable::new(14, TableOrigin::Builtin);
        let err = table.expand(&[desc(301001)]).unwrap_err();
        assert!(matches!(err, TablesError::UnknownSequence { version: 14, .. }));
    }

    #[test]
    fn self_referencing_sequence_is_bounded() {
        let mut table = SchemaTable::new(14, TableOrigin::Builtin);
        table.insert_sequence(sequence(301001, &[301001]));
        let err = table.expand(&[desc(301001)]).unwrap_err();
        assert!(matches!(err, TablesError::SequenceTooDeep { .. }));
    }

    #[test]
    fn local_entries_override_base() {
        let mut table = SchemaTable::new(14, TableOrigin::Builtin);
        table.insert_element(element(1002, 10));
        let local = LocalTables {
            elements: vec![element(1002, 12), element(1099, 8)],
            sequences: Vec::new(),
        };
        table.apply_local(&local);

        assert_eq!(table.fetch_encoding(desc(1002)).unwrap().width, 12);
        assert!(table.fetch_element(desc(1099)).is_some());
        assert!(table.has_local_overrides());
    }
}
