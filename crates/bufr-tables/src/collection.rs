#![deny(unsafe_code)]

use std::path::PathBuf;

use tracing::{info, warn};

use crate::error::Result;
use crate::loaders::{LocalTables, builtin_table, load_tables_dir};
use crate::paths::resolve_tables_dir;
use crate::table::SchemaTable;

/// Ordered, versioned set of schema tables.
///
/// The base table is always first. Lookup is by exact master-table version;
/// when several tables share a version the earliest one wins. The
/// collection is never mutated after [`SchemaTableCollectionBuilder::build`].
#[derive(Debug, Clone)]
pub struct SchemaTableCollection {
    tables: Vec<SchemaTable>,
}

impl SchemaTableCollection {
    pub fn builder(base: SchemaTable) -> SchemaTableCollectionBuilder {
        SchemaTableCollectionBuilder {
            base,
            external: Vec::new(),
            local: LocalTables::default(),
        }
    }

    /// Table for `version`, or `None` when the collection has no such version.
    pub fn resolve(&self, version: u8) -> Option<&SchemaTable> {
        self.tables
            .iter()
            .find(|table| table.master_version() == version)
    }

    /// The base table, used to interpret search keys.
    pub fn default_table(&self) -> &SchemaTable {
        &self.tables[0]
    }

    pub fn versions(&self) -> impl Iterator<Item = u8> + '_ {
        self.tables.iter().map(SchemaTable::master_version)
    }

    pub fn tables(&self) -> &[SchemaTable] {
        &self.tables
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

pub struct SchemaTableCollectionBuilder {
    base: SchemaTable,
    external: Vec<SchemaTable>,
    local: LocalTables,
}

impl SchemaTableCollectionBuilder {
    #[must_use]
    pub fn with_external(mut self, tables: Vec<SchemaTable>) -> Self {
        self.external.extend(tables);
        self
    }

    #[must_use]
    pub fn with_local(mut self, local: LocalTables) -> Self {
        self.local = local;
        self
    }

    pub fn build(self) -> SchemaTableCollection {
        let mut tables = Vec::with_capacity(1 + self.external.len());
        tables.push(self.base);
        tables.extend(self.external);
        for table in &mut tables {
            table.apply_local(&self.local);
        }
        SchemaTableCollection { tables }
    }
}

/// Where to find the tables of a collection.
#[derive(Debug, Clone, Default)]
pub struct TableSources {
    /// External table directory; falls back to `BUFR_TABLES`.
    pub tables_dir: Option<PathBuf>,
    pub local_table_b: Option<PathBuf>,
    pub local_table_d: Option<PathBuf>,
}

/// Build the collection: built-in base table, external sets, local overrides.
///
/// A configured table directory that does not exist is logged and skipped,
/// unreadable or malformed table files are errors.
pub fn load_collection(sources: &TableSources) -> Result<SchemaTableCollection> {
    let base = builtin_table()?;
    let mut builder = SchemaTableCollection::builder(base);

    if let Some(dir) = resolve_tables_dir(sources.tables_dir.as_deref()) {
        if dir.is_dir() {
            builder = builder.with_external(load_tables_dir(&dir)?);
        } else {
            warn!(path = %dir.display(), "table directory not found, using built-in tables");
        }
    }

    let local = LocalTables::load(
        sources.local_table_b.as_deref(),
        sources.local_table_d.as_deref(),
    )?;
    let collection = builder.with_local(local).build();
    info!(
        table_count = collection.len(),
        versions = ?collection.versions().collect::<Vec<_>>(),
        "schema tables loaded"
    );
    Ok(collection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::TableOrigin;

    #[test]
    fn resolves_exact_version_only() {
        let base = SchemaTable::new(14, TableOrigin::Builtin);
        let collection = SchemaTableCollection::builder(base)
            .with_external(vec![SchemaTable::new(13, TableOrigin::Builtin)])
            .build();

        assert_eq!(collection.resolve(14).map(SchemaTable::master_version), Some(14));
        assert_eq!(collection.resolve(13).map(SchemaTable::master_version), Some(13));
        assert!(collection.resolve(12).is_none());
        assert_eq!(collection.default_table().master_version(), 14);
    }

    #[test]
    fn first_table_of_a_version_wins() {
        let base = SchemaTable::new(14, TableOrigin::Builtin);
        let duplicate = SchemaTable::new(14, TableOrigin::External(PathBuf::from("dup.csv")));
        let collection = SchemaTableCollection::builder(base)
            .with_external(vec![duplicate])
            .build();

        let resolved = collection.resolve(14).unwrap();
        assert_eq!(resolved.origin(), &TableOrigin::Builtin);
        assert_eq!(collection.versions().collect::<Vec<_>>(), vec![14, 14]);
    }
}
