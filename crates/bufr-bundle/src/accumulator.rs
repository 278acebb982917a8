//! The growing output bundle.

use bufr_model::{DataSubset, Dataset, Descriptor, Template};
use bufr_tables::SchemaTable;

/// Subsets merged so far, with the header, template and table of the first
/// accepted record.
#[derive(Debug)]
pub struct Accumulator<'t> {
    table: &'t SchemaTable,
    dataset: Dataset,
}

impl<'t> Accumulator<'t> {
    /// Start a bundle from the first accepted record. Its subsets are not
    /// taken; they go through the value filters like any other.
    pub fn from_record(record: &Dataset, table: &'t SchemaTable) -> Self {
        let mut dataset = Dataset::new(record.section1, record.template.clone());
        dataset.data_flag |= record.data_flag;
        Self { table, dataset }
    }

    /// Whether subsets of a record with `template`, decoded with `table`,
    /// can be re-encoded with the bundle's table.
    pub fn is_compatible(&self, template: &Template, table: &SchemaTable) -> bool {
        self.dataset.template.is_compatible(template)
            && encodes_alike(self.table, table, &template.descriptors)
    }

    pub fn merge_subset(&mut self, subset: DataSubset) {
        self.dataset.push_subset(subset);
    }

    pub fn subset_count(&self) -> usize {
        self.dataset.subset_count()
    }

    pub fn is_empty(&self) -> bool {
        self.dataset.subsets.is_empty()
    }

    pub fn table(&self) -> &'t SchemaTable {
        self.table
    }

    pub fn into_dataset(self) -> Dataset {
        self.dataset
    }
}

/// Both tables expand `descriptors` to the same elements with equal
/// encodings.
fn encodes_alike(left: &SchemaTable, right: &SchemaTable, descriptors: &[Descriptor]) -> bool {
    if std::ptr::eq(left, right) {
        return true;
    }
    match (left.expand(descriptors), right.expand(descriptors)) {
        (Ok(expanded), Ok(other)) => {
            expanded == other
                && expanded
                    .iter()
                    .all(|&d| left.fetch_encoding(d) == right.fetch_encoding(d))
        }
        _ => false,
    }
}
