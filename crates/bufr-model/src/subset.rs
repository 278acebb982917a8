use serde::{Deserialize, Serialize};

use crate::{Descriptor, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataField {
    pub descriptor: Descriptor,
    pub value: Value,
}

impl DataField {
    pub fn new(descriptor: Descriptor, value: Value) -> Self {
        Self { descriptor, value }
    }
}

/// One data subset: the decoded fields of the expanded template, in order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataSubset {
    pub fields: Vec<DataField>,
}

impl DataSubset {
    pub fn new(fields: Vec<DataField>) -> Self {
        Self { fields }
    }

    pub fn push(&mut self, descriptor: Descriptor, value: Value) {
        self.fields.push(DataField::new(descriptor, value));
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, pos: usize) -> Option<&DataField> {
        self.fields.get(pos)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DataField> {
        self.fields.iter()
    }

    /// Position of the first field with `descriptor` at or after `start`.
    pub fn find(&self, descriptor: Descriptor, start: usize) -> Option<usize> {
        self.fields
            .iter()
            .enumerate()
            .skip(start)
            .find(|(_, field)| field.descriptor == descriptor)
            .map(|(pos, _)| pos)
    }

    /// Value of the first field with `descriptor`.
    pub fn value_of(&self, descriptor: Descriptor) -> Option<&Value> {
        self.find(descriptor, 0).map(|pos| &self.fields[pos].value)
    }
}
