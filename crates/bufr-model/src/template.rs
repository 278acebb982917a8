use serde::{Deserialize, Serialize};

use crate::Descriptor;

/// The structural template of a message: its edition and the unexpanded
/// section 3 descriptor list.
///
/// Two messages can only share an output message when their templates are
/// equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Template {
    pub edition: u8,
    pub descriptors: Vec<Descriptor>,
}

impl Template {
    pub fn new(edition: u8, descriptors: Vec<Descriptor>) -> Self {
        Self {
            edition,
            descriptors,
        }
    }

    pub fn is_compatible(&self, other: &Template) -> bool {
        self == other
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}
