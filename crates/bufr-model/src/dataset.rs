use serde::{Deserialize, Serialize};

use crate::{DataSubset, Section1, Template};

/// A decoded message: header, template and subsets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub section1: Section1,
    pub template: Template,
    /// Section 3 flags (observed / compressed).
    pub data_flag: u8,
    pub subsets: Vec<DataSubset>,
}

impl Dataset {
    /// Section 3 flag: observed data.
    pub const FLAG_OBSERVED: u8 = 0x80;
    /// Section 3 flag: compressed data section.
    pub const FLAG_COMPRESSED: u8 = 0x40;

    pub fn new(section1: Section1, template: Template) -> Self {
        Self {
            section1,
            template,
            data_flag: Self::FLAG_OBSERVED,
            subsets: Vec::new(),
        }
    }

    pub fn with_subsets(mut self, subsets: Vec<DataSubset>) -> Self {
        self.subsets = subsets;
        self
    }

    pub fn subset_count(&self) -> usize {
        self.subsets.len()
    }

    pub fn is_compressed(&self) -> bool {
        self.data_flag & Self::FLAG_COMPRESSED != 0
    }

    pub fn push_subset(&mut self, subset: DataSubset) {
        self.subsets.push(subset);
    }
}
