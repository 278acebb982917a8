//! Bundle configuration.

use crate::header_filter::HeaderFilter;
use crate::search::SearchKey;

/// Options for one bundling run, built once and passed by reference.
#[derive(Debug, Clone, Default)]
pub struct BundleConfig {
    /// Ordered value filters; empty accepts every subset.
    pub search_keys: Vec<SearchKey>,
    pub header_filter: HeaderFilter,
    /// Compress the output data section when it holds more than one subset.
    pub compress: bool,
}

impl BundleConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search_key(mut self, key: SearchKey) -> Self {
        self.search_keys.push(key);
        self
    }

    pub fn with_search_keys(mut self, keys: impl IntoIterator<Item = SearchKey>) -> Self {
        self.search_keys.extend(keys);
        self
    }

    pub fn with_header_filter(mut self, filter: HeaderFilter) -> Self {
        self.header_filter = filter;
        self
    }

    pub fn with_compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }
}
