//! Streaming selection of BUFR data subsets into a single bundle.
//!
//! Records are read one at a time, filtered on their section 1 header,
//! decoded with the table matching their master version, and their subsets
//! are kept when they satisfy the ordered descriptor/value filters. Every
//! kept subset shares the template of the first accepted record. The
//! result is written as one message.

#![deny(unsafe_code)]

pub mod accumulator;
pub mod bundler;
pub mod config;
pub mod emitter;
pub mod error;
pub mod header_filter;
pub mod search;

pub use accumulator::Accumulator;
pub use bundler::{
    BundleState, BundleStats, BundleSummary, RecordOutcome, SkipReason, StreamingBundler,
};
pub use config::BundleConfig;
pub use emitter::{EmitOutcome, OutputEmitter};
pub use error::{BundleError, Result};
pub use header_filter::HeaderFilter;
pub use search::{
    DescriptorValueFilter, FilterValues, SearchKey, find_first_matching_position,
    resolve_search_keys, subset_matches,
};
