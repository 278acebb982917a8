//! The streaming bundle state machine.
//!
//! States follow one run:
//! 1. **Init**: search keys resolved, nothing read yet
//! 2. **Streaming**: records are read and folded into the accumulator
//! 3. **Finalize**: the accumulator is handed to the emitter
//! 4. **Done**: output flushed
//!
//! Per-record problems never stop the stream; each record yields a
//! [`RecordOutcome`] that is counted in [`BundleStats`].

use std::fmt;
use std::io::{Read, Write};

use bufr_codec::{MessageReader, MessageWriter, RawMessage, decode_message};
use bufr_model::Dataset;
use bufr_tables::{SchemaTable, SchemaTableCollection};
use tracing::{debug, info, trace};

use crate::accumulator::Accumulator;
use crate::config::BundleConfig;
use crate::emitter::{EmitOutcome, OutputEmitter};
use crate::error::{BundleError, Result};
use crate::search::{DescriptorValueFilter, resolve_search_keys, subset_matches};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundleState {
    Init,
    Streaming,
    Finalize,
    Done,
}

/// Why a record contributed nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    HeaderMismatch,
    UnknownTableVersion(u8),
    Decode(String),
    /// Template, or the encodings its table gives it, differ from the
    /// first accepted record.
    TemplateMismatch,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::HeaderMismatch => write!(f, "header does not match filter"),
            SkipReason::UnknownTableVersion(version) => {
                write!(f, "no table for master version {version}")
            }
            SkipReason::Decode(message) => write!(f, "decode failed: {message}"),
            SkipReason::TemplateMismatch => write!(f, "template differs from bundle"),
        }
    }
}

/// Result of processing one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Record accepted; `matched` of its `total` subsets were merged.
    Merged { matched: usize, total: usize },
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BundleStats {
    pub records_read: usize,
    pub records_accepted: usize,
    pub subsets_merged: usize,
    pub subsets_rejected: usize,
    pub header_mismatches: usize,
    pub unknown_table_versions: usize,
    pub decode_failures: usize,
    pub template_mismatches: usize,
}

impl BundleStats {
    fn record(&mut self, outcome: &RecordOutcome) {
        match outcome {
            RecordOutcome::Merged { matched, total } => {
                self.records_accepted += 1;
                self.subsets_merged += matched;
                self.subsets_rejected += total - matched;
            }
            RecordOutcome::Skipped(SkipReason::HeaderMismatch) => self.header_mismatches += 1,
            RecordOutcome::Skipped(SkipReason::UnknownTableVersion(_)) => {
                self.unknown_table_versions += 1;
            }
            RecordOutcome::Skipped(SkipReason::Decode(_)) => self.decode_failures += 1,
            RecordOutcome::Skipped(SkipReason::TemplateMismatch) => {
                self.template_mismatches += 1;
            }
        }
    }

    pub fn records_skipped(&self) -> usize {
        self.header_mismatches
            + self.unknown_table_versions
            + self.decode_failures
            + self.template_mismatches
    }
}

/// Result of a complete run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BundleSummary {
    pub stats: BundleStats,
    pub emitted: EmitOutcome,
}

/// Folds a stream of records into one bundle.
pub struct StreamingBundler<'a> {
    tables: &'a SchemaTableCollection,
    config: &'a BundleConfig,
    filters: Vec<DescriptorValueFilter>,
    accumulator: Option<Accumulator<'a>>,
    stats: BundleStats,
    state: BundleState,
}

impl<'a> StreamingBundler<'a> {
    /// Resolve the configured search keys against the default table.
    pub fn new(tables: &'a SchemaTableCollection, config: &'a BundleConfig) -> Self {
        let filters = resolve_search_keys(&config.search_keys, tables.default_table());
        debug!(
            filters = filters.len(),
            header_filter = ?config.header_filter,
            "bundler initialised"
        );
        Self {
            tables,
            config,
            filters,
            accumulator: None,
            stats: BundleStats::default(),
            state: BundleState::Init,
        }
    }

    pub fn state(&self) -> BundleState {
        self.state
    }

    pub fn stats(&self) -> &BundleStats {
        &self.stats
    }

    /// Read every record, then emit the bundle.
    pub fn run<R: Read, W: Write>(
        mut self,
        reader: &mut MessageReader<R>,
        writer: &mut MessageWriter<W>,
    ) -> Result<BundleSummary> {
        let mut emitted = EmitOutcome::Empty;
        loop {
            self.state = match self.state {
                BundleState::Init | BundleState::Streaming => match reader.read_message() {
                    Ok(Some(raw)) => {
                        self.process_record(&raw);
                        BundleState::Streaming
                    }
                    Ok(None) => BundleState::Finalize,
                    Err(source) => {
                        return Err(BundleError::Read {
                            record: self.stats.records_read + 1,
                            source,
                        });
                    }
                },
                BundleState::Finalize => {
                    emitted = self.finalize(writer)?;
                    BundleState::Done
                }
                BundleState::Done => break,
            };
        }
        Ok(self.summary(emitted))
    }

    /// Emit the bundle for records processed so far.
    pub fn finish<W: Write>(mut self, writer: &mut MessageWriter<W>) -> Result<BundleSummary> {
        self.state = BundleState::Finalize;
        let emitted = self.finalize(writer)?;
        self.state = BundleState::Done;
        Ok(self.summary(emitted))
    }

    /// Filter, decode and merge one record.
    pub fn process_record(&mut self, raw: &RawMessage) -> RecordOutcome {
        self.state = BundleState::Streaming;
        self.stats.records_read += 1;
        let index = self.stats.records_read;

        let outcome = match self.decode_record(raw) {
            Ok((dataset, table)) => self.merge_record(dataset, table),
            Err(reason) => RecordOutcome::Skipped(reason),
        };
        match &outcome {
            RecordOutcome::Skipped(reason) => debug!(record = index, %reason, "record skipped"),
            RecordOutcome::Merged { matched, total } => {
                debug!(record = index, matched, total, "record merged");
            }
        }
        self.stats.record(&outcome);
        outcome
    }

    fn decode_record(
        &self,
        raw: &RawMessage,
    ) -> std::result::Result<(Dataset, &'a SchemaTable), SkipReason> {
        let message = raw
            .parse()
            .map_err(|err| SkipReason::Decode(err.to_string()))?;
        if !self.config.header_filter.matches(&message.section1) {
            return Err(SkipReason::HeaderMismatch);
        }
        let version = message.section1.master_table_version;
        let tables = self.tables;
        let table = tables
            .resolve(version)
            .ok_or(SkipReason::UnknownTableVersion(version))?;
        let dataset =
            decode_message(&message, table).map_err(|err| SkipReason::Decode(err.to_string()))?;
        Ok((dataset, table))
    }

    fn merge_record(&mut self, dataset: Dataset, table: &'a SchemaTable) -> RecordOutcome {
        let accumulator = self
            .accumulator
            .get_or_insert_with(|| Accumulator::from_record(&dataset, table));
        if !accumulator.is_compatible(&dataset.template, table) {
            return RecordOutcome::Skipped(SkipReason::TemplateMismatch);
        }

        let total = dataset.subsets.len();
        let mut matched = 0;
        for (position, subset) in dataset.subsets.into_iter().enumerate() {
            if subset_matches(&subset, &self.filters) {
                trace!(subset = position, "subset selected");
                accumulator.merge_subset(subset);
                matched += 1;
            } else {
                trace!(subset = position, "subset rejected");
            }
        }
        RecordOutcome::Merged { matched, total }
    }

    fn finalize<W: Write>(&mut self, writer: &mut MessageWriter<W>) -> Result<EmitOutcome> {
        OutputEmitter::new(self.config.compress).emit(self.accumulator.take(), writer)
    }

    fn summary(&self, emitted: EmitOutcome) -> BundleSummary {
        let stats = self.stats;
        info!(
            records = stats.records_read,
            accepted = stats.records_accepted,
            skipped = stats.records_skipped(),
            subsets = stats.subsets_merged,
            "bundling finished"
        );
        BundleSummary { stats, emitted }
    }
}
