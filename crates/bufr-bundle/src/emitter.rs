//! Encoding and writing of the finished bundle.

use std::io::Write;

use bufr_codec::{MessageWriter, encode_dataset};
use tracing::info;

use crate::accumulator::Accumulator;
use crate::error::{BundleError, Result};

/// What the emitter produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitOutcome {
    Written { subsets: usize, bytes: usize },
    /// No subset was merged; nothing was written.
    Empty,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OutputEmitter {
    compress: bool,
}

impl OutputEmitter {
    pub fn new(compress: bool) -> Self {
        Self { compress }
    }

    /// Encode the bundle as a single message and flush the sink.
    pub fn emit<W: Write>(
        &self,
        accumulator: Option<Accumulator<'_>>,
        writer: &mut MessageWriter<W>,
    ) -> Result<EmitOutcome> {
        let Some(accumulator) = accumulator.filter(|acc| !acc.is_empty()) else {
            info!("no subsets selected, no bundle written");
            return Ok(EmitOutcome::Empty);
        };
        let table = accumulator.table();
        let dataset = accumulator.into_dataset();
        let subsets = dataset.subset_count();

        let message = encode_dataset(&dataset, table, self.compress).map_err(BundleError::Encode)?;
        writer.write_message(&message).map_err(BundleError::Write)?;
        writer.flush().map_err(BundleError::Write)?;

        info!(
            subsets,
            bytes = message.len(),
            table_version = table.master_version(),
            "bundle written"
        );
        Ok(EmitOutcome::Written {
            subsets,
            bytes: message.len(),
        })
    }
}
