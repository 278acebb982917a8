//! Message stream writer.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::error::Result;
use crate::message::RawMessage;

/// Writes messages back to back to a byte sink.
pub struct MessageWriter<W: Write> {
    writer: BufWriter<W>,
    messages_written: usize,
    bytes_written: usize,
}

impl<W: Write> MessageWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
            messages_written: 0,
            bytes_written: 0,
        }
    }

    pub fn write_message(&mut self, message: &RawMessage) -> Result<()> {
        self.writer.write_all(message.as_bytes())?;
        self.messages_written += 1;
        self.bytes_written += message.len();
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn messages_written(&self) -> usize {
        self.messages_written
    }

    pub fn bytes_written(&self) -> usize {
        self.bytes_written
    }

    /// Flush and return the underlying sink.
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|err| err.into_error().into())
    }
}

impl MessageWriter<File> {
    pub fn create(path: &Path) -> io::Result<Self> {
        File::create(path).map(Self::new)
    }
}
