//! Message stream reader.
//!
//! Splits a byte stream into raw messages. Bytes before a `BUFR` indicator
//! (transmission headers, padding) are skipped.

use std::fs::File;
use std::io::{self, BufReader, ErrorKind, Read};
use std::path::Path;

use tracing::trace;

use crate::error::{CodecError, Result};
use crate::message::{END_MARKER, MAGIC, RawMessage, read_u24};

/// Smallest length a message can declare: sections 0 and 5.
const MIN_MESSAGE_LEN: usize = 12;

/// Reads consecutive messages from a byte stream.
pub struct MessageReader<R: Read> {
    reader: BufReader<R>,
    messages_read: usize,
}

impl<R: Read> MessageReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            messages_read: 0,
        }
    }

    /// Read the next message.
    ///
    /// Returns `Ok(None)` at a clean end of input, including trailing bytes
    /// that contain no further indicator.
    pub fn read_message(&mut self) -> Result<Option<RawMessage>> {
        let skipped = match self.seek_magic()? {
            Some(skipped) => skipped,
            None => return Ok(None),
        };
        if skipped > 0 {
            trace!(skipped, "skipped bytes before BUFR indicator");
        }

        let mut header = [0u8; 4];
        self.read_exact_or_truncated(&mut header, "section 0")?;
        let length = read_u24(&header, 0);
        if length < MIN_MESSAGE_LEN {
            return Err(CodecError::invalid_section(
                0,
                format!("declared length {length} too small"),
            ));
        }

        let mut bytes = Vec::with_capacity(length);
        bytes.extend_from_slice(MAGIC);
        bytes.extend_from_slice(&header);
        bytes.resize(length, 0);
        self.read_exact_or_truncated(&mut bytes[8..], "message body")?;
        if !bytes.ends_with(END_MARKER) {
            return Err(CodecError::MissingEndMarker);
        }

        self.messages_read += 1;
        Ok(Some(RawMessage::new(bytes)))
    }

    pub fn messages_read(&self) -> usize {
        self.messages_read
    }

    /// Consume bytes up to and including the next `BUFR`. Returns the number
    /// of bytes skipped before it, or `None` at end of input.
    fn seek_magic(&mut self) -> Result<Option<usize>> {
        let mut window = [0u8; 4];
        let mut filled = 0usize;
        let mut consumed = 0usize;
        loop {
            let mut byte = [0u8; 1];
            match self.reader.read(&mut byte) {
                Ok(0) => return Ok(None),
                Ok(_) => {}
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            }
            consumed += 1;
            if filled < window.len() {
                window[filled] = byte[0];
                filled += 1;
            } else {
                window.rotate_left(1);
                window[3] = byte[0];
            }
            if filled == window.len() && &window == MAGIC {
                return Ok(Some(consumed - MAGIC.len()));
            }
        }
    }

    fn read_exact_or_truncated(&mut self, buf: &mut [u8], context: &'static str) -> Result<()> {
        self.reader.read_exact(buf).map_err(|err| match err.kind() {
            ErrorKind::UnexpectedEof => CodecError::truncated(context),
            _ => CodecError::Io(err),
        })
    }
}

impl MessageReader<File> {
    /// Open a file of concatenated messages.
    pub fn open(path: &Path) -> io::Result<Self> {
        File::open(path).map(Self::new)
    }
}

impl<R: Read> Iterator for MessageReader<R> {
    type Item = Result<RawMessage>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_message().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Smallest framed message: sections 0 and 5 only.
    fn minimal() -> Vec<u8> {
        let mut bytes = b"BUFR\x00\x00\x0c\x04".to_vec();
        bytes.extend_from_slice(b"7777");
        bytes
    }

    #[test]
    fn skips_leading_bytes() {
        let mut input = b"ZCZC 123\r\r\n".to_vec();
        input.extend(minimal());
        input.extend(b"BUF".iter());
        input.extend(minimal());
        input.extend(b"\r\nNNNN".iter());

        let mut reader = MessageReader::new(input.as_slice());
        assert_eq!(reader.read_message().unwrap().unwrap().len(), 12);
        assert_eq!(reader.read_message().unwrap().unwrap().len(), 12);
        assert!(reader.read_message().unwrap().is_none());
        assert_eq!(reader.messages_read(), 2);
    }

    #[test]
    fn truncated_message_is_an_error() {
        let mut input = minimal();
        input.truncate(10);
        let mut reader = MessageReader::new(input.as_slice());
        assert!(matches!(
            reader.read_message(),
            Err(CodecError::Truncated { .. })
        ));
    }

    #[test]
    fn missing_end_marker_is_an_error() {
        let mut input = minimal();
        input[11] = b'8';
        let mut reader = MessageReader::new(input.as_slice());
        assert!(matches!(
            reader.read_message(),
            Err(CodecError::MissingEndMarker)
        ));
    }

    #[test]
    fn empty_input_yields_nothing() {
        let reader = MessageReader::new(&b""[..]);
        assert_eq!(reader.count(), 0);
    }
}
