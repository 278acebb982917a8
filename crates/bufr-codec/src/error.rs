//! Error types for BUFR message operations.

use bufr_model::{Descriptor, DescriptorKind};
use bufr_tables::{TablesError, ValueClass};
use thiserror::Error;

/// Errors that can occur when reading, decoding, encoding or writing messages.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Stream ended inside a message or a data section ran out of bits.
    #[error("truncated message: {context}")]
    Truncated { context: &'static str },

    /// Message does not start with `BUFR`.
    #[error("missing BUFR indicator")]
    BadMagic,

    /// Declared total length differs from the bytes available.
    #[error("message length mismatch: declared {declared}, got {actual}")]
    LengthMismatch { declared: usize, actual: usize },

    #[error("unsupported BUFR edition {edition}")]
    UnsupportedEdition { edition: u8 },

    /// Malformed section.
    #[error("invalid section {section}: {message}")]
    InvalidSection { section: u8, message: String },

    /// Message does not end with `7777`.
    #[error("missing end section 7777")]
    MissingEndMarker,

    #[error("message of {length} bytes exceeds the 24-bit length field")]
    MessageTooLarge { length: usize },

    /// Element descriptor absent from the table used for decoding.
    #[error("descriptor {descriptor} not found in table version {version}")]
    UnknownDescriptor { descriptor: Descriptor, version: u8 },

    #[error("{kind} descriptor {descriptor} is not supported")]
    UnsupportedDescriptor {
        descriptor: Descriptor,
        kind: DescriptorKind,
    },

    /// A subset does not follow the expanded template.
    #[error("subset {index} has {actual} fields, template expands to {expected}")]
    SubsetShape {
        index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("subset {index} holds {actual} at position {position}, template expects {expected}")]
    FieldMismatch {
        index: usize,
        position: usize,
        expected: Descriptor,
        actual: Descriptor,
    },

    #[error("value {value} of {descriptor} does not fit its encoding")]
    ValueOutOfRange {
        descriptor: Descriptor,
        value: String,
    },

    #[error("{descriptor} expects a {expected} value")]
    TypeMismatch {
        descriptor: Descriptor,
        expected: ValueClass,
    },

    /// Increments of a compressed element need more than 63 bits.
    #[error("increments of {descriptor} do not fit a compressed data section")]
    CompressionOverflow { descriptor: Descriptor },

    #[error(transparent)]
    Tables(#[from] TablesError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for codec operations.
pub type Result<T> = std::result::Result<T, CodecError>;

impl CodecError {
    /// Create a Truncated error.
    pub fn truncated(context: &'static str) -> Self {
        Self::Truncated { context }
    }

    /// Create an InvalidSection error.
    pub fn invalid_section(section: u8, message: impl Into<String>) -> Self {
        Self::InvalidSection {
            section,
            message: message.into(),
        }
    }

    /// Create a ValueOutOfRange error.
    pub fn value_out_of_range(descriptor: Descriptor, value: impl ToString) -> Self {
        Self::ValueOutOfRange {
            descriptor,
            value: value.to_string(),
        }
    }
}
