//! BUFR edition 4 message codec.
//!
//! This crate frames, decodes and encodes WMO BUFR messages for the bundle
//! tool. It covers element and sequence descriptors in both uncompressed
//! and compressed data sections.
//!
//! # Example
//!
//! ```no_run
//! use std::fs::File;
//! use bufr_codec::{MessageReader, decode_message};
//! use bufr_tables::builtin_table;
//!
//! let table = builtin_table()?;
//! let reader = MessageReader::new(File::open("obs.bufr")?);
//! for raw in reader {
//!     let dataset = decode_message(&raw?.parse()?, &table)?;
//!     println!("{} subsets", dataset.subset_count());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Not supported
//!
//! Replication (F=1) and operator (F=2) descriptors are rejected with
//! [`CodecError::UnsupportedDescriptor`]. Only edition 4 is read and written.

#![deny(unsafe_code)]

pub mod bits;
pub mod decode;
pub mod encode;
pub mod error;
pub mod message;
pub mod reader;
pub mod writer;

pub use decode::decode_message;
pub use encode::encode_dataset;
pub use error::{CodecError, Result};
pub use message::{Message, RawMessage};
pub use reader::MessageReader;
pub use writer::MessageWriter;
