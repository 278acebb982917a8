//! Error types for bundling.
//!
//! Only stream-level failures surface here. Per-record problems are soft
//! and reported through [`crate::SkipReason`].

use bufr_codec::CodecError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BundleError {
    /// The input stream could not be read.
    #[error("failed to read input record {record}: {source}")]
    Read {
        record: usize,
        #[source]
        source: CodecError,
    },

    /// The bundled dataset could not be encoded.
    #[error("failed to encode bundle: {0}")]
    Encode(#[source] CodecError),

    /// The output sink rejected the bundle.
    #[error("failed to write bundle: {0}")]
    Write(#[source] CodecError),
}

pub type Result<T> = std::result::Result<T, BundleError>;
