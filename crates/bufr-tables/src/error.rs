#![deny(unsafe_code)]

use std::path::PathBuf;

use bufr_model::Descriptor;

#[derive(Debug, thiserror::Error)]
pub enum TablesError {
    #[error("failed to read table file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse table CSV {path}: {message}")]
    Csv { path: PathBuf, message: String },

    #[error("invalid descriptor '{raw}' in {path}")]
    InvalidDescriptor { path: PathBuf, raw: String },

    #[error("invalid table entry {descriptor} in {path}: {message}")]
    InvalidEntry {
        path: PathBuf,
        descriptor: Descriptor,
        message: String,
    },

    #[error("sequence descriptor {descriptor} is not defined in table version {version}")]
    UnknownSequence { descriptor: Descriptor, version: u8 },

    #[error("sequence expansion of {descriptor} exceeds nesting depth {limit}")]
    SequenceTooDeep { descriptor: Descriptor, limit: usize },
}

impl TablesError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn csv(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Csv {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TablesError>;
