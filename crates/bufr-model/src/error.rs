use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid descriptor '{raw}': {message}")]
    InvalidDescriptor { raw: String, message: String },
}

impl ModelError {
    pub(crate) fn invalid_descriptor(raw: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidDescriptor {
            raw: raw.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ModelError>;
