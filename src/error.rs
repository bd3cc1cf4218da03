use thiserror::Error;

/// Fatal errors raised by the pipeline.
///
/// Configuration and sequence problems abort before any row is processed.
/// Per-row data-quality issues are not errors: they are collected as
/// [`DataQualityWarning`](crate::models::pv::DataQualityWarning)s next to
/// the results.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("invalid sequence: {0}")]
    InvalidSequence(String),

    #[error("invalid input at row {row}: {message}")]
    InvalidInput { row: usize, message: String },
}

impl ModelError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        ModelError::InvalidConfiguration(msg.into())
    }

    pub(crate) fn sequence(msg: impl Into<String>) -> Self {
        ModelError::InvalidSequence(msg.into())
    }

    /// Short machine-readable tag, used in API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            ModelError::InvalidConfiguration(_) => "InvalidConfiguration",
            ModelError::InvalidSequence(_) => "InvalidSequence",
            ModelError::InvalidInput { .. } => "InvalidInput",
        }
    }
}

pub type Result<T> = std::result::Result<T, ModelError>;
