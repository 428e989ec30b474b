//! Error types for the filter engine.

use thiserror::Error;

/// Main error type for engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid library document: {0}")]
    InvalidLibrary(String),

    #[error("Unsupported value for field `{field}` of entry `{key}`: {reason}")]
    InvalidField {
        key: String,
        field: String,
        reason: String,
    },

    #[error("Criterion field must be non-empty")]
    EmptyField,

    #[error("Criterion already registered for field: {0}")]
    CriterionExists(String),

    #[error("Invalid range `{0}`: expected \"lo-hi\" with numeric bounds")]
    InvalidRange(String),
}

impl From<serde_json::Error> for EngineError {
    fn from(e: serde_json::Error) -> Self {
        EngineError::InvalidLibrary(e.to_string())
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
