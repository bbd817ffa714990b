//! Error types for the property store.

use serde_json::Value;
use thiserror::Error;

/// Main error type for property operations.
#[derive(Debug, Error)]
pub enum PropertyError {
    #[error("Property not found: {0}")]
    NotFound(String),

    #[error("Property not accessible through this filter: {0}")]
    KeyRejected(String),

    #[error("Invalid value for property \"{key}\": \"{value}\"")]
    ValidationFailed { key: String, value: Value },

    #[error("Property \"{0}\" is not writeable")]
    WriteProtected(String),

    #[error("Structural error: {0}")]
    Structural(String),

    #[error("Unknown validator: {0}")]
    UnknownValidator(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

impl From<serde_json::Error> for PropertyError {
    fn from(e: serde_json::Error) -> Self {
        PropertyError::Deserialization(e.to_string())
    }
}

impl From<regex::Error> for PropertyError {
    fn from(e: regex::Error) -> Self {
        PropertyError::InvalidPattern(e.to_string())
    }
}

/// Result type for property operations.
pub type Result<T> = std::result::Result<T, PropertyError>;
