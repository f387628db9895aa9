//! Error types for showrunner-core

use thiserror::Error;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// A payload could not be decoded into a domain type
    #[error("decode error: {0}")]
    Decode(String),

    /// A value was outside its allowed range
    #[error("invalid value for {field}: {message}")]
    InvalidValue {
        /// Field name
        field: String,
        /// Detailed message
        message: String,
    },
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
