//! Error types for showrunner-realtime

use thiserror::Error;

/// Realtime channel error type
#[derive(Debug, Error)]
pub enum Error {
    /// Handshake with the realtime endpoint failed
    #[error("connection failed: {0}")]
    Connect(String),

    /// Endpoint URL could not be parsed or has an unsupported scheme
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// Frame could not be encoded or decoded
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Connection is gone
    #[error("channel closed")]
    Closed,
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Protocol(err.to_string())
    }
}

impl From<showrunner_core::Error> for Error {
    fn from(err: showrunner_core::Error) -> Self {
        Self::Protocol(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
