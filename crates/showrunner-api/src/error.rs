//! Error types for showrunner-api

use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum Error {
    /// Request never produced a response
    #[error("network error: {0}")]
    Network(String),

    /// Backend answered with a non-success status
    #[error("http {status}: {message}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Message extracted from the response body
        message: String,
    },

    /// Backend rejected the credentials
    #[error("unauthorized")]
    Unauthorized,

    /// Backend accepted the request but reported failure in the body
    #[error("rejected: {0}")]
    Rejected(String),

    /// Response body did not match the expected shape
    #[error("decode error: {0}")]
    Decode(String),

    /// Base URL or path could not be joined
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

impl Error {
    /// Whether retrying the same request may succeed
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Http { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(Error::Network("reset".into()).is_transient());
        assert!(Error::Http {
            status: 503,
            message: "busy".into()
        }
        .is_transient());
        assert!(!Error::Http {
            status: 404,
            message: "missing".into()
        }
        .is_transient());
        assert!(!Error::Unauthorized.is_transient());
    }
}
