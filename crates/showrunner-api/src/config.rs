//! REST client configuration

use serde::{Deserialize, Serialize};

/// Default REST base URL
const DEFAULT_BASE_URL: &str = "http://localhost:8055";

/// Default request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// REST client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Backend base URL (default: http://localhost:8055)
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds. Generation actions get no client deadline.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Optional bearer token
    #[serde(default)]
    pub auth_token: Option<String>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            auth_token: None,
        }
    }
}

impl ApiConfig {
    /// Create with base URL
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set bearer token
    #[must_use]
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }
}
