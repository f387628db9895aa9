//! Realtime channel configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default realtime endpoint
const DEFAULT_URL: &str = "ws://localhost:8055/ws";

/// Reconnect attempts after the first failure
const DEFAULT_RECONNECT_ATTEMPTS: u32 = 5;

/// Delay between reconnect attempts in milliseconds
const DEFAULT_RECONNECT_DELAY_MS: u64 = 1000;

/// Per-connection frame buffer
const DEFAULT_EVENT_BUFFER: usize = 64;

/// Realtime channel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Endpoint URL; `http(s)` is rewritten to `ws(s)`
    #[serde(default = "default_url")]
    pub url: String,
    /// Reconnect attempts after a failed handshake before giving up
    #[serde(default = "default_reconnect_attempts")]
    pub reconnect_attempts: u32,
    /// Fixed delay between attempts in milliseconds
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
    /// Frames buffered in each direction
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

fn default_url() -> String {
    DEFAULT_URL.to_string()
}

fn default_reconnect_attempts() -> u32 {
    DEFAULT_RECONNECT_ATTEMPTS
}

fn default_reconnect_delay_ms() -> u64 {
    DEFAULT_RECONNECT_DELAY_MS
}

fn default_event_buffer() -> usize {
    DEFAULT_EVENT_BUFFER
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            reconnect_attempts: default_reconnect_attempts(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            event_buffer: default_event_buffer(),
        }
    }
}

impl RealtimeConfig {
    /// Create with endpoint URL
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Set reconnect attempts
    #[must_use]
    pub fn with_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.reconnect_attempts = attempts;
        self
    }

    /// Set reconnect delay
    #[must_use]
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Delay between reconnect attempts
    #[must_use]
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}
