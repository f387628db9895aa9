//! Application configuration types
//!
//! One section per crate plus the console-only settings.

use serde::{Deserialize, Serialize};
use showrunner_api::ApiConfig;
use showrunner_realtime::RealtimeConfig;
use showrunner_workflow::WorkflowConfig;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub realtime: RealtimeConfig,
    #[serde(default)]
    pub workflow: WorkflowConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub environment: EnvironmentConfig,
}

/// Toast settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_toast_duration_ms")]
    pub toast_duration_ms: u64,
}

fn default_toast_duration_ms() -> u64 {
    5000
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            toast_duration_ms: default_toast_duration_ms(),
        }
    }
}

impl UiConfig {
    pub fn toast_duration(&self) -> Duration {
        Duration::from_millis(self.toast_duration_ms)
    }
}

/// Environment indicator settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// Seconds between probes of the backend mode
    #[serde(default = "default_recheck_secs")]
    pub recheck_secs: u64,
}

fn default_recheck_secs() -> u64 {
    30
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            recheck_secs: default_recheck_secs(),
        }
    }
}

impl EnvironmentConfig {
    pub fn recheck_interval(&self) -> Duration {
        Duration::from_secs(self.recheck_secs.max(1))
    }
}
