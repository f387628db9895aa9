//! Workflow timing configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Phase run poll interval in seconds
const DEFAULT_PHASE_POLL_SECS: u64 = 10;

/// Full workflow poll interval in seconds
const DEFAULT_FULL_POLL_SECS: u64 = 30;

/// Longest a run may stay active, in seconds
const DEFAULT_MAX_RUN_SECS: u64 = 3600;

/// Workflow timing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Poll interval while a single phase runs
    #[serde(default = "default_phase_poll_secs")]
    pub phase_poll_secs: u64,
    /// Poll interval while the full workflow runs
    #[serde(default = "default_full_poll_secs")]
    pub full_poll_secs: u64,
    /// Run deadline; 0 waits forever
    #[serde(default = "default_max_run_secs")]
    pub max_run_secs: u64,
}

fn default_phase_poll_secs() -> u64 {
    DEFAULT_PHASE_POLL_SECS
}

fn default_full_poll_secs() -> u64 {
    DEFAULT_FULL_POLL_SECS
}

fn default_max_run_secs() -> u64 {
    DEFAULT_MAX_RUN_SECS
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            phase_poll_secs: default_phase_poll_secs(),
            full_poll_secs: default_full_poll_secs(),
            max_run_secs: default_max_run_secs(),
        }
    }
}

impl WorkflowConfig {
    /// Set the run deadline; `None` waits forever
    #[must_use]
    pub fn with_max_run(mut self, max_run: Option<Duration>) -> Self {
        self.max_run_secs = max_run.map_or(0, |d| d.as_secs().max(1));
        self
    }

    /// Poll interval for single phase runs
    #[must_use]
    pub fn phase_poll_interval(&self) -> Duration {
        Duration::from_secs(self.phase_poll_secs.max(1))
    }

    /// Poll interval for full workflow runs
    #[must_use]
    pub fn full_poll_interval(&self) -> Duration {
        Duration::from_secs(self.full_poll_secs.max(1))
    }

    /// Run deadline, if any
    #[must_use]
    pub fn max_run(&self) -> Option<Duration> {
        (self.max_run_secs > 0).then(|| Duration::from_secs(self.max_run_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WorkflowConfig::default();
        assert_eq!(config.phase_poll_interval(), Duration::from_secs(10));
        assert_eq!(config.full_poll_interval(), Duration::from_secs(30));
        assert_eq!(config.max_run(), Some(Duration::from_secs(3600)));
    }

    #[test]
    fn test_zero_deadline_is_unbounded() {
        let config = WorkflowConfig::default().with_max_run(None);
        assert_eq!(config.max_run_secs, 0);
        assert!(config.max_run().is_none());
    }
}
