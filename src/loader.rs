//! Configuration loading
//!
//! Handles loading configuration from embedded defaults, files, and environment.

use crate::config::AppConfig;
use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};

/// Embedded default configuration (compiled into binary)
pub const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

/// Load configuration from files and environment
pub fn load_config() -> Result<AppConfig> {
    let profile = std::env::var("SHOWRUNNER_ENV").unwrap_or_else(|_| "development".to_string());
    let config = Config::builder()
        // 1. Embedded defaults (always available)
        .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
        // 2. External overrides (optional)
        .add_source(File::with_name(&format!("config/{profile}")).required(false))
        .add_source(File::with_name("config/local").required(false))
        // 3. Environment variables (highest priority), e.g. SHOWRUNNER_API__BASE_URL
        .add_source(
            Environment::with_prefix("SHOWRUNNER")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    config
        .try_deserialize()
        .context("Failed to deserialize configuration")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_defaults_deserialize() {
        let config: AppConfig = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.realtime.reconnect_attempts, 5);
        assert_eq!(config.workflow.phase_poll_secs, 10);
        assert_eq!(config.workflow.full_poll_secs, 30);
        assert_eq!(config.ui.toast_duration_ms, 5000);
        assert_eq!(config.environment.recheck_secs, 30);
    }

    #[test]
    fn test_missing_sections_fall_back_to_defaults() {
        let config: AppConfig = Config::builder()
            .add_source(File::from_str(
                "[workflow]\nmax_run_secs = 0\n",
                FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.workflow.max_run(), None);
        assert_eq!(config.workflow.phase_poll_secs, 10);
        assert_eq!(config.api.base_url, "http://localhost:8055");
    }
}
