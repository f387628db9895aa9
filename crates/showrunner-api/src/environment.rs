//! Backend deployment mode

use serde::{Deserialize, Serialize};
use std::fmt;

/// Response header carrying the deployment mode
pub const ENVIRONMENT_HEADER: &str = "x-environment-mode";

/// Whether the backend talks to real services or test doubles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentMode {
    /// Mock services; the safe default
    #[default]
    Test,
    /// Real services
    Production,
}

impl EnvironmentMode {
    /// Interpret the header value. Missing or unknown values read as test.
    #[must_use]
    pub fn from_header(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("production") | Some("prod") => Self::Production,
            _ => Self::Test,
        }
    }

    /// Lowercase name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Test => "test",
            Self::Production => "production",
        }
    }

    /// Indicator text
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Test => "TEST MODE",
            Self::Production => "PRODUCTION MODE",
        }
    }

    /// Indicator icon; production carries a warning
    #[must_use]
    pub fn marker(self) -> &'static str {
        match self {
            Self::Test => "\u{2705}",
            Self::Production => "\u{1f6a8}",
        }
    }

    /// Whether real services are in use
    #[must_use]
    pub fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

impl fmt::Display for EnvironmentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
