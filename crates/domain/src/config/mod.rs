mod engine;
mod observability;
mod retry;

pub use engine::*;
pub use observability::*;
pub use retry::*;

use serde::{Deserialize, Serialize};
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub retry: RetryOptions,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl Config {
    /// Check the configuration for values that are out of range or
    /// suspicious. Timezone names are checked by the engine itself since
    /// this crate does not carry the tz database.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.engine.search_horizon_years == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "engine.search_horizon_years".into(),
                message: "search horizon must be at least 1 year".into(),
            });
        } else if self.engine.search_horizon_years > MAX_SEARCH_HORIZON_YEARS {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "engine.search_horizon_years".into(),
                message: format!(
                    "search horizon is clamped to {MAX_SEARCH_HORIZON_YEARS} years"
                ),
            });
        }

        if self.engine.default_timezone.trim().is_empty() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "engine.default_timezone".into(),
                message: "default timezone must not be empty".into(),
            });
        }

        if self.retry.max_retries > 0 && self.retry.retry_delay_ms == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "retry.retry_delay_ms".into(),
                message: "retries are enabled with no delay between attempts".into(),
            });
        }

        errors
    }
}
