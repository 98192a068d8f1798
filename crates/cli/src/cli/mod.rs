pub mod config;
pub mod expr;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

/// cadence: evaluate cron, hybrid and EOD/SOD expressions.
#[derive(Debug, Parser)]
#[command(name = "cadence", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Classify an expression and print its canonical form.
    Parse {
        expression: String,
        /// Print the parsed value as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Print the next occurrence(s) after a reference instant.
    Next {
        expression: String,
        /// Reference instant (RFC 3339).  Defaults to now.
        #[arg(long, value_parser = parse_instant)]
        from: Option<DateTime<Utc>>,
        /// Number of occurrences to list.
        #[arg(long, default_value_t = 1)]
        count: usize,
    },
    /// Print the latest occurrence before a reference instant.
    Prev {
        expression: String,
        /// Reference instant (RFC 3339).  Defaults to now.
        #[arg(long, value_parser = parse_instant)]
        from: Option<DateTime<Utc>>,
    },
    /// Check whether an instant matches the expression.
    Match {
        expression: String,
        /// Instant to test (RFC 3339).
        #[arg(long, value_parser = parse_instant)]
        at: DateTime<Utc>,
    },
    /// Print the end-of-session instant for a firing.
    End {
        expression: String,
        /// Firing instant (RFC 3339).
        #[arg(long, value_parser = parse_instant)]
        at: DateTime<Utc>,
    },
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Print version information.
    Version,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

/// Parse an RFC 3339 timestamp into UTC.
pub fn parse_instant(text: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("expected an RFC 3339 timestamp like 2024-01-15T10:00:00Z: {e}"))
}

// ── Config loading helper ─────────────────────────────────────────────

/// Load the configuration from the path specified by `CADENCE_CONFIG` (or
/// `cadence.toml` by default).  Returns the parsed [`Config`] and the path
/// that was used.  A missing file yields the defaults.
///
/// [`Config`]: cd_domain::config::Config
pub fn load_config() -> anyhow::Result<(cd_domain::config::Config, String)> {
    let config_path =
        std::env::var("CADENCE_CONFIG").unwrap_or_else(|_| "cadence.toml".into());
    let config = load_config_from(&config_path)?;
    Ok((config, config_path))
}

pub fn load_config_from(config_path: &str) -> anyhow::Result<cd_domain::config::Config> {
    if !std::path::Path::new(config_path).exists() {
        return Ok(cd_domain::config::Config::default());
    }
    let raw = std::fs::read_to_string(config_path)
        .map_err(|e| anyhow::anyhow!("reading {config_path}: {e}"))?;
    toml::from_str(&raw).map_err(|e| anyhow::anyhow!("parsing {config_path}: {e}"))
}
