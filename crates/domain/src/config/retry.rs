use std::time::Duration;

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Job retry options
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Retry behaviour applied to a managed job at registration time.
///
/// The engine never retries anything itself; this struct is carried for the
/// job-orchestration layer that consumes the schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RetryOptions {
    /// Maximum number of retries after a failed run.  `0` disables retries.
    #[serde(default)]
    pub max_retries: u32,
    /// Wait between attempts, in milliseconds.
    #[serde(default)]
    pub retry_delay_ms: u64,
}

impl RetryOptions {
    pub fn new(max_retries: u32, retry_delay: Duration) -> Self {
        Self {
            max_retries,
            retry_delay_ms: u64::try_from(retry_delay.as_millis()).unwrap_or(u64::MAX),
        }
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Whether another attempt is allowed after `attempts_made` retries.
    pub fn allows_retry(&self, attempts_made: u32) -> bool {
        attempts_made < self.max_retries
    }
}
