use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Occurrence engine configuration
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Upper bound accepted for [`EngineConfig::search_horizon_years`].
pub const MAX_SEARCH_HORIZON_YEARS: u32 = 400;

/// Settings for the forward/backward occurrence search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// How far past the reference instant a search may run before it gives
    /// up with `SearchExhausted`.  Clamped to `1..=400`.
    ///
    /// Ten years covers leap-day schedules across a skipped century leap
    /// year (e.g. Feb 29 searched from 2097 lands in 2104).
    #[serde(default = "d_search_horizon_years")]
    pub search_horizon_years: u32,

    /// Timezone used for schedules that carry no `TZ:` clause.
    #[serde(default = "d_default_timezone")]
    pub default_timezone: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            search_horizon_years: d_search_horizon_years(),
            default_timezone: d_default_timezone(),
        }
    }
}

impl EngineConfig {
    /// Clamp `search_horizon_years` to the allowed range.
    pub fn clamped(&self) -> Self {
        Self {
            search_horizon_years: self
                .search_horizon_years
                .clamp(1, MAX_SEARCH_HORIZON_YEARS),
            default_timezone: self.default_timezone.clone(),
        }
    }
}

fn d_search_horizon_years() -> u32 {
    10
}

fn d_default_timezone() -> String {
    "UTC".into()
}
