/// Failures of the EOD/SOD duration grammar.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DurationError {
    #[error("empty duration expression")]
    EmptyExpression,

    #[error("duration must start with 'E' or 'S', got: {0}")]
    InvalidPrefix(String),

    #[error("no duration units found in: {0}")]
    NoDurationUnits(String),

    #[error("invalid number: {0}")]
    InvalidNumber(String),

    #[error("unknown duration unit: {0}")]
    UnknownUnit(String),

    #[error("duration has no magnitude, anchor, or event: {0}")]
    EmptyDuration(String),
}

/// Error type shared by the parser, the occurrence engine and the façade.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("empty expression")]
    EmptyExpression,

    #[error("expected 5, 6, or 7 cron fields, got {found}")]
    InvalidFieldCount { found: usize },

    #[error("unknown extension: {0}")]
    UnknownExtension(String),

    #[error("ambiguous expression: {0}")]
    AmbiguousExpression(String),

    #[error("{field}: {reason}")]
    InvalidField { field: String, reason: String },

    #[error("invalid timezone: '{0}' (use IANA names like 'America/New_York' or 'UTC')")]
    InvalidTimezone(String),

    #[error("invalid EOD clause: {0}")]
    InvalidEod(#[source] DurationError),

    #[error("duration: {0}")]
    Duration(#[from] DurationError),

    #[error("no occurrence found within {horizon_years} year(s)")]
    SearchExhausted { horizon_years: u32 },

    #[error("schedule {0} fires on an external event, not on the calendar")]
    NotCalendarTriggered(String),
}

impl Error {
    /// Build an [`Error::InvalidField`] for `field`.
    pub fn invalid_field(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// True for malformed-input errors; false when a valid schedule has no
    /// calendar occurrence.
    pub fn is_parse_error(&self) -> bool {
        !matches!(self, Self::SearchExhausted { .. } | Self::NotCalendarTriggered(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
