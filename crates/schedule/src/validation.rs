//! Input validation for schedule fields and timezones.

use cd_domain::{Error, Result};

use crate::field::{FieldExpr, FieldKind};

/// Validate an IANA timezone string and return the resolved zone.
pub fn validate_timezone(tz: &str) -> Result<chrono_tz::Tz> {
    tz.parse::<chrono_tz::Tz>()
        .map_err(|_| Error::InvalidTimezone(tz.to_string()))
}

/// Validate a single field expression and return its normalised text.
pub fn validate_field(kind: FieldKind, text: &str) -> Result<String> {
    FieldExpr::parse(kind, text)
        .map(|f| f.as_str().to_string())
        .map_err(|reason| Error::invalid_field(kind.name(), reason))
}

/// Validate a 5/6/7-field cron expression without building a schedule.
pub fn validate_cron(cron: &str) -> Result<()> {
    crate::parser::parse_cron_only(cron).map(|_| ())
}
