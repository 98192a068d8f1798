use std::fmt;

use cd_domain::{Error, Result};
use cd_duration::EndOfDuration;
use serde::{Deserialize, Serialize};

use crate::field::FieldKind;
use crate::validation::{validate_field, validate_timezone};

/// Marker for schedules that fire on an external event instead of the
/// calendar.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Special {
    /// `@reboot`: fires once when the hosting process starts.
    Reboot,
}

/// A parsed trigger: cron fields plus optional week-of-year, timezone and
/// end-of-duration bound.
///
/// Every present field holds normalised, validated text; `None` means
/// unconstrained.  Values are immutable; the `with_*` helpers return a
/// re-validated copy.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "ScheduleRepr")]
pub struct Schedule {
    #[serde(skip_serializing_if = "Option::is_none")]
    second: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    minute: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hour: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    day_of_month: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    month: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    day_of_week: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    year: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    week_of_year: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timezone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    end_of_duration: Option<EndOfDuration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    special: Option<Special>,
}

impl Schedule {
    /// Build a schedule from the six base fields, validating each one.
    pub fn from_fields(
        second: &str,
        minute: &str,
        hour: &str,
        day_of_month: &str,
        month: &str,
        day_of_week: &str,
    ) -> Result<Self> {
        Ok(Self {
            second: Some(validate_field(FieldKind::Second, second)?),
            minute: Some(validate_field(FieldKind::Minute, minute)?),
            hour: Some(validate_field(FieldKind::Hour, hour)?),
            day_of_month: Some(validate_field(FieldKind::DayOfMonth, day_of_month)?),
            month: Some(validate_field(FieldKind::Month, month)?),
            day_of_week: Some(validate_field(FieldKind::DayOfWeek, day_of_week)?),
            ..Self::default()
        })
    }

    /// The `@reboot` schedule: no calendar fields, only the marker.
    pub fn reboot() -> Self {
        Self {
            special: Some(Special::Reboot),
            ..Self::default()
        }
    }

    pub fn second(&self) -> Option<&str> {
        self.second.as_deref()
    }

    pub fn minute(&self) -> Option<&str> {
        self.minute.as_deref()
    }

    pub fn hour(&self) -> Option<&str> {
        self.hour.as_deref()
    }

    pub fn day_of_month(&self) -> Option<&str> {
        self.day_of_month.as_deref()
    }

    pub fn month(&self) -> Option<&str> {
        self.month.as_deref()
    }

    pub fn day_of_week(&self) -> Option<&str> {
        self.day_of_week.as_deref()
    }

    pub fn year(&self) -> Option<&str> {
        self.year.as_deref()
    }

    pub fn week_of_year(&self) -> Option<&str> {
        self.week_of_year.as_deref()
    }

    pub fn timezone(&self) -> Option<&str> {
        self.timezone.as_deref()
    }

    pub fn end_of_duration(&self) -> Option<&EndOfDuration> {
        self.end_of_duration.as_ref()
    }

    pub fn special(&self) -> Option<Special> {
        self.special
    }

    /// Field text for `kind`, if constrained.
    pub fn field(&self, kind: FieldKind) -> Option<&str> {
        match kind {
            FieldKind::Second => self.second(),
            FieldKind::Minute => self.minute(),
            FieldKind::Hour => self.hour(),
            FieldKind::DayOfMonth => self.day_of_month(),
            FieldKind::Month => self.month(),
            FieldKind::DayOfWeek => self.day_of_week(),
            FieldKind::Year => self.year(),
            FieldKind::WeekOfYear => self.week_of_year(),
        }
    }

    pub fn with_week_of_year(mut self, value: &str) -> Result<Self> {
        self.week_of_year = Some(validate_field(FieldKind::WeekOfYear, value)?);
        Ok(self)
    }

    pub fn with_year(mut self, value: &str) -> Result<Self> {
        self.year = Some(validate_field(FieldKind::Year, value)?);
        Ok(self)
    }

    pub fn with_timezone(mut self, name: &str) -> Result<Self> {
        validate_timezone(name)?;
        self.timezone = Some(name.to_string());
        Ok(self)
    }

    pub fn with_end_of_duration(mut self, eod: EndOfDuration) -> Self {
        self.end_of_duration = Some(eod);
        self
    }

    /// Six base fields (unset as `*`), optional year, then `WOY:`, `TZ:`,
    /// `EOD:` in that order.  `@reboot` renders as itself.
    pub fn to_canonical_string(&self) -> String {
        if self.special == Some(Special::Reboot) {
            return "@reboot".to_string();
        }
        let mut parts: Vec<String> = [
            &self.second,
            &self.minute,
            &self.hour,
            &self.day_of_month,
            &self.month,
            &self.day_of_week,
        ]
        .iter()
        .map(|f| f.as_deref().unwrap_or("*").to_string())
        .collect();
        if let Some(year) = &self.year {
            parts.push(year.clone());
        }
        if let Some(woy) = &self.week_of_year {
            parts.push(format!("WOY:{woy}"));
        }
        if let Some(tz) = &self.timezone {
            parts.push(format!("TZ:{tz}"));
        }
        if let Some(eod) = &self.end_of_duration {
            parts.push(format!("EOD:{eod}"));
        }
        parts.join(" ")
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_canonical_string())
    }
}

// ── Deserialization ────────────────────────────────────────────────

/// Wire shape of [`Schedule`]; converted through validation so a
/// deserialized schedule is as trustworthy as a parsed one.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScheduleRepr {
    #[serde(default)]
    second: Option<String>,
    #[serde(default)]
    minute: Option<String>,
    #[serde(default)]
    hour: Option<String>,
    #[serde(default)]
    day_of_month: Option<String>,
    #[serde(default)]
    month: Option<String>,
    #[serde(default)]
    day_of_week: Option<String>,
    #[serde(default)]
    year: Option<String>,
    #[serde(default)]
    week_of_year: Option<String>,
    #[serde(default)]
    timezone: Option<String>,
    #[serde(default)]
    end_of_duration: Option<EndOfDuration>,
    #[serde(default)]
    special: Option<Special>,
}

impl TryFrom<ScheduleRepr> for Schedule {
    type Error = Error;

    fn try_from(repr: ScheduleRepr) -> Result<Self> {
        let check = |kind: FieldKind, value: Option<String>| -> Result<Option<String>> {
            value.map(|v| validate_field(kind, &v)).transpose()
        };
        if let Some(tz) = &repr.timezone {
            validate_timezone(tz)?;
        }
        Ok(Self {
            second: check(FieldKind::Second, repr.second)?,
            minute: check(FieldKind::Minute, repr.minute)?,
            hour: check(FieldKind::Hour, repr.hour)?,
            day_of_month: check(FieldKind::DayOfMonth, repr.day_of_month)?,
            month: check(FieldKind::Month, repr.month)?,
            day_of_week: check(FieldKind::DayOfWeek, repr.day_of_week)?,
            year: check(FieldKind::Year, repr.year)?,
            week_of_year: check(FieldKind::WeekOfYear, repr.week_of_year)?,
            timezone: repr.timezone,
            end_of_duration: repr.end_of_duration,
            special: repr.special,
        })
    }
}
