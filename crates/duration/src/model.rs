//! EOD/SOD data model and its canonical rendering.

use std::fmt;

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Reference point
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Where a duration is measured from (additive) or snapped to (anchored).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferencePoint {
    /// Additive, start-of-duration form (`S8H`).
    Start,
    /// Additive, end-of-duration form (`E8H`).
    #[default]
    End,
    Day,
    /// ISO week, Monday to Sunday.
    Week,
    Month,
    Quarter,
    Year,
}

impl ReferencePoint {
    /// Anchored reference points snap to a period boundary; `Start` and
    /// `End` only add.
    pub fn is_anchored(self) -> bool {
        !matches!(self, Self::Start | Self::End)
    }

    /// Parse a reference-point suffix letter (`D`, `W`, `M`, `Q`, `Y`).
    pub fn from_suffix(letter: char) -> Option<Self> {
        match letter {
            'D' => Some(Self::Day),
            'W' => Some(Self::Week),
            'M' => Some(Self::Month),
            'Q' => Some(Self::Quarter),
            'Y' => Some(Self::Year),
            _ => None,
        }
    }

    /// The suffix letter for anchored reference points.
    pub fn suffix(self) -> Option<char> {
        match self {
            Self::Day => Some('D'),
            Self::Week => Some('W'),
            Self::Month => Some('M'),
            Self::Quarter => Some('Q'),
            Self::Year => Some('Y'),
            Self::Start | Self::End => None,
        }
    }
}

impl fmt::Display for ReferencePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Start => "START",
            Self::End => "END",
            Self::Day => "DAY",
            Self::Week => "WEEK",
            Self::Month => "MONTH",
            Self::Quarter => "QUARTER",
            Self::Year => "YEAR",
        };
        write!(f, "{s}")
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// EndOfDuration
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A duration anchored to a reference point.
///
/// With an anchored reference point the magnitude of the matching unit is a
/// 0-based count of periods to advance (`E0W` = end of this week, `E1W` =
/// end of next week); `Quarter` counts quarters through `months`.  All other
/// magnitudes are added before the anchor is advanced.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EndOfDuration {
    pub years: u32,
    pub months: u32,
    pub weeks: u32,
    pub days: u32,
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
    pub reference_point: ReferencePoint,
    /// `true` for start-of-duration (`S…`), `false` for end-of-duration (`E…`).
    pub is_sod: bool,
    /// Event name for `E[name]` termination, resolved outside this crate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
}

impl EndOfDuration {
    /// An end-of-duration value with no magnitudes yet.
    pub fn end(reference_point: ReferencePoint) -> Self {
        let reference_point = match reference_point {
            ReferencePoint::Start => ReferencePoint::End,
            other => other,
        };
        Self {
            reference_point,
            is_sod: false,
            ..Self::default()
        }
    }

    /// A start-of-duration value with no magnitudes yet.
    pub fn start(reference_point: ReferencePoint) -> Self {
        let reference_point = match reference_point {
            ReferencePoint::End => ReferencePoint::Start,
            other => other,
        };
        Self {
            reference_point,
            is_sod: true,
            ..Self::default()
        }
    }

    pub fn years(mut self, years: u32) -> Self {
        self.years = years;
        self
    }

    pub fn months(mut self, months: u32) -> Self {
        self.months = months;
        self
    }

    pub fn weeks(mut self, weeks: u32) -> Self {
        self.weeks = weeks;
        self
    }

    pub fn days(mut self, days: u32) -> Self {
        self.days = days;
        self
    }

    pub fn hours(mut self, hours: u32) -> Self {
        self.hours = hours;
        self
    }

    pub fn minutes(mut self, minutes: u32) -> Self {
        self.minutes = minutes;
        self
    }

    pub fn seconds(mut self, seconds: u32) -> Self {
        self.seconds = seconds;
        self
    }

    pub fn event(mut self, name: impl Into<String>) -> Self {
        self.event = Some(name.into());
        self
    }

    /// True when at least one magnitude is non-zero.
    pub fn has_duration(&self) -> bool {
        self.years > 0
            || self.months > 0
            || self.weeks > 0
            || self.days > 0
            || self.hours > 0
            || self.minutes > 0
            || self.seconds > 0
    }

    /// An event-only value: no anchor and nothing to add.  Such a value
    /// cannot produce an instant on its own; the event must be resolved by
    /// the caller.
    pub fn requires_event_resolution(&self) -> bool {
        self.event.is_some() && !self.has_duration() && !self.reference_point.is_anchored()
    }

    /// The 0-based period offset used by anchored reference points.
    pub fn anchor_offset(&self) -> u32 {
        match self.reference_point {
            ReferencePoint::Day => self.days,
            ReferencePoint::Week => self.weeks,
            ReferencePoint::Month | ReferencePoint::Quarter => self.months,
            ReferencePoint::Year => self.years,
            ReferencePoint::Start | ReferencePoint::End => 0,
        }
    }

    /// Rough length of the magnitudes (30-day months, 365-day years).
    /// For display and sorting only; evaluation uses calendar arithmetic.
    pub fn approx_duration(&self) -> chrono::Duration {
        let days = i64::from(self.days)
            + i64::from(self.weeks) * 7
            + i64::from(self.months) * 30
            + i64::from(self.years) * 365;
        chrono::Duration::days(days)
            + chrono::Duration::hours(i64::from(self.hours))
            + chrono::Duration::minutes(i64::from(self.minutes))
            + chrono::Duration::seconds(i64::from(self.seconds))
    }

    /// Compact `S`/`E` notation, units ordered `Y M W D (T) H M S`.
    ///
    /// A reference suffix is appended only when the leading unit would not
    /// imply the stored reference point.  Additive values whose leading
    /// unit is a calendar unit have no suffix form and re-parse as anchored.
    pub fn to_canonical_string(&self) -> String {
        let mut out = String::new();
        out.push(if self.is_sod { 'S' } else { 'E' });

        let mut date = String::new();
        let mut first_unit: Option<char> = None;
        for (value, letter) in [
            (self.years, 'Y'),
            (self.months, 'M'),
            (self.weeks, 'W'),
            (self.days, 'D'),
        ] {
            if value > 0 {
                first_unit.get_or_insert(letter);
                date.push_str(&format!("{value}{letter}"));
            }
        }

        let mut time = String::new();
        let separated = !date.is_empty();
        if self.hours > 0 {
            time.push_str(&format!("{}H", self.hours));
        }
        if self.minutes > 0 {
            let letter = if separated || self.hours > 0 { 'M' } else { 'm' };
            time.push_str(&format!("{}{letter}", self.minutes));
        }
        if self.seconds > 0 {
            time.push_str(&format!("{}S", self.seconds));
        }
        if first_unit.is_none() && !time.is_empty() {
            first_unit = Some('H');
        }

        out.push_str(&date);
        if separated && !time.is_empty() {
            out.push('T');
        }
        out.push_str(&time);

        if first_unit.is_none() {
            let letter = match self.reference_point {
                ReferencePoint::Day => 'D',
                ReferencePoint::Week => 'W',
                ReferencePoint::Month | ReferencePoint::Quarter => 'M',
                ReferencePoint::Year => 'Y',
                ReferencePoint::Start | ReferencePoint::End => 'S',
            };
            out.push('0');
            out.push(letter);
            first_unit = Some(letter);
        }

        let implied = match first_unit {
            Some('Y') => Some(ReferencePoint::Year),
            Some('M') => Some(ReferencePoint::Month),
            Some('W') => Some(ReferencePoint::Week),
            Some('D') => Some(ReferencePoint::Day),
            _ => None,
        };
        if self.reference_point.is_anchored() && implied != Some(self.reference_point) {
            if let Some(suffix) = self.reference_point.suffix() {
                out.push(' ');
                out.push(suffix);
            }
        }

        if let Some(event) = &self.event {
            out.push_str(&format!(" E[{event}]"));
        }
        out
    }
}

impl fmt::Display for EndOfDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_canonical_string())
    }
}

impl std::str::FromStr for EndOfDuration {
    type Err = cd_domain::DurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        crate::parse::parse_duration(s)
    }
}
