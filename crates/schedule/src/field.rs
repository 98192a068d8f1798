//! Cron field expressions compiled to membership tests.
//!
//! Supported per term: `*`, `?`, `n`, `a-b`, `*/n`, `a/n`, `a-b/n`, plus
//! `L` (last day) in day-of-month and `nL` / `n#k` in day-of-week.  Month
//! and weekday names are accepted case-insensitively.

use chrono::{Datelike, NaiveDate};
use cd_duration::calendar;
use serde::{Deserialize, Serialize};

const MONTH_NAMES: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];
const WEEKDAY_NAMES: [&str; 7] = ["SUN", "MON", "TUE", "WED", "THU", "FRI", "SAT"];

/// Which schedule field an expression constrains.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Second,
    Minute,
    Hour,
    DayOfMonth,
    Month,
    DayOfWeek,
    Year,
    WeekOfYear,
}

impl FieldKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Second => "second",
            Self::Minute => "minute",
            Self::Hour => "hour",
            Self::DayOfMonth => "day-of-month",
            Self::Month => "month",
            Self::DayOfWeek => "day-of-week",
            Self::Year => "year",
            Self::WeekOfYear => "week-of-year",
        }
    }

    /// Inclusive value bounds.  Day-of-week accepts `7` as Sunday.
    pub fn bounds(self) -> (u32, u32) {
        match self {
            Self::Second | Self::Minute => (0, 59),
            Self::Hour => (0, 23),
            Self::DayOfMonth => (1, 31),
            Self::Month => (1, 12),
            Self::DayOfWeek => (0, 7),
            Self::Year => (1970, 9999),
            Self::WeekOfYear => (1, 53),
        }
    }

    fn names(self) -> Option<(&'static [&'static str], u32)> {
        match self {
            Self::Month => Some((&MONTH_NAMES, 1)),
            Self::DayOfWeek => Some((&WEEKDAY_NAMES, 0)),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Term {
    Range { start: u32, end: u32, step: u32 },
    /// `L` in day-of-month.
    LastDay,
    /// `nL` in day-of-week: the last weekday `n` of the month.
    LastWeekday(u32),
    /// `n#k` in day-of-week: the `k`-th weekday `n` of the month.
    NthWeekday { weekday: u32, nth: u32 },
}

impl Term {
    fn contains(&self, value: u32) -> bool {
        match *self {
            Term::Range { start, end, step } => {
                value >= start && value <= end && (value - start) % step == 0
            }
            _ => false,
        }
    }

    fn contains_day(&self, date: NaiveDate) -> bool {
        let weekday = date.weekday().num_days_from_sunday();
        match *self {
            Term::Range { .. } => false,
            Term::LastDay => date == calendar::last_day_of_month(date),
            Term::LastWeekday(n) => {
                n % 7 == weekday && date.day() + 7 > calendar::last_day_of_month(date).day()
            }
            Term::NthWeekday { weekday: n, nth } => {
                n % 7 == weekday && (date.day() - 1) / 7 + 1 == nth
            }
        }
    }
}

/// A compiled field expression.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldExpr {
    kind: FieldKind,
    terms: Vec<Term>,
    wildcard: bool,
    source: String,
}

impl FieldExpr {
    /// Parse and validate `text` for `kind`.  On failure the message names the
    /// offending part; callers attach the field name.
    pub fn parse(kind: FieldKind, text: &str) -> Result<Self, String> {
        let source = substitute_names(kind, text.trim());
        if source.is_empty() {
            return Err("empty field".into());
        }
        let wildcard = source == "*" || source == "?";
        if source == "?" && !matches!(kind, FieldKind::DayOfMonth | FieldKind::DayOfWeek) {
            return Err("'?' is only allowed in day-of-month and day-of-week".into());
        }

        let mut terms = Vec::new();
        for part in source.split(',') {
            terms.push(parse_term(kind, part)?);
        }
        Ok(Self {
            kind,
            terms,
            wildcard,
            source,
        })
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Normalised text: names replaced by numbers, whitespace trimmed.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// `*` or `?`; stepped wildcards such as `*/2` count as restricted.
    pub fn is_wildcard(&self) -> bool {
        self.wildcard
    }

    /// Plain numeric membership (ignores calendar-dependent terms).
    pub fn matches(&self, value: u32) -> bool {
        if self.terms.iter().any(|t| t.contains(value)) {
            return true;
        }
        // 7 is an alias for Sunday.
        self.kind == FieldKind::DayOfWeek && value == 0 && self.terms.iter().any(|t| t.contains(7))
    }

    /// Membership for day-of-month / day-of-week, including `L`, `nL`, `n#k`.
    pub fn matches_day(&self, date: NaiveDate) -> bool {
        let value = match self.kind {
            FieldKind::DayOfMonth => date.day(),
            FieldKind::DayOfWeek => date.weekday().num_days_from_sunday(),
            _ => return false,
        };
        self.matches(value) || self.terms.iter().any(|t| t.contains_day(date))
    }

    /// Smallest matching value `>= from`, within the field's bounds.
    pub fn next_value(&self, from: u32) -> Option<u32> {
        let (min, max) = self.kind.bounds();
        (from.max(min)..=max).find(|v| self.matches(*v))
    }

    /// Largest matching value `<= from`, within the field's bounds.
    pub fn prev_value(&self, from: u32) -> Option<u32> {
        let (min, max) = self.kind.bounds();
        if from < min {
            return None;
        }
        (min..=from.min(max)).rev().find(|v| self.matches(*v))
    }
}

fn parse_term(kind: FieldKind, part: &str) -> Result<Term, String> {
    let (min, max) = kind.bounds();
    if part.is_empty() {
        return Err("empty list element".into());
    }

    if kind == FieldKind::DayOfMonth && part == "L" {
        return Ok(Term::LastDay);
    }
    if kind == FieldKind::DayOfWeek {
        if let Some(day) = part.strip_suffix('L') {
            let weekday = parse_number(day, 0, 7)?;
            return Ok(Term::LastWeekday(weekday));
        }
        if let Some((day, nth)) = part.split_once('#') {
            let weekday = parse_number(day, 0, 7)?;
            let nth: u32 = nth
                .parse()
                .map_err(|_| format!("invalid occurrence '{nth}' in '{part}'"))?;
            if !(1..=5).contains(&nth) {
                return Err(format!("occurrence {nth} out of range 1..=5"));
            }
            return Ok(Term::NthWeekday { weekday, nth });
        }
    }

    let (range, step) = match part.split_once('/') {
        Some((range, step)) => {
            let step: u32 = step
                .parse()
                .map_err(|_| format!("invalid step '{step}' - expected a number"))?;
            if step == 0 || step > max {
                return Err(format!("step {step} out of range 1..={max}"));
            }
            (range, Some(step))
        }
        None => (part, None),
    };

    // `7` only stands for Sunday when written; open-ended day-of-week
    // ranges stop at Saturday so a step never lands on it.
    let open_end = if kind == FieldKind::DayOfWeek { 6 } else { max };
    let (start, end) = if range == "*" || range == "?" {
        (min, open_end)
    } else if let Some((start_s, end_s)) = range.split_once('-') {
        let start = parse_number(start_s, min, max)?;
        let end = parse_number(end_s, min, max)?;
        if start > end {
            return Err(format!("range start {start} > end {end}"));
        }
        (start, end)
    } else {
        let value = parse_number(range, min, max)?;
        // `a/n` runs from `a` to the top of the range.
        if step.is_some() && value <= open_end {
            (value, open_end)
        } else {
            (value, value)
        }
    };

    Ok(Term::Range {
        start,
        end,
        step: step.unwrap_or(1),
    })
}

fn parse_number(text: &str, min: u32, max: u32) -> Result<u32, String> {
    let n: u32 = text
        .parse()
        .map_err(|_| format!("invalid value '{text}'"))?;
    if n < min || n > max {
        return Err(format!("value {n} out of range {min}..={max}"));
    }
    Ok(n)
}

/// Replace month / weekday names with their numbers; other text is kept.
fn substitute_names(kind: FieldKind, text: &str) -> String {
    let Some((names, offset)) = kind.names() else {
        return text.to_string();
    };
    let mut out = String::with_capacity(text.len());
    let mut word = String::new();
    let flush = |word: &mut String, out: &mut String| {
        if word.is_empty() {
            return;
        }
        let upper = word.to_ascii_uppercase();
        match names.iter().position(|n| *n == upper) {
            Some(i) => out.push_str(&(i as u32 + offset).to_string()),
            None => out.push_str(word),
        }
        word.clear();
    };
    for c in text.chars() {
        if c.is_ascii_alphabetic() {
            word.push(c);
        } else {
            flush(&mut word, &mut out);
            out.push(c);
        }
    }
    flush(&mut word, &mut out);
    out
}

/// Whether every number in the range parts of `text` lies above the
/// week-of-year range, i.e. the field reads as a list of calendar years.
pub(crate) fn looks_like_years(text: &str) -> bool {
    let mut numbers = text
        .split(',')
        .map(|part| part.split('/').next().unwrap_or(""))
        .flat_map(|range| range.split('-'))
        .filter(|s| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()))
        .map(|s| s.parse::<u32>().unwrap_or(0))
        .peekable();
    numbers.peek().is_some() && numbers.all(|n| n > FieldKind::WeekOfYear.bounds().1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(kind: FieldKind, text: &str) -> FieldExpr {
        FieldExpr::parse(kind, text).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn wildcard_matches_everything() {
        let f = field(FieldKind::Minute, "*");
        assert!(f.is_wildcard());
        assert!((0..60).all(|v| f.matches(v)));
    }

    #[test]
    fn step_from_wildcard() {
        let f = field(FieldKind::Minute, "*/5");
        assert!(!f.is_wildcard());
        assert!(f.matches(0));
        assert!(f.matches(55));
        assert!(!f.matches(3));
    }

    #[test]
    fn step_from_start() {
        let f = field(FieldKind::Hour, "3/6");
        assert!(f.matches(3));
        assert!(f.matches(9));
        assert!(f.matches(21));
        assert!(!f.matches(0));
    }

    #[test]
    fn stepped_range() {
        let f = field(FieldKind::Minute, "10-30/10");
        assert!(f.matches(10) && f.matches(20) && f.matches(30));
        assert!(!f.matches(40));
    }

    #[test]
    fn lists_and_ranges() {
        let f = field(FieldKind::DayOfMonth, "1,15,20-22");
        assert!(f.matches(1) && f.matches(15) && f.matches(21));
        assert!(!f.matches(16));
    }

    #[test]
    fn month_names() {
        let f = field(FieldKind::Month, "jan,MAR-May");
        assert_eq!(f.as_str(), "1,3-5");
        assert!(f.matches(4));
        assert!(!f.matches(2));
    }

    #[test]
    fn weekday_names() {
        let f = field(FieldKind::DayOfWeek, "MON-FRI");
        assert_eq!(f.as_str(), "1-5");
    }

    #[test]
    fn seven_is_sunday() {
        let f = field(FieldKind::DayOfWeek, "7");
        assert!(f.matches(0));
        let f = field(FieldKind::DayOfWeek, "5-7");
        assert!(f.matches(5) && f.matches(6) && f.matches(0));
        assert!(!f.matches(1));
    }

    #[test]
    fn weekday_step_does_not_alias_sunday() {
        let f = field(FieldKind::DayOfWeek, "1/2");
        assert!(f.matches(1) && f.matches(3) && f.matches(5));
        assert!(!f.matches(0));
        assert!(!f.matches_day(date(2024, 1, 7)));
        let f = field(FieldKind::DayOfWeek, "*/2");
        assert!(f.matches(0) && f.matches(6));
        assert!(!f.matches(1));
        // An explicit endpoint of 7 still means Sunday.
        let f = field(FieldKind::DayOfWeek, "1-7/2");
        assert!(f.matches(0));
    }

    #[test]
    fn last_day_of_month() {
        let f = field(FieldKind::DayOfMonth, "L");
        assert!(f.matches_day(date(2024, 2, 29)));
        assert!(!f.matches_day(date(2023, 2, 27)));
        assert!(f.matches_day(date(2023, 2, 28)));
    }

    #[test]
    fn last_weekday_of_month() {
        // Last Friday of March 2024 is the 29th.
        let f = field(FieldKind::DayOfWeek, "5L");
        assert!(f.matches_day(date(2024, 3, 29)));
        assert!(!f.matches_day(date(2024, 3, 22)));
    }

    #[test]
    fn nth_weekday_of_month() {
        // Second Monday of January 2024 is the 8th.
        let f = field(FieldKind::DayOfWeek, "MON#2");
        assert_eq!(f.as_str(), "1#2");
        assert!(f.matches_day(date(2024, 1, 8)));
        assert!(!f.matches_day(date(2024, 1, 1)));
        assert!(!f.matches_day(date(2024, 1, 15)));
    }

    #[test]
    fn next_and_prev_values() {
        let f = field(FieldKind::Minute, "15,45");
        assert_eq!(f.next_value(0), Some(15));
        assert_eq!(f.next_value(16), Some(45));
        assert_eq!(f.next_value(46), None);
        assert_eq!(f.prev_value(44), Some(15));
        assert_eq!(f.prev_value(14), None);
    }

    #[test]
    fn rejects_out_of_range() {
        assert!(FieldExpr::parse(FieldKind::Minute, "60").is_err());
        assert!(FieldExpr::parse(FieldKind::Hour, "24").is_err());
        assert!(FieldExpr::parse(FieldKind::DayOfMonth, "0").is_err());
        assert!(FieldExpr::parse(FieldKind::Month, "13").is_err());
        assert!(FieldExpr::parse(FieldKind::DayOfWeek, "8").is_err());
        assert!(FieldExpr::parse(FieldKind::WeekOfYear, "54").is_err());
    }

    #[test]
    fn rejects_bad_syntax() {
        assert!(FieldExpr::parse(FieldKind::Minute, "*/0").is_err());
        assert!(FieldExpr::parse(FieldKind::Minute, "abc").is_err());
        assert!(FieldExpr::parse(FieldKind::Minute, "5-1").is_err());
        assert!(FieldExpr::parse(FieldKind::Minute, "1,,2").is_err());
        assert!(FieldExpr::parse(FieldKind::Minute, "?").is_err());
        assert!(FieldExpr::parse(FieldKind::Hour, "L").is_err());
        assert!(FieldExpr::parse(FieldKind::DayOfWeek, "1#6").is_err());
    }

    #[test]
    fn error_message_names_value() {
        let err = FieldExpr::parse(FieldKind::Minute, "75").unwrap_err();
        assert_eq!(err, "value 75 out of range 0..=59");
    }

    #[test]
    fn year_detection() {
        assert!(looks_like_years("2024"));
        assert!(looks_like_years("2024-2030,2040"));
        assert!(!looks_like_years("1,13,26"));
        assert!(!looks_like_years("*"));
        assert!(!looks_like_years("52,2024"));
    }
}
