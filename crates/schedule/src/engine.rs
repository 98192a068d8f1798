//! Timezone-aware occurrence search over parsed schedules.
//!
//! Searches run on the schedule's local wall clock and jump field by field
//! (year, month, day, hour, minute, second) instead of scanning every
//! second; the result is the same as a second-by-second scan.
//!
//! **DST handling:**
//! - Spring-forward gaps: local times that don't exist are skipped.
//! - Fall-back overlaps: a repeated wall time matches twice, once per
//!   offset, so both passes through the repeated hour are searched.

use cd_domain::config::EngineConfig;
use cd_domain::trace::TraceEvent;
use cd_domain::{Error, Result};
use cd_duration::{calculate_end_date, calendar};
use chrono::{
    DateTime, Datelike, Days, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone,
    Timelike, Utc,
};
use chrono_tz::Tz;
use tracing::{debug, trace};

use crate::field::{FieldExpr, FieldKind};
use crate::model::{Schedule, Special};
use crate::validation::validate_timezone;

/// Occurrence engine bound to a search horizon and a fallback timezone.
#[derive(Debug, Clone)]
pub struct Engine {
    horizon_years: u32,
    default_tz: Tz,
}

impl Default for Engine {
    fn default() -> Self {
        let config = EngineConfig::default();
        Self {
            horizon_years: config.search_horizon_years,
            default_tz: chrono_tz::UTC,
        }
    }
}

impl Engine {
    /// Build an engine from config; the horizon is clamped to `1..=400`.
    pub fn new(config: &EngineConfig) -> Result<Self> {
        let config = config.clamped();
        Ok(Self {
            horizon_years: config.search_horizon_years,
            default_tz: validate_timezone(&config.default_timezone)?,
        })
    }

    pub fn horizon_years(&self) -> u32 {
        self.horizon_years
    }

    pub fn default_timezone(&self) -> Tz {
        self.default_tz
    }

    /// Timezone the schedule's fields are evaluated in.
    pub fn timezone_of(&self, schedule: &Schedule) -> Result<Tz> {
        match schedule.timezone() {
            Some(name) => validate_timezone(name),
            None => Ok(self.default_tz),
        }
    }

    /// Earliest instant strictly after `from` that satisfies `schedule`.
    pub fn next(&self, schedule: &Schedule, from: &DateTime<Utc>) -> Result<DateTime<Utc>> {
        let compiled = self.compile(schedule)?;
        let tz = compiled.tz;
        let local_from = from.with_timezone(&tz).naive_local();
        let limit = horizon_limit(local_from, self.horizon_years, true);

        let mut iterations = 0u32;
        let start = truncate_to_second(local_from) + chrono::Duration::seconds(1);
        let mut found = compiled.scan_forward(start, limit, from, &mut iterations);

        // Inside the first pass of a fall-back overlap the wall clock will
        // repeat times earlier than `local_from`.
        if let LocalResult::Ambiguous(earliest, latest) = tz.from_local_datetime(&local_from) {
            if latest.with_timezone(&Utc) > *from {
                let shift = latest.with_timezone(&Utc) - earliest.with_timezone(&Utc);
                let repeat = compiled.scan_forward(
                    truncate_to_second(local_from - shift),
                    local_from + shift,
                    from,
                    &mut iterations,
                );
                found = earlier(found, repeat);
            }
        }

        self.finish(schedule, "next", from, found, iterations)
    }

    /// Latest instant strictly before `from` that satisfies `schedule`.
    pub fn prev(&self, schedule: &Schedule, from: &DateTime<Utc>) -> Result<DateTime<Utc>> {
        let compiled = self.compile(schedule)?;
        let tz = compiled.tz;
        let local_from = from.with_timezone(&tz).naive_local();
        let limit = horizon_limit(local_from, self.horizon_years, false);

        let truncated = truncate_to_second(local_from);
        let start = if truncated < local_from {
            truncated
        } else {
            truncated - chrono::Duration::seconds(1)
        };
        let mut iterations = 0u32;
        let mut found = compiled.scan_backward(start, limit, from, &mut iterations);

        // Inside the second pass of a fall-back overlap the first pass
        // already showed wall times later than `local_from`.
        if let LocalResult::Ambiguous(earliest, latest) = tz.from_local_datetime(&local_from) {
            if earliest.with_timezone(&Utc) < *from {
                let shift = latest.with_timezone(&Utc) - earliest.with_timezone(&Utc);
                let repeat = compiled.scan_backward(
                    truncate_to_second(local_from + shift),
                    local_from - shift,
                    from,
                    &mut iterations,
                );
                found = later(found, repeat);
            }
        }

        self.finish(schedule, "prev", from, found, iterations)
    }

    /// Up to `n` successive occurrences after `from`.  Stops early when the
    /// horizon is exhausted.
    pub fn next_n(&self, schedule: &Schedule, from: &DateTime<Utc>, n: usize) -> Result<Vec<DateTime<Utc>>> {
        let mut results = Vec::with_capacity(n);
        let mut cursor = *from;
        for _ in 0..n {
            match self.next(schedule, &cursor) {
                Ok(next) => {
                    results.push(next);
                    cursor = next;
                }
                Err(Error::SearchExhausted { .. }) => break,
                Err(e) => return Err(e),
            }
        }
        Ok(results)
    }

    /// Whether `instant` satisfies every constrained field.  Sub-second
    /// precision is ignored; `@reboot` schedules never match.
    pub fn is_match(&self, schedule: &Schedule, instant: &DateTime<Utc>) -> bool {
        match self.compile(schedule) {
            Ok(compiled) => {
                let local = instant.with_timezone(&compiled.tz).naive_local();
                compiled.matches(truncate_to_second(local))
            }
            Err(e) => {
                debug!(schedule = %schedule, error = %e, "schedule cannot match");
                false
            }
        }
    }

    /// End-of-session instant for a firing, or `None` when the schedule has
    /// no `EOD:` bound.  Evaluated in the schedule's timezone.
    pub fn end_of(&self, schedule: &Schedule, firing: &DateTime<Utc>) -> Option<DateTime<Utc>> {
        let eod = schedule.end_of_duration()?;
        let tz = self.timezone_of(schedule).unwrap_or(self.default_tz);
        let local = firing.with_timezone(&tz);
        Some(calculate_end_date(Some(eod), &local).with_timezone(&Utc))
    }

    fn compile(&self, schedule: &Schedule) -> Result<Compiled> {
        if schedule.special() == Some(Special::Reboot) {
            return Err(Error::NotCalendarTriggered(schedule.to_string()));
        }
        let field = |kind: FieldKind| -> Result<FieldExpr> {
            FieldExpr::parse(kind, schedule.field(kind).unwrap_or("*"))
                .map_err(|reason| Error::invalid_field(kind.name(), reason))
        };
        let optional = |kind: FieldKind| -> Result<Option<FieldExpr>> {
            schedule
                .field(kind)
                .map(|text| {
                    FieldExpr::parse(kind, text)
                        .map_err(|reason| Error::invalid_field(kind.name(), reason))
                })
                .transpose()
        };
        Ok(Compiled {
            second: field(FieldKind::Second)?,
            minute: field(FieldKind::Minute)?,
            hour: field(FieldKind::Hour)?,
            day_of_month: field(FieldKind::DayOfMonth)?,
            month: field(FieldKind::Month)?,
            day_of_week: field(FieldKind::DayOfWeek)?,
            year: optional(FieldKind::Year)?,
            week_of_year: optional(FieldKind::WeekOfYear)?,
            tz: self.timezone_of(schedule)?,
        })
    }

    fn finish(
        &self,
        schedule: &Schedule,
        direction: &'static str,
        from: &DateTime<Utc>,
        found: Option<DateTime<Tz>>,
        iterations: u32,
    ) -> Result<DateTime<Utc>> {
        let found = found.map(|dt| dt.with_timezone(&Utc));
        TraceEvent::OccurrenceSearched {
            schedule: schedule.to_string(),
            direction,
            from: from.to_rfc3339(),
            found: found.map(|dt| dt.to_rfc3339()),
            iterations,
        }
        .emit();
        found.ok_or(Error::SearchExhausted {
            horizon_years: self.horizon_years,
        })
    }
}

// ── Free functions using the default engine ──────────────────────────

pub fn next(schedule: &Schedule, from: &DateTime<Utc>) -> Result<DateTime<Utc>> {
    Engine::default().next(schedule, from)
}

pub fn prev(schedule: &Schedule, from: &DateTime<Utc>) -> Result<DateTime<Utc>> {
    Engine::default().prev(schedule, from)
}

pub fn next_n(schedule: &Schedule, from: &DateTime<Utc>, n: usize) -> Result<Vec<DateTime<Utc>>> {
    Engine::default().next_n(schedule, from, n)
}

pub fn is_match(schedule: &Schedule, instant: &DateTime<Utc>) -> bool {
    Engine::default().is_match(schedule, instant)
}

pub fn end_of(schedule: &Schedule, firing: &DateTime<Utc>) -> Option<DateTime<Utc>> {
    Engine::default().end_of(schedule, firing)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Compiled schedule
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

struct Compiled {
    second: FieldExpr,
    minute: FieldExpr,
    hour: FieldExpr,
    day_of_month: FieldExpr,
    month: FieldExpr,
    day_of_week: FieldExpr,
    year: Option<FieldExpr>,
    week_of_year: Option<FieldExpr>,
    tz: Tz,
}

impl Compiled {
    fn matches(&self, local: NaiveDateTime) -> bool {
        self.date_matches(local.date())
            && self.hour.matches(local.hour())
            && self.minute.matches(local.minute())
            && self.second.matches(local.second())
    }

    fn year_matches(&self, year: i32) -> bool {
        match (&self.year, u32::try_from(year)) {
            (None, _) => true,
            (Some(field), Ok(y)) => field.matches(y),
            (Some(_), Err(_)) => false,
        }
    }

    fn date_matches(&self, date: NaiveDate) -> bool {
        self.year_matches(date.year()) && self.month.matches(date.month()) && self.day_matches(date)
    }

    /// Day-of-month and day-of-week are OR'd when both are restricted;
    /// an unrestricted one is ignored.  The ISO week filter is AND'd.
    fn day_matches(&self, date: NaiveDate) -> bool {
        let dom = !self.day_of_month.is_wildcard();
        let dow = !self.day_of_week.is_wildcard();
        let day = match (dom, dow) {
            (true, true) => self.day_of_month.matches_day(date) || self.day_of_week.matches_day(date),
            (true, false) => self.day_of_month.matches_day(date),
            (false, true) => self.day_of_week.matches_day(date),
            (false, false) => true,
        };
        day && self
            .week_of_year
            .as_ref()
            .map_or(true, |woy| woy.matches(date.iso_week().week()))
    }

    /// Earliest instant after `from` whose wall time is a match at or
    /// after `start`.  Gap times are skipped; of an ambiguous wall time the
    /// earliest mapping after `from` wins.
    fn scan_forward(
        &self,
        start: NaiveDateTime,
        limit: NaiveDateTime,
        from: &DateTime<Utc>,
        iterations: &mut u32,
    ) -> Option<DateTime<Tz>> {
        let mut cursor = start;
        loop {
            let candidate = self.next_local(cursor, limit, iterations)?;
            let mapped = match self.tz.from_local_datetime(&candidate) {
                LocalResult::Single(dt) => vec![dt],
                LocalResult::Ambiguous(earliest, latest) => vec![earliest, latest],
                LocalResult::None => Vec::new(),
            };
            if let Some(dt) = mapped.into_iter().find(|dt| dt.with_timezone(&Utc) > *from) {
                return Some(dt);
            }
            trace!(%candidate, "local time skipped");
            cursor = candidate + chrono::Duration::seconds(1);
        }
    }

    /// Mirror of [`Compiled::scan_forward`]: latest mapping before `from`.
    fn scan_backward(
        &self,
        start: NaiveDateTime,
        limit: NaiveDateTime,
        from: &DateTime<Utc>,
        iterations: &mut u32,
    ) -> Option<DateTime<Tz>> {
        let mut cursor = start;
        loop {
            let candidate = self.prev_local(cursor, limit, iterations)?;
            let mapped = match self.tz.from_local_datetime(&candidate) {
                LocalResult::Single(dt) => vec![dt],
                LocalResult::Ambiguous(earliest, latest) => vec![latest, earliest],
                LocalResult::None => Vec::new(),
            };
            if let Some(dt) = mapped.into_iter().find(|dt| dt.with_timezone(&Utc) < *from) {
                return Some(dt);
            }
            trace!(%candidate, "local time skipped");
            cursor = candidate - chrono::Duration::seconds(1);
        }
    }

    /// First matching local time `>= start`, or `None` past `limit`.
    fn next_local(&self, start: NaiveDateTime, limit: NaiveDateTime, iterations: &mut u32) -> Option<NaiveDateTime> {
        let mut t = start;
        loop {
            *iterations += 1;
            if t > limit {
                return None;
            }
            let date = t.date();

            if !self.year_matches(date.year()) {
                let field = self.year.as_ref()?;
                let next_year = u32::try_from(date.year() + 1).ok()?;
                let year = i32::try_from(field.next_value(next_year)?).ok()?;
                t = midnight(NaiveDate::from_ymd_opt(year, 1, 1)?);
                continue;
            }
            if !self.month.matches(date.month()) {
                t = match self.month.next_value(date.month() + 1) {
                    Some(m) => midnight(NaiveDate::from_ymd_opt(date.year(), m, 1)?),
                    None => midnight(NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)?),
                };
                continue;
            }
            if !self.day_matches(date) {
                t = midnight(date.checked_add_days(Days::new(1))?);
                continue;
            }
            if !self.hour.matches(t.hour()) {
                t = match self.hour.next_value(t.hour() + 1) {
                    Some(h) => date.and_hms_opt(h, 0, 0)?,
                    None => midnight(date.checked_add_days(Days::new(1))?),
                };
                continue;
            }
            if !self.minute.matches(t.minute()) {
                t = match self.minute.next_value(t.minute() + 1) {
                    Some(m) => date.and_hms_opt(t.hour(), m, 0)?,
                    None => date.and_hms_opt(t.hour(), 0, 0)? + chrono::Duration::hours(1),
                };
                continue;
            }
            if !self.second.matches(t.second()) {
                t = match self.second.next_value(t.second() + 1) {
                    Some(s) => date.and_hms_opt(t.hour(), t.minute(), s)?,
                    None => date.and_hms_opt(t.hour(), t.minute(), 0)? + chrono::Duration::minutes(1),
                };
                continue;
            }
            return Some(t);
        }
    }

    /// Last matching local time `<= start`, or `None` before `limit`.
    fn prev_local(&self, start: NaiveDateTime, limit: NaiveDateTime, iterations: &mut u32) -> Option<NaiveDateTime> {
        let mut t = start;
        loop {
            *iterations += 1;
            if t < limit {
                return None;
            }
            let date = t.date();

            if !self.year_matches(date.year()) {
                let field = self.year.as_ref()?;
                let prev_year = u32::try_from(date.year() - 1).ok()?;
                let year = i32::try_from(field.prev_value(prev_year)?).ok()?;
                t = last_second(NaiveDate::from_ymd_opt(year, 12, 31)?);
                continue;
            }
            if !self.month.matches(date.month()) {
                let target = match self.month.prev_value(date.month() - 1) {
                    Some(m) => NaiveDate::from_ymd_opt(date.year(), m, 1)?,
                    None => NaiveDate::from_ymd_opt(date.year() - 1, 12, 1)?,
                };
                t = last_second(calendar::last_day_of_month(target));
                continue;
            }
            if !self.day_matches(date) {
                t = last_second(date.checked_sub_days(Days::new(1))?);
                continue;
            }
            if !self.hour.matches(t.hour()) {
                t = match t.hour().checked_sub(1).and_then(|h| self.hour.prev_value(h)) {
                    Some(h) => date.and_hms_opt(h, 59, 59)?,
                    None => last_second(date.checked_sub_days(Days::new(1))?),
                };
                continue;
            }
            if !self.minute.matches(t.minute()) {
                t = match t.minute().checked_sub(1).and_then(|m| self.minute.prev_value(m)) {
                    Some(m) => date.and_hms_opt(t.hour(), m, 59)?,
                    None => date.and_hms_opt(t.hour(), 0, 0)? - chrono::Duration::seconds(1),
                };
                continue;
            }
            if !self.second.matches(t.second()) {
                t = match t.second().checked_sub(1).and_then(|s| self.second.prev_value(s)) {
                    Some(s) => date.and_hms_opt(t.hour(), t.minute(), s)?,
                    None => date.and_hms_opt(t.hour(), t.minute(), 0)? - chrono::Duration::seconds(1),
                };
                continue;
            }
            return Some(t);
        }
    }
}

fn earlier(a: Option<DateTime<Tz>>, b: Option<DateTime<Tz>>) -> Option<DateTime<Tz>> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

fn later(a: Option<DateTime<Tz>>, b: Option<DateTime<Tz>>) -> Option<DateTime<Tz>> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}

fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

fn last_second(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_opt(23, 59, 59).unwrap_or_else(|| midnight(date))
}

fn truncate_to_second(local: NaiveDateTime) -> NaiveDateTime {
    local.with_nanosecond(0).unwrap_or(local)
}

fn horizon_limit(local_from: NaiveDateTime, years: u32, forward: bool) -> NaiveDateTime {
    let months = chrono::Months::new(years.saturating_mul(12));
    let limit = if forward {
        local_from.checked_add_months(months)
    } else {
        local_from.checked_sub_months(months)
    };
    limit.unwrap_or(if forward {
        NaiveDateTime::MAX
    } else {
        NaiveDateTime::MIN
    })
}
