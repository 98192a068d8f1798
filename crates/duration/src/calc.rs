//! Evaluate an [`EndOfDuration`] against a reference instant.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use tracing::warn;

use crate::calendar;
use crate::model::{EndOfDuration, ReferencePoint};

/// Compute the instant an EOD/SOD value designates relative to `from`.
///
/// `None` returns `from` unchanged.  Calendar arithmetic happens on the wall
/// clock of `from`'s timezone; the result is in the same timezone.  Event
/// names are not resolved here, so an event-only value also returns `from`.
pub fn calculate_end_date<Tz: TimeZone>(eod: Option<&EndOfDuration>, from: &DateTime<Tz>) -> DateTime<Tz> {
    let Some(eod) = eod else {
        return from.clone();
    };
    if eod.reference_point.is_anchored() {
        anchored(eod, from)
    } else {
        additive(eod, from)
    }
}

// ── additive ───────────────────────────────────────────────────────────────

fn additive<Tz: TimeZone>(eod: &EndOfDuration, from: &DateTime<Tz>) -> DateTime<Tz> {
    let local = from.naive_local();
    let shifted = shift_calendar(local, eod.years, eod.months, eod.weeks, eod.days);
    let base = if shifted == local {
        from.clone()
    } else {
        calendar::resolve_local(&from.timezone(), shifted)
    };

    let delta = time_delta(eod);
    match base.clone().checked_add_signed(delta) {
        Some(dt) => dt,
        None => {
            warn!(duration = %eod, "time offset overflowed; keeping calendar result");
            base
        }
    }
}

// ── anchored ───────────────────────────────────────────────────────────────

fn anchored<Tz: TimeZone>(eod: &EndOfDuration, from: &DateTime<Tz>) -> DateTime<Tz> {
    let anchor = eod.reference_point;
    let mut local = from.naive_local();

    // Every magnitude except the anchor's own offset is applied first.
    local = shift_calendar(
        local,
        if anchor == ReferencePoint::Year { 0 } else { eod.years },
        if matches!(anchor, ReferencePoint::Month | ReferencePoint::Quarter) {
            0
        } else {
            eod.months
        },
        if anchor == ReferencePoint::Week { 0 } else { eod.weeks },
        if anchor == ReferencePoint::Day { 0 } else { eod.days },
    );
    local = match local.checked_add_signed(time_delta(eod)) {
        Some(dt) => dt,
        None => {
            warn!(duration = %eod, "time offset overflowed; ignoring it");
            local
        }
    };

    let offset = eod.anchor_offset();
    let advanced = match anchor {
        ReferencePoint::Day => calendar::add_days(local, u64::from(offset)),
        ReferencePoint::Week => calendar::add_days(local, u64::from(offset) * 7),
        ReferencePoint::Month => calendar::add_months(local, offset),
        ReferencePoint::Quarter => calendar::add_months(local, offset.saturating_mul(3)),
        ReferencePoint::Year => calendar::add_months(local, offset.saturating_mul(12)),
        ReferencePoint::Start | ReferencePoint::End => Some(local),
    };
    let local = advanced.unwrap_or_else(|| {
        warn!(duration = %eod, "anchor offset overflowed; snapping the current period");
        local
    });

    let date = local.date();
    let snapped = if eod.is_sod {
        period_start(anchor, date).and_time(NaiveTime::MIN)
    } else {
        period_end(anchor, date).and_time(calendar::end_of_day_time())
    };
    calendar::resolve_local(&from.timezone(), snapped)
}

/// First day of the period of kind `anchor` that contains `date`.
pub(crate) fn period_start(anchor: ReferencePoint, date: NaiveDate) -> NaiveDate {
    let first = match anchor {
        ReferencePoint::Week => {
            let back = u64::from(date.weekday().num_days_from_monday());
            date.checked_sub_days(chrono::Days::new(back))
        }
        ReferencePoint::Month => date.with_day(1),
        ReferencePoint::Quarter => {
            NaiveDate::from_ymd_opt(date.year(), quarter_first_month(date.month()), 1)
        }
        ReferencePoint::Year => NaiveDate::from_ymd_opt(date.year(), 1, 1),
        ReferencePoint::Day | ReferencePoint::Start | ReferencePoint::End => Some(date),
    };
    first.unwrap_or(date)
}

/// Last day of the period of kind `anchor` that contains `date`.
pub(crate) fn period_end(anchor: ReferencePoint, date: NaiveDate) -> NaiveDate {
    let last = match anchor {
        ReferencePoint::Week => {
            let forward = u64::from(6 - date.weekday().num_days_from_monday());
            date.checked_add_days(chrono::Days::new(forward))
        }
        ReferencePoint::Month => Some(calendar::last_day_of_month(date)),
        ReferencePoint::Quarter => {
            NaiveDate::from_ymd_opt(date.year(), quarter_first_month(date.month()) + 2, 1)
                .map(calendar::last_day_of_month)
        }
        ReferencePoint::Year => NaiveDate::from_ymd_opt(date.year(), 12, 31),
        ReferencePoint::Day | ReferencePoint::Start | ReferencePoint::End => Some(date),
    };
    last.unwrap_or(date)
}

fn quarter_first_month(month: u32) -> u32 {
    (month - 1) / 3 * 3 + 1
}

/// Clamped calendar addition in the fixed order years, months, then days.
/// Each step clamps on its own, so Feb 29 + 1Y1M is Mar 28.
fn shift_calendar(local: NaiveDateTime, years: u32, months: u32, weeks: u32, days: u32) -> NaiveDateTime {
    let total_days = u64::from(weeks) * 7 + u64::from(days);
    calendar::add_months(local, years.saturating_mul(12))
        .and_then(|dt| calendar::add_months(dt, months))
        .and_then(|dt| calendar::add_days(dt, total_days))
        .unwrap_or_else(|| {
            warn!(years, months, total_days, "calendar offset overflowed; keeping input");
            local
        })
}

fn time_delta(eod: &EndOfDuration) -> chrono::Duration {
    chrono::Duration::hours(i64::from(eod.hours))
        + chrono::Duration::minutes(i64::from(eod.minutes))
        + chrono::Duration::seconds(i64::from(eod.seconds))
}
