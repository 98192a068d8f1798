//! Gregorian helpers shared by the duration calculus and the occurrence
//! engine.

use chrono::{
    DateTime, Datelike, Days, LocalResult, Months, NaiveDate, NaiveDateTime, NaiveTime, Offset,
    TimeZone,
};

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Number of days in `month` (1-12) of `year`; `0` for an invalid month.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

/// Last calendar day of the month containing `date`.
pub fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    let last = days_in_month(date.year(), date.month());
    date.with_day(last).unwrap_or(date)
}

/// The final representable instant of a day: 23:59:59.999999999.
pub fn end_of_day_time() -> NaiveTime {
    NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999).unwrap_or(NaiveTime::MIN)
}

/// Add whole months with day-of-month clamping (Jan 31 + 1 month = Feb 28/29).
/// Returns `None` when the result leaves chrono's supported range.
pub fn add_months(local: NaiveDateTime, months: u32) -> Option<NaiveDateTime> {
    if months == 0 {
        return Some(local);
    }
    local.checked_add_months(Months::new(months))
}

pub fn add_days(local: NaiveDateTime, days: u64) -> Option<NaiveDateTime> {
    if days == 0 {
        return Some(local);
    }
    local.checked_add_days(Days::new(days))
}

/// Map a wall-clock time onto `tz`.
///
/// Ambiguous times (DST fall-back) take the earliest mapping.  Times inside
/// a DST gap are read with the offset in force before the transition, which
/// lands them the width of the gap later on the wall clock.
pub fn resolve_local<Tz: TimeZone>(tz: &Tz, local: NaiveDateTime) -> DateTime<Tz> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => {
            let day_before = local.checked_sub_days(Days::new(1)).unwrap_or(local);
            let offset = tz.offset_from_utc_datetime(&day_before).fix();
            let utc = local - chrono::Duration::seconds(i64::from(offset.local_minus_utc()));
            tz.from_utc_datetime(&utc)
        }
    }
}
