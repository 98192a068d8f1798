//! Shorthand constructors for common durations.

use crate::model::{EndOfDuration, ReferencePoint};

/// End of the day reached after the given time offset (`E…H…M…S D`).
pub fn end_of_day(hours: u32, minutes: u32, seconds: u32) -> EndOfDuration {
    EndOfDuration::end(ReferencePoint::Day)
        .hours(hours)
        .minutes(minutes)
        .seconds(seconds)
}

/// End of the ISO week reached after the given offset (`E…DT…H…M W`).
pub fn end_of_week(days: u32, hours: u32, minutes: u32) -> EndOfDuration {
    EndOfDuration::end(ReferencePoint::Week)
        .days(days)
        .hours(hours)
        .minutes(minutes)
}

/// End of the month reached after the given offset (`E…DT…H…M M`).
pub fn end_of_month(days: u32, hours: u32, minutes: u32) -> EndOfDuration {
    EndOfDuration::end(ReferencePoint::Month)
        .days(days)
        .hours(hours)
        .minutes(minutes)
}

/// End of the `n`th period after the current one (`end_of(Week, 0)` = `E0W`).
pub fn end_of(reference: ReferencePoint, n: u32) -> EndOfDuration {
    with_offset(EndOfDuration::end(reference), n)
}

/// Start of the `n`th period after the current one (`start_of(Day, 1)` = `S1D`).
pub fn start_of(reference: ReferencePoint, n: u32) -> EndOfDuration {
    with_offset(EndOfDuration::start(reference), n)
}

/// A duration that runs until the named event, optionally capped by a time
/// offset the caller may apply when the event never fires.
pub fn until_event(name: impl Into<String>, hours: u32, minutes: u32, seconds: u32) -> EndOfDuration {
    EndOfDuration::end(ReferencePoint::End)
        .hours(hours)
        .minutes(minutes)
        .seconds(seconds)
        .event(name)
}

fn with_offset(eod: EndOfDuration, n: u32) -> EndOfDuration {
    match eod.reference_point {
        ReferencePoint::Day => eod.days(n),
        ReferencePoint::Week => eod.weeks(n),
        ReferencePoint::Month | ReferencePoint::Quarter => eod.months(n),
        ReferencePoint::Year => eod.years(n),
        ReferencePoint::Start | ReferencePoint::End => eod.hours(n),
    }
}
