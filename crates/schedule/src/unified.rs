//! Single entry point for raw expression text.
//!
//! Three forms are accepted: pure cron (`0 9 * * 1-5`), cron with
//! extension clauses (`… WOY:… TZ:… EOD:…`, or the legacy `…EOD:…` form),
//! and a pure duration (`E8H`, `S0W`) that is evaluated directly against the
//! reference instant.

use cd_domain::trace::TraceEvent;
use cd_domain::{Error, Result};
use cd_duration::{calculate_end_date, parse_duration, EndOfDuration};
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::engine::Engine;
use crate::model::Schedule;
use crate::parser::{extension_token, parse_cron_only, parse_extended, parse_hybrid};

/// A classified expression.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expression {
    /// A calendar trigger without an end-of-duration bound.
    Cron(Schedule),
    /// A calendar trigger carrying an `EOD:` bound.
    Hybrid(Schedule),
    /// A bare duration; there is nothing to search for.
    Duration(EndOfDuration),
}

impl Expression {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Cron(_) => "cron",
            Self::Hybrid(_) => "hybrid",
            Self::Duration(_) => "duration",
        }
    }

    pub fn schedule(&self) -> Option<&Schedule> {
        match self {
            Self::Cron(s) | Self::Hybrid(s) => Some(s),
            Self::Duration(_) => None,
        }
    }

    pub fn duration(&self) -> Option<&EndOfDuration> {
        match self {
            Self::Cron(_) => None,
            Self::Hybrid(s) => s.end_of_duration(),
            Self::Duration(eod) => Some(eod),
        }
    }

    fn from_schedule(schedule: Schedule) -> Self {
        if schedule.end_of_duration().is_some() {
            Self::Hybrid(schedule)
        } else {
            Self::Cron(schedule)
        }
    }
}

/// Classify `text` and parse it with the matching parser.
///
/// A leading `E` or `S` directly followed by a digit, a unit letter or `T`
/// marks a pure duration; any other text after the prefix is ambiguous.
/// Any `WOY:`, `TZ:` or unknown `XXX:` clause selects the extended grammar;
/// an `EOD:` clause alone selects the legacy hybrid form.
pub fn parse_expression(text: &str) -> Result<Expression> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(Error::EmptyExpression);
    }

    let expression = if trimmed.starts_with(|c: char| c == 'E' || c == 'S') {
        let starts_units = trimmed[1..].chars().next().is_some_and(|c| {
            c.is_ascii_digit() || matches!(c, 'Y' | 'M' | 'W' | 'D' | 'H' | 'm' | 'S' | 'T')
        });
        if !starts_units {
            return Err(Error::AmbiguousExpression(trimmed.to_string()));
        }
        Expression::Duration(parse_duration(trimmed)?)
    } else {
        let extended = trimmed
            .split_whitespace()
            .filter_map(extension_token)
            .any(|(prefix, _)| prefix != "EOD");
        let schedule = if extended {
            parse_extended(trimmed)?
        } else if trimmed.contains("EOD:") {
            parse_hybrid(trimmed)?
        } else {
            parse_cron_only(trimmed)?
        };
        Expression::from_schedule(schedule)
    };

    TraceEvent::ExpressionClassified {
        expression: trimmed.to_string(),
        kind: expression.kind(),
    }
    .emit();
    Ok(expression)
}

impl Engine {
    /// Next firing for cron/hybrid text; for a pure duration, the instant it
    /// designates relative to `from`.
    pub fn compute_next(&self, text: &str, from: &DateTime<Utc>) -> Result<DateTime<Utc>> {
        match parse_expression(text)? {
            Expression::Cron(schedule) | Expression::Hybrid(schedule) => self.next(&schedule, from),
            Expression::Duration(eod) => Ok(self.evaluate(&eod, from)),
        }
    }

    /// Cron/hybrid: field match.  Pure duration: whether `instant` equals
    /// the instant the duration designates from `instant` itself.
    pub fn is_time_match(&self, text: &str, instant: &DateTime<Utc>) -> Result<bool> {
        match parse_expression(text)? {
            Expression::Cron(schedule) | Expression::Hybrid(schedule) => {
                Ok(self.is_match(&schedule, instant))
            }
            Expression::Duration(eod) => Ok(self.evaluate(&eod, instant) == *instant),
        }
    }

    /// End-of-session instant for `firing`: `None` for a cron expression
    /// without `EOD:`.
    pub fn end_of_expression(&self, text: &str, firing: &DateTime<Utc>) -> Result<Option<DateTime<Utc>>> {
        match parse_expression(text)? {
            Expression::Cron(schedule) | Expression::Hybrid(schedule) => {
                Ok(self.end_of(&schedule, firing))
            }
            Expression::Duration(eod) => Ok(Some(self.evaluate(&eod, firing))),
        }
    }

    /// Evaluate a bare duration in the engine's default timezone.
    fn evaluate(&self, eod: &EndOfDuration, from: &DateTime<Utc>) -> DateTime<Utc> {
        if eod.requires_event_resolution() {
            debug!(duration = %eod, "event is resolved by the caller; returning reference instant");
        }
        TraceEvent::DurationEvaluated {
            duration: eod.to_string(),
            anchored: eod.reference_point.is_anchored(),
            approx_seconds: eod.approx_duration().num_seconds(),
        }
        .emit();
        let local = from.with_timezone(&self.default_timezone());
        calculate_end_date(Some(eod), &local).with_timezone(&Utc)
    }
}

pub fn compute_next(text: &str, from: &DateTime<Utc>) -> Result<DateTime<Utc>> {
    Engine::default().compute_next(text, from)
}

pub fn is_time_match(text: &str, instant: &DateTime<Utc>) -> Result<bool> {
    Engine::default().is_time_match(text, instant)
}

pub fn end_of_expression(text: &str, firing: &DateTime<Utc>) -> Result<Option<DateTime<Utc>>> {
    Engine::default().end_of_expression(text, firing)
}
