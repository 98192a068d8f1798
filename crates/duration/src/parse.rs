//! Tokenizer and parser for the `S`/`E` duration notation.
//!
//! Grammar (whitespace-separated parts):
//!
//! ```text
//! (S|E) units [T time-units] [suffix] [E[event]]
//! ```
//!
//! `M` before the `T` separator means months unless it directly follows an
//! `H` token; lowercase `m` always means minutes.

use cd_domain::DurationError;

use crate::model::{EndOfDuration, ReferencePoint};

/// Largest magnitude accepted for a single unit (after accumulation).
pub const MAX_MAGNITUDE: u32 = 100_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Unit {
    Years,
    Months,
    Weeks,
    Days,
    Hours,
    Minutes,
    Seconds,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    Date,
    Time,
}

#[derive(Debug)]
struct Token {
    value: u32,
    unit: Unit,
}

/// Parse a duration expression such as `E8H`, `S0W`, `E2DT4H M` or
/// `E2H E[deploy]`.
pub fn parse_duration(text: &str) -> Result<EndOfDuration, DurationError> {
    let trimmed = text.trim();
    let mut parts = trimmed.split_whitespace();
    let Some(body) = parts.next() else {
        return Err(DurationError::EmptyExpression);
    };

    let (is_sod, units) = if let Some(rest) = body.strip_prefix('S') {
        (true, rest)
    } else if let Some(rest) = body.strip_prefix('E') {
        (false, rest)
    } else {
        return Err(DurationError::InvalidPrefix(trimmed.to_string()));
    };

    let tokens = tokenize(units)?;
    let Some(first) = tokens.first() else {
        return Err(DurationError::NoDurationUnits(trimmed.to_string()));
    };

    let mut eod = if is_sod {
        EndOfDuration::start(implied_reference(first.unit))
    } else {
        EndOfDuration::end(implied_reference(first.unit))
    };
    for token in &tokens {
        accumulate(&mut eod, token)?;
    }

    let mut suffix_seen = false;
    for part in parts {
        if let Some(name) = part
            .strip_prefix("E[")
            .and_then(|rest| rest.strip_suffix(']'))
        {
            if name.is_empty() {
                return Err(DurationError::UnknownUnit(format!("empty event name in '{part}'")));
            }
            if eod.event.is_some() {
                return Err(DurationError::UnknownUnit(format!("duplicate event clause '{part}'")));
            }
            eod.event = Some(name.to_string());
            continue;
        }

        let mut chars = part.chars();
        let reference = match (chars.next(), chars.next()) {
            (Some(letter), None) => ReferencePoint::from_suffix(letter),
            _ => None,
        };
        let Some(reference) = reference else {
            return Err(DurationError::UnknownUnit(part.to_string()));
        };
        if suffix_seen {
            return Err(DurationError::UnknownUnit(format!("duplicate reference suffix '{part}'")));
        }
        suffix_seen = true;
        eod.reference_point = reference;
    }

    if !eod.has_duration() && eod.event.is_none() && !eod.reference_point.is_anchored() {
        return Err(DurationError::EmptyDuration(trimmed.to_string()));
    }
    Ok(eod)
}

/// `true` when `text` parses as a duration expression.
pub fn is_valid(text: &str) -> bool {
    parse_duration(text).is_ok()
}

fn tokenize(units: &str) -> Result<Vec<Token>, DurationError> {
    let mut tokens: Vec<Token> = Vec::new();
    let mut section = Section::Date;
    let mut chars = units.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        if c == 'T' && section == Section::Date {
            section = Section::Time;
            chars.next();
            continue;
        }

        let mut end = start;
        while let Some(&(i, d)) = chars.peek() {
            if !d.is_ascii_digit() {
                break;
            }
            end = i + d.len_utf8();
            chars.next();
        }
        let digits = &units[start..end];

        let Some((_, letter)) = chars.next() else {
            return Err(DurationError::InvalidNumber(format!("'{digits}' has no unit")));
        };
        if digits.is_empty() {
            return Err(if is_unit_letter(letter) {
                DurationError::InvalidNumber(format!("missing magnitude before '{letter}'"))
            } else {
                DurationError::UnknownUnit(letter.to_string())
            });
        }

        let value = parse_magnitude(digits)?;
        let previous = tokens.last().map(|t| t.unit);
        let unit = resolve_unit(letter, section, previous)?;
        tokens.push(Token { value, unit });
    }
    Ok(tokens)
}

fn is_unit_letter(letter: char) -> bool {
    matches!(letter, 'Y' | 'M' | 'W' | 'D' | 'H' | 'm' | 'S')
}

fn parse_magnitude(digits: &str) -> Result<u32, DurationError> {
    let value: u32 = digits
        .parse()
        .map_err(|_| DurationError::InvalidNumber(digits.to_string()))?;
    if value > MAX_MAGNITUDE {
        return Err(DurationError::InvalidNumber(format!(
            "{value} exceeds maximum magnitude {MAX_MAGNITUDE}"
        )));
    }
    Ok(value)
}

fn resolve_unit(letter: char, section: Section, previous: Option<Unit>) -> Result<Unit, DurationError> {
    match (section, letter) {
        (_, 'H') => Ok(Unit::Hours),
        (_, 'm') => Ok(Unit::Minutes),
        (_, 'S') => Ok(Unit::Seconds),
        (Section::Time, 'M') => Ok(Unit::Minutes),
        (Section::Date, 'M') if previous == Some(Unit::Hours) => Ok(Unit::Minutes),
        (Section::Date, 'M') => Ok(Unit::Months),
        (Section::Date, 'Y') => Ok(Unit::Years),
        (Section::Date, 'W') => Ok(Unit::Weeks),
        (Section::Date, 'D') => Ok(Unit::Days),
        (Section::Time, 'Y' | 'W' | 'D') => Err(DurationError::UnknownUnit(format!(
            "'{letter}' is not a time unit"
        ))),
        _ => Err(DurationError::UnknownUnit(letter.to_string())),
    }
}

fn implied_reference(unit: Unit) -> ReferencePoint {
    match unit {
        Unit::Years => ReferencePoint::Year,
        Unit::Months => ReferencePoint::Month,
        Unit::Weeks => ReferencePoint::Week,
        Unit::Days => ReferencePoint::Day,
        // start()/end() turn this into Start for SOD values.
        Unit::Hours | Unit::Minutes | Unit::Seconds => ReferencePoint::End,
    }
}

fn accumulate(eod: &mut EndOfDuration, token: &Token) -> Result<(), DurationError> {
    let slot = match token.unit {
        Unit::Years => &mut eod.years,
        Unit::Months => &mut eod.months,
        Unit::Weeks => &mut eod.weeks,
        Unit::Days => &mut eod.days,
        Unit::Hours => &mut eod.hours,
        Unit::Minutes => &mut eod.minutes,
        Unit::Seconds => &mut eod.seconds,
    };
    let total = slot.saturating_add(token.value);
    if total > MAX_MAGNITUDE {
        return Err(DurationError::InvalidNumber(format!(
            "{total} exceeds maximum magnitude {MAX_MAGNITUDE}"
        )));
    }
    *slot = total;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_additive_hours() {
        let eod = parse_duration("E8H").unwrap();
        assert_eq!(eod.hours, 8);
        assert_eq!(eod.reference_point, ReferencePoint::End);
        assert!(!eod.is_sod);
    }

    #[test]
    fn parses_start_of_duration() {
        let eod = parse_duration("S30m").unwrap();
        assert_eq!(eod.minutes, 30);
        assert_eq!(eod.reference_point, ReferencePoint::Start);
        assert!(eod.is_sod);
    }

    #[test]
    fn first_unit_sets_reference() {
        assert_eq!(parse_duration("E1Y").unwrap().reference_point, ReferencePoint::Year);
        assert_eq!(parse_duration("E1M").unwrap().reference_point, ReferencePoint::Month);
        assert_eq!(parse_duration("E0W").unwrap().reference_point, ReferencePoint::Week);
        assert_eq!(parse_duration("S0D").unwrap().reference_point, ReferencePoint::Day);
    }

    #[test]
    fn uppercase_m_is_months_before_t() {
        let eod = parse_duration("S30M").unwrap();
        assert_eq!(eod.months, 30);
        assert_eq!(eod.minutes, 0);
    }

    #[test]
    fn uppercase_m_after_hours_is_minutes() {
        let eod = parse_duration("E8H30M").unwrap();
        assert_eq!(eod.hours, 8);
        assert_eq!(eod.minutes, 30);
        assert_eq!(eod.months, 0);
    }

    #[test]
    fn time_section_after_t() {
        let eod = parse_duration("E1M2DT4H30M").unwrap();
        assert_eq!(eod.months, 1);
        assert_eq!(eod.days, 2);
        assert_eq!(eod.hours, 4);
        assert_eq!(eod.minutes, 30);
        assert_eq!(eod.reference_point, ReferencePoint::Month);
    }

    #[test]
    fn suffix_overrides_reference() {
        let eod = parse_duration("E2DT4H M").unwrap();
        assert_eq!(eod.reference_point, ReferencePoint::Month);
        let eod = parse_duration("E10H Q").unwrap();
        assert_eq!(eod.reference_point, ReferencePoint::Quarter);
    }

    #[test]
    fn event_clause() {
        let eod = parse_duration("E2H E[project_deadline]").unwrap();
        assert_eq!(eod.hours, 2);
        assert_eq!(eod.event.as_deref(), Some("project_deadline"));
    }

    #[test]
    fn event_only_is_valid() {
        let eod = parse_duration("E0H E[deploy]").unwrap();
        assert!(eod.requires_event_resolution());
    }

    #[test]
    fn repeated_units_accumulate() {
        let eod = parse_duration("E1H2H").unwrap();
        assert_eq!(eod.hours, 3);
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        assert_eq!(parse_duration("  E8H  ").unwrap().hours, 8);
    }

    #[test]
    fn empty_input() {
        assert_eq!(parse_duration(""), Err(DurationError::EmptyExpression));
        assert_eq!(parse_duration("   "), Err(DurationError::EmptyExpression));
    }

    #[test]
    fn bad_prefix() {
        assert!(matches!(parse_duration("X8H"), Err(DurationError::InvalidPrefix(_))));
        assert!(matches!(parse_duration("e8H"), Err(DurationError::InvalidPrefix(_))));
    }

    #[test]
    fn prefix_without_units() {
        assert!(matches!(parse_duration("E"), Err(DurationError::NoDurationUnits(_))));
        assert!(matches!(parse_duration("S"), Err(DurationError::NoDurationUnits(_))));
    }

    #[test]
    fn unknown_unit_letter() {
        assert!(matches!(parse_duration("E5X"), Err(DurationError::UnknownUnit(_))));
        assert!(matches!(parse_duration("EX"), Err(DurationError::UnknownUnit(_))));
    }

    #[test]
    fn date_unit_after_t_is_rejected() {
        assert!(matches!(parse_duration("ET2D"), Err(DurationError::UnknownUnit(_))));
    }

    #[test]
    fn digits_without_unit() {
        assert!(matches!(parse_duration("E12"), Err(DurationError::InvalidNumber(_))));
    }

    #[test]
    fn unit_without_digits() {
        assert!(matches!(parse_duration("EH"), Err(DurationError::InvalidNumber(_))));
    }

    #[test]
    fn magnitude_limit() {
        assert!(parse_duration("E100000H").is_ok());
        assert!(matches!(parse_duration("E100001H"), Err(DurationError::InvalidNumber(_))));
        assert!(matches!(
            parse_duration("E99999999999H"),
            Err(DurationError::InvalidNumber(_))
        ));
        assert!(matches!(
            parse_duration("E60000H60000H"),
            Err(DurationError::InvalidNumber(_))
        ));
    }

    #[test]
    fn all_zero_additive_is_empty() {
        assert!(matches!(parse_duration("E0H"), Err(DurationError::EmptyDuration(_))));
        assert!(matches!(parse_duration("S0m"), Err(DurationError::EmptyDuration(_))));
    }

    #[test]
    fn zero_anchor_is_not_empty() {
        assert!(parse_duration("E0W").is_ok());
        assert!(parse_duration("E0H D").is_ok());
    }

    #[test]
    fn bad_trailing_parts() {
        assert!(matches!(parse_duration("E8H X"), Err(DurationError::UnknownUnit(_))));
        assert!(matches!(parse_duration("E8H DW"), Err(DurationError::UnknownUnit(_))));
        assert!(matches!(parse_duration("E8H E[]"), Err(DurationError::UnknownUnit(_))));
        assert!(matches!(parse_duration("E8H D W"), Err(DurationError::UnknownUnit(_))));
    }

    #[test]
    fn is_valid_matches_parse() {
        assert!(is_valid("E0W"));
        assert!(is_valid("S1DT2H"));
        assert!(!is_valid("E"));
        assert!(!is_valid("8H"));
    }

    #[test]
    fn from_str_delegates() {
        // `Q` is a suffix, not a unit letter.
        assert!("E1Q".parse::<EndOfDuration>().is_err());
        let eod: EndOfDuration = "E1M Q".parse().unwrap();
        assert_eq!(eod.reference_point, ReferencePoint::Quarter);
    }
}
