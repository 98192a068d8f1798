//! Cron, extended and hybrid expression parsing.
//!
//! ```text
//! cron      := 5 | 6 | 7 whitespace-separated fields, or an @macro
//! extended  := cron [WOY:<weeks>] [TZ:<name>] [EOD:<duration>]
//! hybrid    := cron-fields "EOD:" duration
//! ```

use cd_domain::{Error, Result};
use cd_duration::parse_duration;

use crate::field::{looks_like_years, FieldKind};
use crate::model::Schedule;

/// Extension clauses pulled off an extended expression, plus the base
/// field tokens that remain.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ParsedExtensions<'a> {
    pub fields: Vec<&'a str>,
    pub week_of_year: Option<&'a str>,
    pub timezone: Option<&'a str>,
    pub end_of_duration: Option<String>,
}

/// Parse a plain cron expression (5, 6 or 7 fields, or a macro).
///
/// 5 fields are `minute hour dom month dow` with seconds fixed at `0`.
/// A 7th field is a week-of-year filter, or a year field when every
/// number in it is above 53.
pub fn parse_cron_only(text: &str) -> Result<Schedule> {
    let fields: Vec<&str> = text.split_whitespace().collect();
    schedule_from_fields(&fields)
}

/// Parse a cron expression followed by any of `WOY:`, `TZ:`, `EOD:` in any
/// order.
pub fn parse_extended(text: &str) -> Result<Schedule> {
    let ext = split_extensions(text)?;
    let mut schedule = schedule_from_fields(&ext.fields)?;

    if let Some(woy) = ext.week_of_year {
        if schedule.week_of_year().is_some() {
            return Err(Error::invalid_field(
                FieldKind::WeekOfYear.name(),
                "given both as a 7th field and as WOY:",
            ));
        }
        schedule = schedule.with_week_of_year(woy)?;
    }
    if let Some(tz) = ext.timezone {
        schedule = schedule.with_timezone(tz)?;
    }
    if let Some(eod) = ext.end_of_duration {
        let eod = parse_duration(&eod).map_err(Error::InvalidEod)?;
        schedule = schedule.with_end_of_duration(eod);
    }
    Ok(schedule)
}

/// Legacy single-extension form: everything before the first `EOD:` is a
/// plain cron expression, everything after it is the duration.
pub fn parse_hybrid(text: &str) -> Result<Schedule> {
    let Some((cron, duration)) = text.split_once("EOD:") else {
        return parse_cron_only(text);
    };
    let schedule = parse_cron_only(cron)?;
    let eod = parse_duration(duration).map_err(Error::InvalidEod)?;
    Ok(schedule.with_end_of_duration(eod))
}

/// Split `text` into base field tokens and extension clauses.
///
/// Reference-suffix tokens (`D`, `W`, `M`, `Q`, `Y`) and `E[..]` tokens
/// directly following an `EOD:` clause belong to it.
pub fn split_extensions(text: &str) -> Result<ParsedExtensions<'_>> {
    let mut ext = ParsedExtensions::default();
    let mut in_eod = false;

    for token in text.split_whitespace() {
        if let Some((prefix, value)) = extension_token(token) {
            in_eod = false;
            if value.is_empty() {
                return Err(Error::invalid_field(&prefix, "extension has no value"));
            }
            let duplicate = || Error::invalid_field(&prefix, "extension given more than once");
            match prefix.as_str() {
                "WOY" => {
                    if ext.week_of_year.replace(value).is_some() {
                        return Err(duplicate());
                    }
                }
                "TZ" => {
                    if ext.timezone.replace(value).is_some() {
                        return Err(duplicate());
                    }
                }
                "EOD" => {
                    if ext.end_of_duration.replace(value.to_string()).is_some() {
                        return Err(duplicate());
                    }
                    in_eod = true;
                }
                _ => return Err(Error::UnknownExtension(token.to_string())),
            }
            continue;
        }

        if in_eod && is_eod_trailer(token) {
            if let Some(eod) = ext.end_of_duration.as_mut() {
                eod.push(' ');
                eod.push_str(token);
            }
            continue;
        }
        in_eod = false;
        ext.fields.push(token);
    }
    Ok(ext)
}

/// `XXX:value` with an alphabetic prefix.  Cron fields never contain `:`.
pub(crate) fn extension_token(token: &str) -> Option<(String, &str)> {
    let (prefix, value) = token.split_once(':')?;
    if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    Some((prefix.to_ascii_uppercase(), value))
}

fn is_eod_trailer(token: &str) -> bool {
    matches!(token, "D" | "W" | "M" | "Q" | "Y") || (token.starts_with("E[") && token.ends_with(']'))
}

fn schedule_from_fields(fields: &[&str]) -> Result<Schedule> {
    match fields {
        [] => Err(Error::EmptyExpression),
        [single] if single.starts_with('@') => expand_macro(single),
        [minute, hour, dom, month, dow] => Schedule::from_fields("0", minute, hour, dom, month, dow),
        [second, minute, hour, dom, month, dow] => {
            Schedule::from_fields(second, minute, hour, dom, month, dow)
        }
        [second, minute, hour, dom, month, dow, trailing] => {
            let schedule = Schedule::from_fields(second, minute, hour, dom, month, dow)?;
            match *trailing {
                "*" | "?" => Ok(schedule),
                t if looks_like_years(t) => schedule.with_year(t),
                t => schedule.with_week_of_year(t),
            }
        }
        _ => Err(Error::InvalidFieldCount {
            found: fields.len(),
        }),
    }
}

fn expand_macro(name: &str) -> Result<Schedule> {
    let expansion = match name.to_ascii_lowercase().as_str() {
        "@reboot" => return Ok(Schedule::reboot()),
        "@yearly" | "@annually" => "0 0 1 1 *",
        "@monthly" => "0 0 1 * *",
        "@weekly" => "0 0 * * 0",
        "@daily" | "@midnight" => "0 0 * * *",
        "@hourly" => "0 * * * *",
        _ => {
            return Err(Error::invalid_field(
                "macro",
                format!("unknown macro '{name}'"),
            ))
        }
    };
    parse_cron_only(expansion)
}

#[cfg(test)]
mod tests {
    use cd_domain::DurationError;
    use cd_duration::ReferencePoint;

    use super::*;
    use crate::model::Special;

    #[test]
    fn five_fields_default_seconds() {
        let s = parse_cron_only("30 14 * * *").unwrap();
        assert_eq!(s.second(), Some("0"));
        assert_eq!(s.minute(), Some("30"));
        assert_eq!(s.hour(), Some("14"));
    }

    #[test]
    fn six_fields() {
        let s = parse_cron_only("15 30 14 * * MON").unwrap();
        assert_eq!(s.second(), Some("15"));
        assert_eq!(s.day_of_week(), Some("1"));
    }

    #[test]
    fn seventh_field_is_week_of_year() {
        let s = parse_cron_only("0 0 9 * * 1 1-4").unwrap();
        assert_eq!(s.week_of_year(), Some("1-4"));
        assert_eq!(s.year(), None);
    }

    #[test]
    fn seventh_field_with_years() {
        let s = parse_cron_only("0 0 9 * * 1 2025,2026").unwrap();
        assert_eq!(s.year(), Some("2025,2026"));
        assert_eq!(s.week_of_year(), None);
    }

    #[test]
    fn bad_field_count() {
        assert_eq!(
            parse_cron_only("* * *"),
            Err(Error::InvalidFieldCount { found: 3 })
        );
        assert_eq!(
            parse_cron_only("* * * * * * * *"),
            Err(Error::InvalidFieldCount { found: 8 })
        );
    }

    #[test]
    fn empty_text() {
        assert_eq!(parse_cron_only("   "), Err(Error::EmptyExpression));
    }

    #[test]
    fn invalid_field_reports_name() {
        match parse_cron_only("0 61 * * * *") {
            Err(Error::InvalidField { field, .. }) => assert_eq!(field, "minute"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn reboot_macro() {
        let s = parse_cron_only("@reboot").unwrap();
        assert_eq!(s.special(), Some(Special::Reboot));
    }

    #[test]
    fn calendar_macros_expand() {
        assert_eq!(parse_cron_only("@daily").unwrap().to_string(), "0 0 0 * * *");
        assert_eq!(parse_cron_only("@hourly").unwrap().to_string(), "0 0 * * * *");
        assert_eq!(parse_cron_only("@weekly").unwrap().to_string(), "0 0 0 * * 0");
        assert_eq!(parse_cron_only("@monthly").unwrap().to_string(), "0 0 0 1 * *");
        assert_eq!(
            parse_cron_only("@annually").unwrap(),
            parse_cron_only("@yearly").unwrap()
        );
        assert!(parse_cron_only("@sometimes").is_err());
    }

    #[test]
    fn extended_all_clauses_any_order() {
        let s = parse_extended("0 9 * * 1-5 EOD:E8H TZ:Europe/Istanbul WOY:1,13").unwrap();
        assert_eq!(s.week_of_year(), Some("1,13"));
        assert_eq!(s.timezone(), Some("Europe/Istanbul"));
        assert_eq!(s.end_of_duration().map(|e| e.hours), Some(8));
    }

    #[test]
    fn extended_eod_with_suffix_and_event() {
        let s = parse_extended("0 9 * * * EOD:E2DT4H M TZ:UTC").unwrap();
        let eod = s.end_of_duration().unwrap();
        assert_eq!(eod.reference_point, ReferencePoint::Month);
        assert_eq!(s.timezone(), Some("UTC"));

        let s = parse_extended("0 9 * * * EOD:E2H E[deploy]").unwrap();
        assert_eq!(s.end_of_duration().unwrap().event.as_deref(), Some("deploy"));
    }

    #[test]
    fn extended_unknown_extension() {
        assert_eq!(
            parse_extended("0 9 * * * FOO:bar"),
            Err(Error::UnknownExtension("FOO:bar".into()))
        );
    }

    #[test]
    fn extended_invalid_eod_keeps_cause() {
        assert_eq!(
            parse_extended("0 9 * * * EOD:X8H"),
            Err(Error::InvalidEod(DurationError::InvalidPrefix("X8H".into())))
        );
    }

    #[test]
    fn extended_invalid_timezone() {
        assert!(matches!(
            parse_extended("0 9 * * * TZ:Mars/Base"),
            Err(Error::InvalidTimezone(_))
        ));
    }

    #[test]
    fn extended_duplicates_rejected() {
        assert!(matches!(
            parse_extended("0 9 * * * TZ:UTC TZ:UTC"),
            Err(Error::InvalidField { .. })
        ));
        assert!(matches!(
            parse_extended("0 0 9 * * * 5 WOY:6"),
            Err(Error::InvalidField { .. })
        ));
    }

    #[test]
    fn extended_macro_with_timezone() {
        let s = parse_extended("@daily TZ:America/New_York").unwrap();
        assert_eq!(s.hour(), Some("0"));
        assert_eq!(s.timezone(), Some("America/New_York"));
    }

    #[test]
    fn hybrid_splits_at_eod() {
        let s = parse_hybrid("0 9 * * 1-5 EOD:E8H").unwrap();
        assert_eq!(s.day_of_week(), Some("1-5"));
        assert_eq!(s.end_of_duration().map(|e| e.hours), Some(8));
    }

    #[test]
    fn hybrid_takes_rest_of_text_as_duration() {
        let s = parse_hybrid("0 9 * * * EOD:E1DT2H W").unwrap();
        assert_eq!(s.end_of_duration().unwrap().reference_point, ReferencePoint::Week);
    }

    #[test]
    fn hybrid_wraps_duration_errors() {
        assert!(matches!(parse_hybrid("0 9 * * * EOD:E"), Err(Error::InvalidEod(_))));
    }

    #[test]
    fn hybrid_without_eod_is_plain_cron() {
        assert_eq!(parse_hybrid("0 9 * * *"), parse_cron_only("0 9 * * *"));
    }

    #[test]
    fn canonical_reparses() {
        let s = parse_extended("0 9 * * 1-5 EOD:E2DT4H M TZ:UTC WOY:10-20").unwrap();
        let text = s.to_canonical_string();
        assert_eq!(text, "0 0 9 * * 1-5 WOY:10-20 TZ:UTC EOD:E2DT4H M");
        assert_eq!(parse_extended(&text).unwrap(), s);
    }

    #[test]
    fn split_extensions_collects_fields() {
        let ext = split_extensions("0 9 * * * TZ:UTC").unwrap();
        assert_eq!(ext.fields, vec!["0", "9", "*", "*", "*"]);
        assert_eq!(ext.timezone, Some("UTC"));
        assert_eq!(ext.week_of_year, None);
    }
}
