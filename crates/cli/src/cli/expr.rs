//! Expression subcommands.  Each returns the text to print so the
//! formatting can be tested without capturing stdout.

use anyhow::Context;
use cd_schedule::{parse_expression, Engine, Expression};
use chrono::{DateTime, SecondsFormat, Utc};

fn fmt_instant(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// `cadence parse`: kind and canonical form, or the parsed value as JSON.
pub fn parse(expression: &str, json: bool) -> anyhow::Result<String> {
    let parsed = parse_expression(expression)
        .with_context(|| format!("parsing '{expression}'"))?;
    if json {
        let value = match &parsed {
            Expression::Cron(s) | Expression::Hybrid(s) => serde_json::to_value(s)?,
            Expression::Duration(eod) => serde_json::to_value(eod)?,
        };
        let doc = serde_json::json!({ "kind": parsed.kind(), "value": value });
        return Ok(serde_json::to_string_pretty(&doc)?);
    }
    let canonical = match &parsed {
        Expression::Cron(s) | Expression::Hybrid(s) => s.to_canonical_string(),
        Expression::Duration(eod) => eod.to_canonical_string(),
    };
    Ok(format!("{}: {canonical}", parsed.kind()))
}

/// `cadence next`: one line per occurrence.
pub fn next(engine: &Engine, expression: &str, from: &DateTime<Utc>, count: usize) -> anyhow::Result<String> {
    let parsed = parse_expression(expression)
        .with_context(|| format!("parsing '{expression}'"))?;
    let found = match parsed.schedule() {
        Some(schedule) => engine.next_n(schedule, from, count.max(1))?,
        None => vec![engine.compute_next(expression, from)?],
    };
    if found.is_empty() {
        anyhow::bail!(
            "no occurrence within {} year(s) of {}",
            engine.horizon_years(),
            fmt_instant(from)
        );
    }
    Ok(found.iter().map(fmt_instant).collect::<Vec<_>>().join("\n"))
}

/// `cadence prev`.
pub fn prev(engine: &Engine, expression: &str, from: &DateTime<Utc>) -> anyhow::Result<String> {
    let parsed = parse_expression(expression)
        .with_context(|| format!("parsing '{expression}'"))?;
    let schedule = parsed
        .schedule()
        .context("a pure duration has no previous occurrence")?;
    Ok(fmt_instant(&engine.prev(schedule, from)?))
}

/// `cadence match`: `true` / `false`.
pub fn matches(engine: &Engine, expression: &str, at: &DateTime<Utc>) -> anyhow::Result<String> {
    Ok(engine.is_time_match(expression, at)?.to_string())
}

/// `cadence end`: the end instant, or `none` without an `EOD:` bound.
pub fn end(engine: &Engine, expression: &str, at: &DateTime<Utc>) -> anyhow::Result<String> {
    Ok(match engine.end_of_expression(expression, at)? {
        Some(dt) => fmt_instant(&dt),
        None => "none".to_string(),
    })
}

/// Process exit status for a failed command: `2` for malformed input,
/// `1` when a valid expression simply has no answer.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<cd_domain::Error>() {
        Some(e) if e.is_parse_error() => 2,
        _ => 1,
    }
}
