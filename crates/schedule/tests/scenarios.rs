use cd_domain::Error;
use cd_duration::{calculate_end_date, parse_duration};
use cd_schedule::{
    compute_next, end_of, end_of_expression, is_match, next, parse_cron_only, parse_expression,
    parse_extended, Engine, Schedule,
};
use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};

fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
}

#[test]
fn daily_afternoon_run() {
    let schedule = parse_cron_only("0 30 14 * * *").unwrap();
    assert_eq!(
        next(&schedule, &utc(2024, 1, 15, 10, 0, 0)).unwrap(),
        utc(2024, 1, 15, 14, 30, 0)
    );
}

#[test]
fn eight_hour_shift_duration() {
    let eod = parse_duration("E8H").unwrap();
    assert_eq!(
        calculate_end_date(Some(&eod), &utc(2024, 1, 15, 9, 0, 0)),
        utc(2024, 1, 15, 17, 0, 0)
    );
}

#[test]
fn weekday_session_ends_eight_hours_after_firing() {
    let expression = parse_expression("0 9 * * 1-5 EOD:E8H").unwrap();
    let schedule = expression.schedule().unwrap();
    let firing = next(schedule, &utc(2024, 1, 13, 0, 0, 0)).unwrap();
    // Saturday the 13th rolls to Monday the 15th.
    assert_eq!(firing, utc(2024, 1, 15, 9, 0, 0));
    assert_eq!(end_of(schedule, &firing), Some(firing + Duration::hours(8)));
    assert_eq!(
        end_of_expression("0 9 * * 1-5 EOD:E8H", &firing).unwrap(),
        Some(firing + Duration::hours(8))
    );
}

#[test]
fn february_thirty_first_is_exhausted() {
    let schedule = parse_cron_only("0 0 0 31 2 *").unwrap();
    assert!(matches!(
        next(&schedule, &utc(2024, 1, 1, 0, 0, 0)),
        Err(Error::SearchExhausted { .. })
    ));
}

#[test]
fn quarterly_week_filter() {
    let schedule = parse_extended("0 0 9 * * 1 WOY:1,13,26,39,52").unwrap();
    let engine = Engine::default();
    let found = engine
        .next_n(&schedule, &utc(2024, 1, 1, 12, 0, 0), 6)
        .unwrap();
    assert_eq!(found.len(), 6);
    for dt in &found {
        assert!([1, 13, 26, 39, 52].contains(&dt.iso_week().week()), "{dt}");
    }
    assert_eq!(found[0], utc(2024, 3, 25, 9, 0, 0));
}

#[test]
fn hybrid_with_timezone_and_week_end() {
    let schedule = parse_extended("0 0 9 * * 1 TZ:Europe/Istanbul EOD:E0W").unwrap();
    let firing = next(&schedule, &utc(2024, 1, 10, 0, 0, 0)).unwrap();
    // Monday 09:00 in Istanbul (UTC+3).
    assert_eq!(firing, utc(2024, 1, 15, 6, 0, 0));
    // Sunday 23:59:59.999999999 local is 20:59:59.999999999 UTC.
    assert_eq!(
        end_of(&schedule, &firing),
        Some(utc(2024, 1, 21, 20, 59, 59) + Duration::nanoseconds(999_999_999))
    );
}

#[test]
fn canonical_text_round_trips_through_facade() {
    let original = parse_expression("30 8 1 JAN-MAR MON-FRI TZ:UTC EOD:E1D").unwrap();
    let text = original.schedule().unwrap().to_canonical_string();
    assert_eq!(text, "0 30 8 1 1-3 1-5 TZ:UTC EOD:E1D");
    assert_eq!(parse_expression(&text).unwrap(), original);
}

#[test]
fn pure_duration_through_facade() {
    // 2024-01-18 is a Thursday.
    let end = compute_next("E0W", &utc(2024, 1, 18, 12, 0, 0)).unwrap();
    assert_eq!(end, utc(2024, 1, 21, 23, 59, 59) + Duration::nanoseconds(999_999_999));
}

#[test]
fn matching_schedule_is_still_advanced() {
    let schedule = parse_cron_only("0 0 12 * * *").unwrap();
    let noon = utc(2024, 5, 5, 12, 0, 0);
    assert!(is_match(&schedule, &noon));
    assert_eq!(next(&schedule, &noon).unwrap(), utc(2024, 5, 6, 12, 0, 0));
}

#[test]
fn schedules_are_shared_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Schedule>();
    assert_send_sync::<Engine>();

    let schedule = parse_cron_only("*/15 * * * *").unwrap();
    let engine = Engine::default();
    let from = utc(2024, 1, 1, 0, 0, 0);
    let results: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| engine.next(&schedule, &from).unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert!(results.iter().all(|dt| *dt == utc(2024, 1, 1, 0, 15, 0)));
}
