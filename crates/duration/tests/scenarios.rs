use cd_duration::{calculate_end_date, parse_duration, ReferencePoint};
use chrono::{NaiveDate, TimeZone, Utc};

#[test]
fn shift_ends_eight_hours_after_start() {
    let start = Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap();
    let eod = parse_duration("E8H").unwrap();
    assert_eq!(eod.reference_point, ReferencePoint::End);
    assert_eq!(
        calculate_end_date(Some(&eod), &start),
        Utc.with_ymd_and_hms(2024, 3, 4, 17, 0, 0).unwrap()
    );
}

#[test]
fn month_end_from_january_thirty_first() {
    let from = Utc.with_ymd_and_hms(2023, 1, 31, 12, 0, 0).unwrap();
    let eod = parse_duration("E1M").unwrap();
    let end = calculate_end_date(Some(&eod), &from);
    assert_eq!(end.date_naive(), NaiveDate::from_ymd_opt(2023, 2, 28).unwrap());
}

#[test]
fn end_of_year_in_local_zone() {
    let tz = chrono_tz::America::New_York;
    let from = tz.with_ymd_and_hms(2024, 12, 31, 22, 0, 0).unwrap();
    let eod = parse_duration("E0Y").unwrap();
    let end = calculate_end_date(Some(&eod), &from);
    assert_eq!(end.naive_local().date(), NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());
    // Still 2024 locally even though UTC has rolled over.
    assert!(end.with_timezone(&Utc).date_naive() > end.naive_local().date());
}

#[test]
fn additive_across_dst_keeps_elapsed_time() {
    let tz = chrono_tz::America::New_York;
    // Spring forward happens at 02:00 on 2024-03-10.
    let from = tz.with_ymd_and_hms(2024, 3, 10, 0, 30, 0).unwrap();
    let eod = parse_duration("E3H").unwrap();
    let end = calculate_end_date(Some(&eod), &from);
    assert_eq!(end - from, chrono::Duration::hours(3));
    assert_eq!(end.naive_local().time(), chrono::NaiveTime::from_hms_opt(4, 30, 0).unwrap());
}
