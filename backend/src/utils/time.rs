//! Wall-clock helpers and the time-window classifier.
//!
//! Every decision about hours, dates, and windows goes through the single
//! configured business time zone; nothing here reads the server's local zone.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Timelike, Utc, Weekday};
use chrono_tz::Tz;

/// Returns the current time in the configured timezone.
pub fn now_in_timezone(tz: &Tz) -> DateTime<Tz> {
    Utc::now().with_timezone(tz)
}

/// Returns today's date in the configured timezone.
pub fn today_local(tz: &Tz) -> NaiveDate {
    now_in_timezone(tz).date_naive()
}

/// Calendar day-of-week check, locale-naive.
pub fn is_sunday(date: NaiveDate) -> bool {
    date.weekday() == Weekday::Sun
}

/// True iff the local hour-of-day is in `[open_hour, close_hour)`.
///
/// With the defaults 9 and 20 this accepts 9:00:00 through 19:59:59 and
/// rejects 8:59:59 and anything from 20:00:00 on.
pub fn is_within_office_hours<T: Timelike>(t: &T, open_hour: u32, close_hour: u32) -> bool {
    let hour = t.hour();
    hour >= open_hour && hour < close_hour
}

/// True iff the local time-of-day is between 00:01 and 23:59 inclusive.
///
/// Only exact midnight is excluded; a record written at 00:00 would be
/// ambiguous between the old and the new calendar day.
pub fn is_within_attendance_window<T: Timelike>(t: &T) -> bool {
    let minutes = t.hour() * 60 + t.minute();
    (1..=1439).contains(&minutes)
}

/// Combines a calendar date with a local wall-clock time.
pub fn at_local_time(date: NaiveDate, time: NaiveTime) -> chrono::NaiveDateTime {
    date.and_time(time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn t(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    #[test]
    fn now_in_timezone_returns_datetime_in_tz() {
        let tz = chrono_tz::UTC;
        let result = now_in_timezone(&tz);
        assert_eq!(result.timezone(), tz);
    }

    #[test]
    fn sundays_are_detected_by_calendar_weekday() {
        // 2025-03-02 is a Sunday, 2025-03-03 a Monday.
        assert!(is_sunday(NaiveDate::from_ymd_opt(2025, 3, 2).unwrap()));
        assert!(!is_sunday(NaiveDate::from_ymd_opt(2025, 3, 3).unwrap()));
    }

    #[test]
    fn office_hours_are_inclusive_of_open_exclusive_of_close() {
        assert!(!is_within_office_hours(&t(8, 59, 59), 9, 20));
        assert!(is_within_office_hours(&t(9, 0, 0), 9, 20));
        assert!(is_within_office_hours(&t(19, 59, 59), 9, 20));
        assert!(!is_within_office_hours(&t(20, 0, 0), 9, 20));
        assert!(!is_within_office_hours(&t(23, 30, 0), 9, 20));
    }

    #[test]
    fn attendance_window_excludes_only_exact_midnight() {
        assert!(!is_within_attendance_window(&t(0, 0, 0)));
        assert!(!is_within_attendance_window(&t(0, 0, 59)));
        assert!(is_within_attendance_window(&t(0, 1, 0)));
        assert!(is_within_attendance_window(&t(12, 30, 0)));
        assert!(is_within_attendance_window(&t(23, 59, 59)));
    }

    #[test]
    fn at_local_time_combines_date_and_time() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
        let out = at_local_time(date, t(21, 0, 0));
        assert_eq!(out.date(), date);
        assert_eq!(out.time(), t(21, 0, 0));
    }
}
