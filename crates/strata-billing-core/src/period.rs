//! Calendar helpers for billing periods.
//!
//! Billing periods are half-open `[from, to)` intervals in UTC. Invoices
//! settle in full calendar months, so the cumulative usage chain resets at
//! the first instant of each month.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeZone, Utc};

/// The first instant of the calendar month containing `t` (UTC).
#[must_use]
pub fn start_of_month(t: &DateTime<Utc>) -> DateTime<Utc> {
    let date = NaiveDate::from_ymd_opt(t.year(), t.month(), 1)
        .expect("first of an existing month is a valid date");
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

/// The first instant of the calendar month after the one containing `t`
/// (UTC).
#[must_use]
pub fn start_of_next_month(t: &DateTime<Utc>) -> DateTime<Utc> {
    let (year, month) = if t.month() == 12 {
        (t.year() + 1, 1)
    } else {
        (t.year(), t.month() + 1)
    };
    let date = NaiveDate::from_ymd_opt(year, month, 1)
        .expect("first of an existing month is a valid date");
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

/// Whether `t` is exactly the first instant of a calendar month (UTC,
/// `00:00:00.000` on day 1).
#[must_use]
pub fn is_month_start(t: &DateTime<Utc>) -> bool {
    t.day() == 1 && t.time() == NaiveTime::MIN
}
