//! Calendar and timestamp utilities
//!
//! Streaks and weekly averages operate at day granularity; these helpers
//! keep the truncation rules in one place.

use chrono::{DateTime, Duration, NaiveDate, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Calendar day of a timestamp (UTC, day granularity)
pub fn day_of(ts: DateTime<Utc>) -> NaiveDate {
    ts.date_naive()
}

/// Today's calendar day (UTC)
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Whole days from `earlier` to `later` (negative if `earlier` is after)
pub fn days_between(earlier: NaiveDate, later: NaiveDate) -> i64 {
    (later - earlier).num_days()
}

/// Cutoff timestamp for a trailing window of `days` days ending now
pub fn trailing_window(reference: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    reference - Duration::days(days)
}
