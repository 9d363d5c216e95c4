//! Minute-resolution bucket keys.
//!
//! Keys are local wall-clock time formatted as `YYYY-MM-DD HH:MM`; the
//! zero-padded layout makes string order equal chronological order.

use std::time::Duration;

use chrono::{DateTime, Local, NaiveDateTime, TimeDelta, TimeZone};

pub const MINUTE_KEY_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Key for the minute containing `at`.
pub fn minute_key<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format(MINUTE_KEY_FORMAT).to_string()
}

/// Key for the current local minute.
///
/// Local time repeats keys during a DST fall-back hour: the repeated minutes
/// fold into the buckets already written for them, and for that hour string
/// order stops matching time order.
pub fn now_key() -> String {
    minute_key(&Local::now())
}

/// Oldest key a series may keep when buckets older than `window` are evicted.
pub fn cutoff_key(now: &DateTime<Local>, window: Duration) -> String {
    match TimeDelta::from_std(window).ok().and_then(|w| now.checked_sub_signed(w)) {
        Some(cutoff) => minute_key(&cutoff),
        // sorts before every key, so nothing is evicted
        None => String::new(),
    }
}

/// Parse a key back into a naive timestamp (charting).
pub fn parse(key: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(key, MINUTE_KEY_FORMAT).ok()
}
