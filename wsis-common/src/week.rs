//! Reporting-week helpers
//!
//! Reporting weeks use the ISO-8601 week rule (the week containing the
//! year's first Thursday), formatted `YYYY-Www` with a zero-padded week
//! number. Zero padding makes lexicographic order equal chronological
//! order, which the dashboard's week sorting relies on.

use chrono::{Datelike, NaiveDate, Utc};

/// Format the reporting week for a date, e.g. `2025-W30`
pub fn week_of(date: NaiveDate) -> String {
    let iso = date.iso_week();
    format!("{}-W{:02}", iso.year(), iso.week())
}

/// Reporting week of the current date
pub fn current_week() -> String {
    week_of(Utc::now().date_naive())
}

/// Validate the `YYYY-Www` format (week 01-53)
pub fn is_valid_week(value: &str) -> bool {
    let bytes = value.as_bytes();
    if bytes.len() != 8 || bytes[4] != b'-' || bytes[5] != b'W' {
        return false;
    }
    if !bytes[..4].iter().all(u8::is_ascii_digit) {
        return false;
    }
    match value[6..8].parse::<u32>() {
        Ok(week) => (1..=53).contains(&week),
        Err(_) => false,
    }
}
