// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time parsing and formatting.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

/// Parse a backend timestamp.
///
/// `timestamptz` columns arrive with an offset and are converted to UTC;
/// plain `timestamp` columns have none and are taken as UTC as-is.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    // Postgres renders offsets as "+00" without minutes.
    let with_offset = ["%Y-%m-%dT%H:%M:%S%.f%#z", "%Y-%m-%d %H:%M:%S%.f%#z"]
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(raw, fmt).ok());
    if let Some(dt) = with_offset {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Date-only ISO form (`YYYY-MM-DD`) of a backend timestamp.
///
/// Unparseable input falls back to everything before the first `T`.
pub fn date_only(raw: &str) -> String {
    match parse_timestamp(raw) {
        Some(dt) => dt.format("%Y-%m-%d").to_string(),
        None => raw.split('T').next().unwrap_or_default().to_string(),
    }
}

/// Time of day (`HH:MM`) of a backend timestamp, if it parses.
pub fn time_of_day(raw: &str) -> Option<String> {
    parse_timestamp(raw).map(|dt| dt.format("%H:%M").to_string())
}

/// Whether `date` is a calendar date in `YYYY-MM-DD` form, zero padded.
pub fn is_form_date(date: &str) -> bool {
    date.len() == 10 && NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok()
}

/// Whether `time` is a time of day in `HH:MM` form.
pub fn is_form_time(time: &str) -> bool {
    time.len() == 5 && NaiveTime::parse_from_str(time, "%H:%M").is_ok()
}
