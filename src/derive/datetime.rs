use std::fmt;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};

const DISPLAY_FORMAT: &str = "%-m/%-d/%Y %I:%M %p";

/// Formats a stored announcement timestamp for display in local time,
/// e.g. `"3/5/2024 02:30 PM"`.
pub fn format_date_time(iso: &str) -> String {
    format_date_time_in(iso, &Local)
}

/// Same as [`format_date_time`] for an explicit time zone.
///
/// Empty input yields an empty string; input that is not a recognizable
/// timestamp is returned unchanged.
pub fn format_date_time_in<Tz>(iso: &str, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    if iso.is_empty() {
        return String::new();
    }
    match parse_timestamp(iso, tz) {
        Some(at) => at.format(DISPLAY_FORMAT).to_string(),
        None => iso.to_string(),
    }
}

/// Accepts RFC 3339, an offset-less date-time (read as local to `tz`), or a
/// bare date (read as UTC midnight).
fn parse_timestamp<Tz: TimeZone>(iso: &str, tz: &Tz) -> Option<DateTime<Tz>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(iso) {
        return Some(at.with_timezone(tz));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(iso, format) {
            return tz.from_local_datetime(&naive).earliest();
        }
    }

    let midnight = NaiveDate::parse_from_str(iso, "%Y-%m-%d")
        .ok()?
        .and_hms_opt(0, 0, 0)?;
    Some(Utc.from_utc_datetime(&midnight).with_timezone(tz))
}
