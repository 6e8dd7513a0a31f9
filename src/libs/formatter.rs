//! Time formatting for display and for the Jira wire format.
//!
//! ## Formats
//!
//! - `format_time`: `HH:MM:SS`, zero-padded; hours grow past two digits
//! - `format_time_human_readable`: `1h 30m`, `2h`, `45m`, or `less than 1m`
//! - `format_timestamp`: local `YYYY-MM-DD HH:MM` for tables
//! - `to_iso`: RFC 3339 UTC with milliseconds, the form stored in the offline queue
//!
//! Negative durations format as zero; they only arise from inconsistent
//! stored data and are not worth a panic in the presentation layer.

use chrono::{DateTime, Local, SecondsFormat, Utc};

/// The `started` format Jira answers with, e.g. `2024-01-15T09:30:00.000+0000`.
pub const JIRA_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

/// Formats whole seconds as `HH:MM:SS`.
///
/// ```rust
/// use jtimer::libs::formatter::format_time;
///
/// assert_eq!(format_time(3661), "01:01:01");
/// assert_eq!(format_time(59), "00:00:59");
/// ```
pub fn format_time(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!("{:02}:{:02}:{:02}", seconds / 3600, (seconds % 3600) / 60, seconds % 60)
}

/// Formats whole seconds as a short human phrase, dropping seconds.
///
/// ```rust
/// use jtimer::libs::formatter::format_time_human_readable;
///
/// assert_eq!(format_time_human_readable(0), "less than 1m");
/// assert_eq!(format_time_human_readable(3660), "1h 1m");
/// assert_eq!(format_time_human_readable(7200), "2h");
/// ```
pub fn format_time_human_readable(seconds: i64) -> String {
    if seconds < 60 {
        return "less than 1m".to_string();
    }
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    match (hours, minutes) {
        (0, m) => format!("{}m", m),
        (h, 0) => format!("{}h", h),
        (h, m) => format!("{}h {}m", h, m),
    }
}

/// Epoch milliseconds as a UTC timestamp.
pub fn to_datetime(ms: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
}

/// Epoch milliseconds as RFC 3339 (`2024-01-15T09:30:00.000Z`).
pub fn to_iso(ms: i64) -> Option<String> {
    to_datetime(ms).map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Parses a stored `started` value: RFC 3339 first, then Jira's own format.
pub fn parse_started(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_str(value, JIRA_DATETIME_FORMAT))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Epoch milliseconds in local time, for tables.
pub fn format_timestamp(ms: i64) -> String {
    to_datetime(ms).map_or_else(|| "-".to_string(), |dt| dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
}
