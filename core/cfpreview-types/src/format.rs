//! Display helpers for preview chrome (titles, dates, file sizes).

use crate::Entry;
use chrono::{DateTime, NaiveDate, Utc};

/// `Jan 05, 2024`
pub const DATE_FORMAT: &str = "%b %d, %Y";

/// `Jan 05, 2024 at 14:30`
pub const DATETIME_FORMAT: &str = "%b %d, %Y at %H:%M";

const INVALID_DATE: &str = "Invalid date";
const UNKNOWN_TIME: &str = "Unknown time";

/// Parses an ISO-8601 timestamp or calendar date.
pub fn parse_iso(input: &str) -> crate::Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| crate::Error::InvalidTimestamp(input.to_string()))
}

/// Formats a date with a strftime pattern, or `Invalid date`.
pub fn format_date(input: &str, pattern: &str) -> String {
    match parse_iso(input) {
        Ok(dt) => dt.format(pattern).to_string(),
        Err(_) => INVALID_DATE.to_string(),
    }
}

pub fn format_datetime(input: &str) -> String {
    format_date(input, DATETIME_FORMAT)
}

/// Human distance between `input` and `now` (`3 days ago`, `in about 2 hours`).
pub fn time_ago(input: &str, now: DateTime<Utc>) -> String {
    let Ok(then) = parse_iso(input) else {
        return UNKNOWN_TIME.to_string();
    };

    let delta = now.signed_duration_since(then);
    let seconds = delta.num_seconds().unsigned_abs();
    let distance = distance_words(seconds);

    if delta.num_seconds() < 0 {
        format!("in {distance}")
    } else {
        format!("{distance} ago")
    }
}

fn distance_words(seconds: u64) -> String {
    const MINUTE: u64 = 60;
    const HOUR: u64 = 60 * MINUTE;
    const DAY: u64 = 24 * HOUR;
    const MONTH: u64 = 30 * DAY;
    const YEAR: u64 = 365 * DAY;

    let round = |value: u64, unit: u64| (value + unit / 2) / unit;
    let plural = |n: u64, unit: &str| {
        if n == 1 {
            format!("1 {unit}")
        } else {
            format!("{n} {unit}s")
        }
    };

    match seconds {
        s if s < 30 => "less than a minute".to_string(),
        s if s < 90 => "1 minute".to_string(),
        s if s < 45 * MINUTE => plural(round(s, MINUTE), "minute"),
        s if s < 90 * MINUTE => "about 1 hour".to_string(),
        s if s < DAY => format!("about {}", plural(round(s, HOUR), "hour")),
        s if s < 42 * HOUR => "1 day".to_string(),
        s if s < MONTH => plural(round(s, DAY), "day"),
        s if s < 45 * DAY => "about 1 month".to_string(),
        s if s < 60 * DAY => "about 2 months".to_string(),
        s if s < YEAR => plural(round(s, MONTH).min(11), "month"),
        s => format!("about {}", plural(round(s, YEAR), "year")),
    }
}

/// Best display title for an entry: `title`, then `name`, then a short id.
pub fn entry_title(entry: &Entry) -> String {
    ["title", "name"]
        .iter()
        .filter_map(|field| entry.field_str(field))
        .find(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Entry {}", entry.id().short(8)))
}

/// Human readable byte size (`0 Bytes`, `1.5 KB`, `2 MB`).
pub fn file_size(bytes: u64) -> String {
    const SIZES: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let exponent = ((bytes as f64).ln() / 1024f64.ln()).floor() as usize;
    let exponent = exponent.min(SIZES.len() - 1);
    let scaled = bytes as f64 / 1024f64.powi(exponent as i32);
    let rounded = (scaled * 100.0).round() / 100.0;

    format!("{rounded} {}", SIZES[exponent])
}
