use cfpreview_types::format::{
    entry_title, file_size, format_date, format_datetime, parse_iso, time_ago, DATE_FORMAT,
};
use cfpreview_types::Entry;
use chrono::{Duration, Utc};

// ── Dates ────────────────────────────────────────────────────────

#[test]
fn format_date_default_pattern() {
    assert_eq!(format_date("2024-01-05T10:00:00Z", DATE_FORMAT), "Jan 05, 2024");
    assert_eq!(format_date("2024-03-15", DATE_FORMAT), "Mar 15, 2024");
}

#[test]
fn format_datetime_includes_time() {
    assert_eq!(format_datetime("2024-01-05T14:30:00Z"), "Jan 05, 2024 at 14:30");
}

#[test]
fn invalid_dates() {
    assert!(parse_iso("yesterday").is_err());
    assert_eq!(format_date("yesterday", DATE_FORMAT), "Invalid date");
    assert_eq!(format_datetime(""), "Invalid date");
    assert_eq!(time_ago("nope", Utc::now()), "Unknown time");
}

#[test]
fn time_ago_past_and_future() {
    let now = Utc::now();
    let past = (now - Duration::days(3)).to_rfc3339();
    let future = (now + Duration::minutes(10)).to_rfc3339();

    assert_eq!(time_ago(&past, now), "3 days ago");
    assert_eq!(time_ago(&future, now), "in 10 minutes");
}

// ── Titles ───────────────────────────────────────────────────────

#[test]
fn entry_title_prefers_title_then_name() {
    let titled = Entry::new("e1", "blogPost").with_field("title", "Hello").with_field("name", "x");
    let named = Entry::new("e2", "author").with_field("name", "Ada");
    let bare = Entry::new("3k9Xq2LmPz", "category");

    assert_eq!(entry_title(&titled), "Hello");
    assert_eq!(entry_title(&named), "Ada");
    assert_eq!(entry_title(&bare), "Entry 3k9Xq2Lm");
}

// ── File sizes ───────────────────────────────────────────────────

#[test]
fn file_sizes() {
    assert_eq!(file_size(0), "0 Bytes");
    assert_eq!(file_size(512), "512 Bytes");
    assert_eq!(file_size(1024), "1 KB");
    assert_eq!(file_size(1536), "1.5 KB");
    assert_eq!(file_size(5 * 1024 * 1024), "5 MB");
    assert_eq!(file_size(3 * 1024 * 1024 * 1024), "3 GB");
}
