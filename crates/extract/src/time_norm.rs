// ABOUTME: Date normalization for feed and board date strings.
// ABOUTME: An ordered format cascade; strings matching no format pass through untouched.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Normalizes a source date string to `YYYY-MM-DD`.
///
/// The cascade, first success wins:
/// 1. RFC-822 style with a literal `GMT` suffix ("Wed, 02 Jul 2025 23:17:42 GMT")
/// 2. RFC-822 style with a numeric offset ("Mon, 24 Jun 2025 10:30:00 +0900")
/// 3. Space-separated datetime ("2025-06-24 16:03:22")
/// 4. ISO-8601 - keep the part before the `T` separator
///
/// A string matching none of these is returned verbatim; the raw text is
/// never discarded and the function is a no-op on its own output.
pub fn normalize_date(raw: &str) -> String {
    let s = raw.trim();
    if s.is_empty() {
        return String::new();
    }

    if let Some(date) = parse_source_date(s) {
        return date.format("%Y-%m-%d").to_string();
    }

    // ISO-8601 with a time component: "2025-06-24T16:03:22", with or
    // without an offset. Only the date portion is kept.
    if let Some((date_part, _)) = s.split_once('T') {
        if NaiveDate::parse_from_str(date_part, "%Y-%m-%d").is_ok() {
            return date_part.to_string();
        }
    }

    raw.to_string()
}

/// Tries the explicit datetime formats, in order.
fn parse_source_date(s: &str) -> Option<NaiveDate> {
    if s.ends_with("GMT") {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%a, %d %b %Y %H:%M:%S GMT") {
            return Some(dt.date());
        }
    }

    // Numeric offset variant; the date is taken in the source's own zone.
    if let Ok(dt) = DateTime::parse_from_str(s, "%a, %d %b %Y %H:%M:%S %z") {
        return Some(dt.date_naive());
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.date());
    }

    None
}
