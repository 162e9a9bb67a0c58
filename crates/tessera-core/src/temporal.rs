//! # Temporal Parsing — Layout-Ordered Timestamps
//!
//! Parses date-time text against a fixed, ordered list of layouts. RFC 3339
//! is tried first; the first layout that matches wins. Unix epoch seconds
//! are accepted separately by [`from_epoch_secs`].
//!
//! ## Normalization
//!
//! Every parsed instant is converted to UTC and rendered by [`to_text`] as
//! RFC 3339 with a `Z` suffix. Sub-second digits are kept only when
//! present, so re-parsing the rendered text yields the same text.
//!
//! Layouts without an offset are interpreted as UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

/// Layouts carrying an explicit offset, tried after RFC 3339 and RFC 2822.
const OFFSET_LAYOUTS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f %z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%a %b %e %H:%M:%S %z %Y",
    "%d %b %y %H:%M %z",
];

/// Layouts without an offset, interpreted as UTC.
const NAIVE_LAYOUTS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%a, %d %b %Y %H:%M:%S GMT",
    "%A, %d-%b-%y %H:%M:%S GMT",
    "%a %b %e %H:%M:%S %Y",
    "%a %b %e %H:%M:%S UTC %Y",
];

/// Date-only layout, interpreted as midnight UTC.
const DATE_LAYOUT: &str = "%Y-%m-%d";

/// Parse date-time text, trying each known layout in order.
///
/// # Errors
///
/// Returns a description of the accepted layouts when none matches.
pub fn parse(text: &str) -> Result<DateTime<Utc>, String> {
    let text = text.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Ok(dt.with_timezone(&Utc));
    }
    for layout in OFFSET_LAYOUTS {
        if let Ok(dt) = DateTime::parse_from_str(text, layout) {
            return Ok(dt.with_timezone(&Utc));
        }
    }
    for layout in NAIVE_LAYOUTS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, layout) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, DATE_LAYOUT) {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }

    Err(format!(
        "no known layout matches; accepted layouts are RFC 3339, RFC 2822, {}, {} and {DATE_LAYOUT}",
        OFFSET_LAYOUTS.join(", "),
        NAIVE_LAYOUTS.join(", "),
    ))
}

/// Create an instant from Unix epoch seconds.
pub fn from_epoch_secs(secs: i64) -> Result<DateTime<Utc>, String> {
    DateTime::from_timestamp(secs, 0).ok_or_else(|| format!("invalid Unix timestamp: {secs}"))
}

/// Render an instant as normalized RFC 3339 text with a `Z` suffix.
pub fn to_text(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}
