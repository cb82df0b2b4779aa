//! Utility functions and helpers.

pub mod http;
pub mod pacing;

use chrono::{DateTime, NaiveDateTime, Utc};

pub use pacing::Pacer;

/// Parse a provider timestamp into UTC.
///
/// Accepts RFC 3339 with any offset and any fractional precision, and falls
/// back to an offset-less ISO form which is read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Round to a fixed number of decimal places.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
