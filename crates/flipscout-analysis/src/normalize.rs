//! Record-level normalization of raw provider fields.
//!
//! Both functions are pure and side-effect free. A value that does not
//! normalize is reported as `None` and the caller drops the record; nothing
//! here coerces bad input to zero.

use chrono::{DateTime, Utc};

/// Extract a finite, non-negative price from a raw price string.
///
/// Currency symbols, thousands separators, and any other non-numeric
/// characters are stripped before parsing; a second decimal point ends the
/// number, so version-like leftovers ("1.2.3") parse as their prefix.
#[must_use]
pub fn parse_price(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    // A second decimal point ends the number (price ranges, version
    // strings); everything before it is the candidate.
    let mut seen_dot = false;
    let end = cleaned
        .char_indices()
        .find_map(|(i, c)| {
            if c == '.' {
                if seen_dot {
                    return Some(i);
                }
                seen_dot = true;
            }
            None
        })
        .unwrap_or(cleaned.len());

    let value: f64 = cleaned[..end].parse().ok()?;
    (value.is_finite() && value >= 0.0).then_some(value)
}

/// Interpret a raw creation time as seconds since the Unix epoch.
///
/// Zero, negative, and out-of-range values are all rejected — providers use
/// 0 as a "no timestamp" placeholder.
#[must_use]
pub fn parse_epoch_seconds(secs: i64) -> Option<DateTime<Utc>> {
    if secs <= 0 {
        return None;
    }
    DateTime::from_timestamp(secs, 0)
}
