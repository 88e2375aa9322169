//! Timestamp normalization and ordering helpers.
//!
//! Sensor logs carry timestamps as free-form strings. Gateways on trucks
//! write RFC 3339 with an offset, the room loggers write naive local
//! `YYYY-MM-DD HH:MM:SS`. Everything is normalized to a `NaiveDateTime`
//! (offsets converted to UTC) so readings from different sources share one
//! total order.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::model::{ColdChainError, Result};

/// Naive layouts tried in order after RFC 3339.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
];

/// Parses a raw log timestamp into a comparable instant.
///
/// Accepted forms:
/// - RFC 3339 / ISO 8601 with offset (`2024-06-01T08:15:00-05:00`), converted to UTC
/// - `2024-06-01 08:15:00` and `2024-06-01T08:15:00`, optional fractional seconds
/// - `2024-06-01 08:15`
/// - `2024/06/01 08:15:00`
/// - `2024-06-01` (midnight)
///
/// Leading and trailing whitespace is ignored. Anything else is a
/// `TimestampParse` error carrying the original value; nothing is coerced
/// to a default instant.
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime> {
    let trimmed = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.naive_utc());
    }

    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(dt);
        }
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or_else(|| ColdChainError::TimestampParse {
            raw_value: raw.to_string(),
        })
}

/// Ordering that puts the most recent instant first.
pub fn newest_first(a: &NaiveDateTime, b: &NaiveDateTime) -> Ordering {
    b.cmp(a)
}
