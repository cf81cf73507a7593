//! Timestamp parsing for raw intake input.

use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, Utc};

use super::{StoreResult, ValidationError};

/// Accepted layouts for timestamps without an offset.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parse a timestamp string.
///
/// RFC 3339 input keeps its offset. Input without an offset is taken as
/// written and tagged `+00:00`; no conversion is applied, so the calendar
/// day stays the one the recorder wrote down.
pub fn parse_timestamp(input: &str) -> StoreResult<DateTime<FixedOffset>> {
    let trimmed = input.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(ts);
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc.fix()))
        .ok_or_else(|| ValidationError::InvalidTimestamp(input.to_string()))
}
