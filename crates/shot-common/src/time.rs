//! Timestamp handling for shot records.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use thiserror::Error;

/// Format used to derive a record id from its timestamp.
pub const RECORD_ID_FORMAT: &str = "%Y%m%d%H%M%S";

/// Naive layouts accepted in addition to RFC 3339. All are interpreted as UTC.
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimeParseError {
    #[error("Invalid time format: {0}")]
    InvalidFormat(String),
}

/// Parse a shot timestamp.
///
/// Accepts RFC 3339 (with offset) and the naive `T`/space separated forms
/// with optional fractional seconds.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, TimeParseError> {
    let trimmed = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(Utc.from_utc_datetime(&ndt));
        }
    }

    Err(TimeParseError::InvalidFormat(s.to_string()))
}

/// Build the record id for a shot timestamp (e.g. `20230605080300`).
pub fn format_record_id(timestamp: &DateTime<Utc>) -> String {
    timestamp.format(RECORD_ID_FORMAT).to_string()
}
