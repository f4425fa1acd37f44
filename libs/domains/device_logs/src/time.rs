//! Parsing of caller-supplied timestamps

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::{LogError, LogResult};

// `%.f` also matches an absent fraction
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse an RFC 3339 timestamp, or an offset-less one taken to be UTC.
pub fn parse_timestamp(input: &str) -> LogResult<DateTime<Utc>> {
    let trimmed = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| LogError::InvalidArgument(format!("unrecognised timestamp '{}'", input)))
}
