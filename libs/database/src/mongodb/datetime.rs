//! Conversions between chrono timestamps and BSON dates.
//!
//! BSON dates carry millisecond precision; anything finer is dropped on write,
//! so values are truncated before they are handed back to callers.

use chrono::{DateTime, Utc};
use mongodb::bson;

pub fn to_bson_datetime(dt: DateTime<Utc>) -> bson::DateTime {
    bson::DateTime::from_millis(dt.timestamp_millis())
}

/// BSON dates outside chrono's range clamp to its bounds
pub fn from_bson_datetime(dt: bson::DateTime) -> DateTime<Utc> {
    let millis = dt.timestamp_millis();
    DateTime::<Utc>::from_timestamp_millis(millis).unwrap_or(if millis < 0 {
        DateTime::<Utc>::MIN_UTC
    } else {
        DateTime::<Utc>::MAX_UTC
    })
}

/// Drop sub-millisecond precision so the value round-trips through the store unchanged
pub fn truncate_to_millis(dt: DateTime<Utc>) -> DateTime<Utc> {
    from_bson_datetime(to_bson_datetime(dt))
}
