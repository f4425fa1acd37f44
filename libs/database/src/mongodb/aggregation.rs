//! Grouping primitive shared by the device and device-log statistics.
//!
//! Every statistic is one `$match` (optional) / `$group` / `$sort` pipeline run
//! as a single round trip. Pipelines are built by pure functions so their
//! shape can be asserted without a server; the `async` wrappers only execute
//! them and decode the output.
//!
//! Ordering rules:
//! - counts by field: count descending, ties broken by key ascending
//! - hourly buckets: chronological
//! - activity rates: frequency descending, ties broken by key ascending
//!
//! Hour buckets are always computed in UTC so that writers and readers in
//! different zones agree on bucket boundaries.

use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;
use mongodb::Collection;
use mongodb::bson::{Bson, Document, doc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{MongoError, from_bson_datetime};

/// Time zone used to derive hour buckets
pub const BUCKET_TIMEZONE: &str = "UTC";

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// One group of a count-by-field statistic.
///
/// `key` is `None` for documents where the field is missing or null, so the
/// counts of all groups always add up to the number of matched documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyCount {
    pub key: Option<String>,
    pub count: u64,
}

/// An hour of the day, truncated in UTC
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HourBucket {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
}

impl HourBucket {
    /// The bucket a timestamp falls into
    pub fn of(dt: DateTime<Utc>) -> Self {
        use chrono::{Datelike, Timelike};

        Self {
            year: dt.year(),
            month: dt.month(),
            day: dt.day(),
            hour: dt.hour(),
        }
    }
}

/// Number of documents in one hour bucket. Empty hours are never reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketCount {
    pub bucket: HourBucket,
    pub count: u64,
}

/// How often a key shows up over the span between its first and last document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRate {
    pub key: Option<String>,
    pub count: u64,
    pub first: DateTime<Utc>,
    pub last: DateTime<Utc>,
    pub duration_hours: f64,
    /// Documents per hour; zero when every document shares one timestamp
    pub frequency: f64,
}

fn match_stage(predicate: Option<Document>) -> Option<Document> {
    predicate
        .filter(|p| !p.is_empty())
        .map(|p| doc! { "$match": p })
}

fn field_path(field: &str) -> String {
    format!("${}", field)
}

fn date_part(operator: &str, date_path: &str) -> Document {
    let mut part = Document::new();
    part.insert(
        operator,
        doc! { "date": date_path, "timezone": BUCKET_TIMEZONE },
    );
    part
}

/// `[$match?, $group by field, $sort count desc / key asc, $limit?]`
pub fn count_by_field_pipeline(
    predicate: Option<Document>,
    field: &str,
    limit: Option<i64>,
) -> Vec<Document> {
    let mut pipeline: Vec<Document> = match_stage(predicate).into_iter().collect();

    pipeline.push(doc! {
        "$group": {
            "_id": field_path(field),
            "count": { "$sum": 1 }
        }
    });
    pipeline.push(doc! { "$sort": { "count": -1, "_id": 1 } });

    if let Some(limit) = limit {
        pipeline.push(doc! { "$limit": limit });
    }

    pipeline
}

/// `[$match?, $group by (year, month, day, hour) of time_field, $sort chronological]`
pub fn hourly_pipeline(predicate: Option<Document>, time_field: &str) -> Vec<Document> {
    let date_path = field_path(time_field);
    let mut pipeline: Vec<Document> = match_stage(predicate).into_iter().collect();

    pipeline.push(doc! {
        "$group": {
            "_id": {
                "year": date_part("$year", &date_path),
                "month": date_part("$month", &date_path),
                "day": date_part("$dayOfMonth", &date_path),
                "hour": date_part("$hour", &date_path),
            },
            "count": { "$sum": 1 }
        }
    });
    pipeline.push(doc! {
        "$sort": { "_id.year": 1, "_id.month": 1, "_id.day": 1, "_id.hour": 1 }
    });

    pipeline
}

/// Per-key first/last timestamps and documents-per-hour, most active first
pub fn activity_rate_pipeline(
    predicate: Option<Document>,
    key_field: &str,
    time_field: &str,
    limit: i64,
) -> Vec<Document> {
    let time_path = field_path(time_field);
    let mut pipeline: Vec<Document> = match_stage(predicate).into_iter().collect();

    pipeline.push(doc! {
        "$group": {
            "_id": field_path(key_field),
            "first": { "$min": time_path.as_str() },
            "last": { "$max": time_path.as_str() },
            "count": { "$sum": 1 }
        }
    });
    pipeline.push(doc! {
        "$addFields": {
            "duration_hours": {
                "$divide": [{ "$subtract": ["$last", "$first"] }, MILLIS_PER_HOUR]
            }
        }
    });
    pipeline.push(doc! {
        "$addFields": {
            "frequency": {
                "$cond": {
                    "if": { "$gt": ["$duration_hours", 0] },
                    "then": { "$divide": ["$count", "$duration_hours"] },
                    "else": 0.0
                }
            }
        }
    });
    pipeline.push(doc! { "$sort": { "frequency": -1, "_id": 1 } });
    pipeline.push(doc! { "$limit": limit });

    pipeline
}

fn as_u64(value: Option<&Bson>) -> Option<u64> {
    match value? {
        Bson::Int32(v) => u64::try_from(*v).ok(),
        Bson::Int64(v) => u64::try_from(*v).ok(),
        Bson::Double(v) if *v >= 0.0 => Some(*v as u64),
        _ => None,
    }
}

fn as_f64(value: Option<&Bson>) -> Option<f64> {
    match value? {
        Bson::Int32(v) => Some(f64::from(*v)),
        Bson::Int64(v) => Some(*v as f64),
        Bson::Double(v) => Some(*v),
        _ => None,
    }
}

fn as_key(value: Option<&Bson>) -> Option<String> {
    match value? {
        Bson::Null | Bson::Undefined => None,
        Bson::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn as_datetime(doc: &Document, field: &str) -> Result<DateTime<Utc>, MongoError> {
    doc.get_datetime(field)
        .map(|dt| from_bson_datetime(*dt))
        .map_err(|_| MongoError::MalformedDocument(format!("'{}' is not a date in {}", field, doc)))
}

fn count_of(doc: &Document) -> Result<u64, MongoError> {
    as_u64(doc.get("count"))
        .ok_or_else(|| MongoError::MalformedDocument(format!("missing count in {}", doc)))
}

/// Decode one output document of [`count_by_field_pipeline`]
pub fn parse_key_count(doc: &Document) -> Result<KeyCount, MongoError> {
    Ok(KeyCount {
        key: as_key(doc.get("_id")),
        count: count_of(doc)?,
    })
}

/// Decode one output document of [`hourly_pipeline`]
pub fn parse_bucket_count(doc: &Document) -> Result<BucketCount, MongoError> {
    let id = doc
        .get_document("_id")
        .map_err(|_| MongoError::MalformedDocument(format!("bucket without _id in {}", doc)))?;

    let part = |name: &str| {
        as_u64(id.get(name)).ok_or_else(|| {
            MongoError::MalformedDocument(format!("bucket without '{}' in {}", name, doc))
        })
    };

    Ok(BucketCount {
        bucket: HourBucket {
            year: part("year")? as i32,
            month: part("month")? as u32,
            day: part("day")? as u32,
            hour: part("hour")? as u32,
        },
        count: count_of(doc)?,
    })
}

/// Decode one output document of [`activity_rate_pipeline`]
pub fn parse_activity_rate(doc: &Document) -> Result<ActivityRate, MongoError> {
    Ok(ActivityRate {
        key: as_key(doc.get("_id")),
        count: count_of(doc)?,
        first: as_datetime(doc, "first")?,
        last: as_datetime(doc, "last")?,
        duration_hours: as_f64(doc.get("duration_hours")).unwrap_or(0.0),
        frequency: as_f64(doc.get("frequency")).unwrap_or(0.0),
    })
}

#[instrument(
    skip(collection, pipeline),
    fields(collection = %collection.name(), stages = pipeline.len())
)]
async fn run<T>(
    collection: &Collection<T>,
    pipeline: Vec<Document>,
) -> Result<Vec<Document>, MongoError>
where
    T: Send + Sync,
{
    debug!(?pipeline, "Running aggregation");
    let cursor = collection.aggregate(pipeline).await?;
    let docs: Vec<Document> = cursor.try_collect().await?;
    Ok(docs)
}

/// Count documents per distinct value of `field`
pub async fn count_by_field<T>(
    collection: &Collection<T>,
    predicate: Option<Document>,
    field: &str,
    limit: Option<i64>,
) -> Result<Vec<KeyCount>, MongoError>
where
    T: Send + Sync,
{
    run(collection, count_by_field_pipeline(predicate, field, limit))
        .await?
        .iter()
        .map(parse_key_count)
        .collect()
}

/// Count documents per UTC hour of `time_field` (sparse series)
pub async fn count_by_hour<T>(
    collection: &Collection<T>,
    predicate: Option<Document>,
    time_field: &str,
) -> Result<Vec<BucketCount>, MongoError>
where
    T: Send + Sync,
{
    run(collection, hourly_pipeline(predicate, time_field))
        .await?
        .iter()
        .map(parse_bucket_count)
        .collect()
}

/// Documents-per-hour for each distinct `key_field`, the `limit` most active first
pub async fn activity_rates<T>(
    collection: &Collection<T>,
    predicate: Option<Document>,
    key_field: &str,
    time_field: &str,
    limit: i64,
) -> Result<Vec<ActivityRate>, MongoError>
where
    T: Send + Sync,
{
    run(
        collection,
        activity_rate_pipeline(predicate, key_field, time_field, limit),
    )
    .await?
    .iter()
    .map(parse_activity_rate)
    .collect()
}
