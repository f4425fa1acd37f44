//! MongoDB implementation of DeviceLogRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use core_config::retention::RetentionConfig;
use database::mongodb::{
    aggregation, ensure_indexes, from_bson_datetime, to_bson_datetime, truncate_to_millis,
};
use futures_util::TryStreamExt;
use mongodb::{
    bson::{self, doc, from_document, oid::ObjectId, Bson, Document},
    options::{FindOptions, IndexOptions},
    Collection, Database, IndexModel,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, instrument};

use crate::error::{LogError, LogResult};
use crate::models::{
    CreateLog, DeviceFrequency, DeviceLog, LogContent, LogDetails, LogFilter, LogStats,
    LogStatsFilter, LogType, Page, PageRequest, Pagination, SearchHit, TOP_DEVICES,
};
use crate::repository::DeviceLogRepository;

pub const DEVICE_LOGS_COLLECTION: &str = "device_logs";

/// Projected field carrying the `$text` relevance score
const SCORE_FIELD: &str = "score";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LogDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    device_id: String,
    log_type: LogType,
    timestamp: bson::DateTime,
    content: LogContent,
    /// Scalar values of `content.details`, flattened so the text index can see them
    #[serde(default, skip_serializing_if = "String::is_empty")]
    details_text: String,
}

impl LogDocument {
    fn new(input: CreateLog, timestamp: DateTime<Utc>) -> Self {
        let details_text = details_text(&input.content.details);
        Self {
            id: ObjectId::new(),
            device_id: input.device_id,
            log_type: input.log_type,
            timestamp: to_bson_datetime(timestamp),
            content: input.content,
            details_text,
        }
    }

    /// Encode for insertion; values BSON cannot hold are the caller's fault
    fn encode(&self) -> LogResult<Document> {
        Ok(bson::to_document(self)?)
    }
}

/// Join the string and numeric leaves of a details mapping, nested ones included
fn details_text(details: &LogDetails) -> String {
    fn collect(value: &Value, out: &mut Vec<String>) {
        match value {
            Value::String(s) => out.push(s.clone()),
            Value::Number(n) => out.push(n.to_string()),
            Value::Array(items) => items.iter().for_each(|v| collect(v, out)),
            Value::Object(map) => map.values().for_each(|v| collect(v, out)),
            Value::Bool(_) | Value::Null => {}
        }
    }

    let mut out = Vec::new();
    details.values().for_each(|v| collect(v, &mut out));
    out.join(" ")
}

impl From<LogDocument> for DeviceLog {
    fn from(doc: LogDocument) -> Self {
        Self {
            id: doc.id.to_hex(),
            device_id: doc.device_id,
            log_type: doc.log_type,
            timestamp: from_bson_datetime(doc.timestamp),
            content: doc.content,
        }
    }
}

/// Parse a hex log id, rejecting anything that is not an ObjectId
pub fn parse_log_id(log_id: &str) -> LogResult<ObjectId> {
    ObjectId::parse_str(log_id.trim())
        .map_err(|_| LogError::InvalidArgument(format!("malformed log id '{}'", log_id)))
}

/// MongoDB implementation of the DeviceLogRepository
pub struct MongoDeviceLogRepository {
    collection: Collection<LogDocument>,
    retention: Duration,
}

impl MongoDeviceLogRepository {
    /// Repository over `device_logs` with the default retention window
    pub fn new(db: &Database) -> Self {
        Self::with_collection(db, DEVICE_LOGS_COLLECTION)
    }

    pub fn with_collection(db: &Database, collection_name: &str) -> Self {
        Self {
            collection: db.collection::<LogDocument>(collection_name),
            retention: RetentionConfig::default().log_retention(),
        }
    }

    /// Use a configured retention window for the TTL index
    pub fn with_retention(mut self, retention: &RetentionConfig) -> Self {
        self.retention = retention.log_retention();
        self
    }

    /// Index set required by the log queries
    ///
    /// Changing `retention` on a collection that already carries the TTL index
    /// makes `createIndexes` fail with an options conflict.
    pub fn index_models(retention: Duration) -> Vec<IndexModel> {
        vec![
            // TTL: the server reaps logs once `timestamp` is older than the window
            IndexModel::builder()
                .keys(doc! { "timestamp": 1 })
                .options(
                    IndexOptions::builder()
                        .expire_after(retention)
                        .name("idx_timestamp_ttl".to_string())
                        .build(),
                )
                .build(),
            // Logs for one device, most recent first
            IndexModel::builder()
                .keys(doc! { "device_id": 1, "timestamp": -1 })
                .options(
                    IndexOptions::builder()
                        .name("idx_device_timestamp".to_string())
                        .build(),
                )
                .build(),
            IndexModel::builder()
                .keys(doc! { "log_type": 1 })
                .options(
                    IndexOptions::builder()
                        .name("idx_log_type".to_string())
                        .build(),
                )
                .build(),
            IndexModel::builder()
                .keys(doc! { "content.message": "text", "details_text": "text" })
                .options(
                    IndexOptions::builder()
                        .name("idx_content_text".to_string())
                        .build(),
                )
                .build(),
        ]
    }

    pub async fn init_indexes(&self) -> LogResult<()> {
        ensure_indexes(&self.collection, Self::index_models(self.retention)).await?;
        info!(
            retention_secs = self.retention.as_secs(),
            "Device log indexes created successfully"
        );
        Ok(())
    }

    fn build_filter(filter: &LogFilter) -> Document {
        let mut doc = doc! {};

        if let Some(ref device_id) = filter.device_id {
            doc.insert("device_id", device_id.as_str());
        }

        if let Some(log_type) = filter.log_type {
            doc.insert("log_type", log_type.to_string());
        }

        // Half-open range: start inclusive, end exclusive
        if filter.start_time.is_some() || filter.end_time.is_some() {
            let mut range = doc! {};
            if let Some(start) = filter.start_time {
                range.insert("$gte", to_bson_datetime(start));
            }
            if let Some(end) = filter.end_time {
                range.insert("$lt", to_bson_datetime(end));
            }
            doc.insert("timestamp", range);
        }

        doc
    }

    fn parse_hit(mut doc: Document) -> LogResult<SearchHit> {
        let score = match doc.remove(SCORE_FIELD) {
            Some(Bson::Double(s)) => s,
            Some(Bson::Int32(s)) => f64::from(s),
            Some(Bson::Int64(s)) => s as f64,
            _ => {
                return Err(LogError::StoreUnavailable(
                    "search result without a text score".to_string(),
                ))
            }
        };

        let stored: LogDocument = from_document(doc)?;
        Ok(SearchHit {
            log: stored.into(),
            score,
        })
    }
}

#[async_trait]
impl DeviceLogRepository for MongoDeviceLogRepository {
    #[instrument(
        skip(self, input),
        fields(device_id = %input.device_id, log_type = %input.log_type)
    )]
    async fn create(&self, input: CreateLog) -> LogResult<DeviceLog> {
        let timestamp = truncate_to_millis(input.timestamp.unwrap_or_else(Utc::now));
        let stored = LogDocument::new(input, timestamp);

        self.collection
            .clone_with_type::<Document>()
            .insert_one(stored.encode()?)
            .await?;

        info!(log_id = %stored.id, "Device log created successfully");
        Ok(stored.into())
    }

    #[instrument(skip(self))]
    async fn list(&self, filter: &LogFilter, page: PageRequest) -> LogResult<Page<DeviceLog>> {
        let mongo_filter = Self::build_filter(filter);
        debug!(filter = %mongo_filter, skip = page.skip(), "Listing device logs");

        let total = self.collection.count_documents(mongo_filter.clone()).await?;

        let options = FindOptions::builder()
            .sort(doc! { "timestamp": -1, "_id": -1 })
            .skip(page.skip())
            .limit(page.limit())
            .build();

        let cursor = self
            .collection
            .find(mongo_filter)
            .with_options(options)
            .await?;
        let stored: Vec<LogDocument> = cursor.try_collect().await?;

        Ok(Page {
            items: stored.into_iter().map(DeviceLog::from).collect(),
            pagination: Pagination::new(page, total),
        })
    }

    #[instrument(skip(self))]
    async fn delete(&self, log_id: &str) -> LogResult<bool> {
        let id = parse_log_id(log_id)?;
        let result = self.collection.delete_one(doc! { "_id": id }).await?;

        let deleted = result.deleted_count > 0;
        if deleted {
            info!(log_id = %id, "Device log deleted successfully");
        }
        Ok(deleted)
    }

    #[instrument(skip(self))]
    async fn search(&self, keyword: &str, page: PageRequest) -> LogResult<Page<SearchHit>> {
        let filter = doc! { "$text": { "$search": keyword } };

        let total = self.collection.count_documents(filter.clone()).await?;

        let options = FindOptions::builder()
            .projection(doc! { SCORE_FIELD: { "$meta": "textScore" } })
            .sort(doc! { SCORE_FIELD: { "$meta": "textScore" }, "_id": -1 })
            .skip(page.skip())
            .limit(page.limit())
            .build();

        // Raw documents so the projected score can be read before decoding
        let cursor = self
            .collection
            .clone_with_type::<Document>()
            .find(filter)
            .with_options(options)
            .await?;
        let docs: Vec<Document> = cursor.try_collect().await?;

        let items = docs
            .into_iter()
            .map(Self::parse_hit)
            .collect::<LogResult<Vec<_>>>()?;

        Ok(Page {
            items,
            pagination: Pagination::new(page, total),
        })
    }

    #[instrument(skip(self))]
    async fn stats(&self, filter: &LogStatsFilter) -> LogResult<LogStats> {
        let predicate = Self::build_filter(&LogFilter::from(filter.clone()));

        let by_type =
            aggregation::count_by_field(&self.collection, Some(predicate.clone()), "log_type", None)
                .await?;
        let hourly =
            aggregation::count_by_hour(&self.collection, Some(predicate.clone()), "timestamp")
                .await?;
        let by_device = aggregation::count_by_field(
            &self.collection,
            Some(predicate.clone()),
            "device_id",
            Some(TOP_DEVICES),
        )
        .await?;
        let device_frequency = aggregation::activity_rates(
            &self.collection,
            Some(predicate),
            "device_id",
            "timestamp",
            TOP_DEVICES,
        )
        .await?
        .into_iter()
        .map(DeviceFrequency::from)
        .collect();

        Ok(LogStats {
            by_type,
            hourly,
            by_device,
            device_frequency,
        })
    }
}
