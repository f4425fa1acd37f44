use chrono::{DateTime, Utc};
use database::mongodb::aggregation::{ActivityRate, BucketCount, KeyCount};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum::{Display, EnumString};
use validator::{Validate, ValidationError};

/// Free-form payload attached to a log entry
pub type LogDetails = HashMap<String, serde_json::Value>;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_PER_PAGE: u64 = 50;

/// How many devices the per-device statistics report
pub const TOP_DEVICES: i64 = 10;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LogType {
    Info,
    Warning,
    Error,
    StatusChange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct LogContent {
    #[serde(default)]
    #[validate(length(min = 1))]
    pub message: String,
    #[serde(default)]
    pub details: LogDetails,
}

/// A stored log entry. `id` is the store-assigned identifier as a hex string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceLog {
    pub id: String,
    pub device_id: String,
    pub log_type: LogType,
    pub timestamp: DateTime<Utc>,
    pub content: LogContent,
}

/// DTO for recording a log entry
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateLog {
    #[validate(length(min = 1, max = 128))]
    pub device_id: String,
    pub log_type: LogType,
    /// Defaults to the time of the write
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[validate(nested)]
    pub content: LogContent,
}

impl CreateLog {
    pub fn new(
        device_id: impl Into<String>,
        log_type: LogType,
        message: impl Into<String>,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            log_type,
            timestamp: None,
            content: LogContent {
                message: message.into(),
                details: LogDetails::new(),
            },
        }
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_details(mut self, details: LogDetails) -> Self {
        self.content.details = details;
        self
    }
}

fn check_range(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Result<(), ValidationError> {
    match (start, end) {
        (Some(start), Some(end)) if start > end => {
            let mut err = ValidationError::new("time_range");
            err.message = Some("start_time must not be after end_time".into());
            Err(err)
        }
        _ => Ok(()),
    }
}

/// Structured log filter. The time range is half-open: `start_time <= timestamp < end_time`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "log_filter_range"))]
pub struct LogFilter {
    pub device_id: Option<String>,
    pub log_type: Option<LogType>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

fn log_filter_range(filter: &LogFilter) -> Result<(), ValidationError> {
    check_range(filter.start_time, filter.end_time)
}

/// Scope of a statistics query, same half-open range as [`LogFilter`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "stats_filter_range"))]
pub struct LogStatsFilter {
    pub device_id: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

fn stats_filter_range(filter: &LogStatsFilter) -> Result<(), ValidationError> {
    check_range(filter.start_time, filter.end_time)
}

impl From<LogStatsFilter> for LogFilter {
    fn from(filter: LogStatsFilter) -> Self {
        Self {
            device_id: filter.device_id,
            log_type: None,
            start_time: filter.start_time,
            end_time: filter.end_time,
        }
    }
}

/// 1-indexed page selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct PageRequest {
    #[validate(range(min = 1))]
    pub page: u64,
    #[validate(range(min = 1))]
    pub per_page: u64,
}

impl PageRequest {
    pub fn new(page: u64, per_page: u64) -> Self {
        Self { page, per_page }
    }

    /// Documents to skip before this page
    pub fn skip(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.per_page)
    }

    /// Page size as the driver's signed limit
    pub fn limit(&self) -> i64 {
        i64::try_from(self.per_page).unwrap_or(i64::MAX)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE, DEFAULT_PER_PAGE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
    pub pages: u64,
}

impl Pagination {
    pub fn new(request: PageRequest, total: u64) -> Self {
        let pages = if request.per_page == 0 {
            0
        } else {
            total.div_ceil(request.per_page)
        };

        Self {
            page: request.page,
            per_page: request.per_page,
            total,
            pages,
        }
    }
}

/// One page of results.
///
/// `total` is counted separately from the fetch, so when logs expire in
/// between it can exceed what the pages actually hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

/// A search match with its text relevance score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(flatten)]
    pub log: DeviceLog,
    pub score: f64,
}

/// Logging rate of one device over its observed span
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceFrequency {
    pub device_id: String,
    pub count: u64,
    pub first_log: DateTime<Utc>,
    pub last_log: DateTime<Utc>,
    pub duration_hours: f64,
    /// Logs per hour, 0 when all logs share one timestamp
    pub frequency: f64,
}

impl From<ActivityRate> for DeviceFrequency {
    fn from(rate: ActivityRate) -> Self {
        Self {
            device_id: rate.key.unwrap_or_default(),
            count: rate.count,
            first_log: rate.first,
            last_log: rate.last,
            duration_hours: rate.duration_hours,
            frequency: rate.frequency,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogStats {
    pub by_type: Vec<KeyCount>,
    /// Sparse and chronological; hours without logs are absent
    pub hourly: Vec<BucketCount>,
    pub by_device: Vec<KeyCount>,
    pub device_frequency: Vec<DeviceFrequency>,
}
