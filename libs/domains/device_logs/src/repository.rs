use async_trait::async_trait;

use crate::error::LogResult;
use crate::models::{
    CreateLog, DeviceLog, LogFilter, LogStats, LogStatsFilter, Page, PageRequest, SearchHit,
};

/// Repository trait for DeviceLog persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeviceLogRepository: Send + Sync {
    /// Insert a log; a missing timestamp becomes the write time
    async fn create(&self, input: CreateLog) -> LogResult<DeviceLog>;

    /// One page of matching logs, newest first
    async fn list(&self, filter: &LogFilter, page: PageRequest) -> LogResult<Page<DeviceLog>>;

    /// Delete a log by id, reporting whether one was removed
    async fn delete(&self, log_id: &str) -> LogResult<bool>;

    /// One page of text matches, most relevant first
    async fn search(&self, keyword: &str, page: PageRequest) -> LogResult<Page<SearchHit>>;

    async fn stats(&self, filter: &LogStatsFilter) -> LogResult<LogStats>;
}
