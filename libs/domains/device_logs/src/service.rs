//! Device Log Service - input checks in front of a DeviceLogRepository

use std::sync::Arc;
use tracing::instrument;
use validator::Validate;

use crate::error::{LogError, LogResult};
use crate::models::{
    CreateLog, DeviceLog, LogFilter, LogStats, LogStatsFilter, Page, PageRequest, SearchHit,
};
use crate::repository::DeviceLogRepository;

/// Device log operations
pub struct DeviceLogService<R: DeviceLogRepository> {
    repository: Arc<R>,
}

impl<R: DeviceLogRepository> DeviceLogService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    /// Page through logs newest first.
    ///
    /// A page past the last one is empty, not an error.
    #[instrument(skip(self))]
    pub async fn list_logs(
        &self,
        filter: LogFilter,
        page: PageRequest,
    ) -> LogResult<Page<DeviceLog>> {
        filter.validate()?;
        page.validate()?;
        self.repository.list(&filter, page).await
    }

    #[instrument(skip(self, input), fields(device_id = %input.device_id))]
    pub async fn create_log(&self, input: CreateLog) -> LogResult<DeviceLog> {
        input.validate()?;
        self.repository.create(input).await
    }

    /// Returns whether a log was removed
    #[instrument(skip(self))]
    pub async fn delete_log(&self, log_id: &str) -> LogResult<bool> {
        self.repository.delete(log_id).await
    }

    /// Full-text search, most relevant first. Takes no structured filters.
    #[instrument(skip(self))]
    pub async fn search_logs(
        &self,
        keyword: &str,
        page: PageRequest,
    ) -> LogResult<Page<SearchHit>> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(LogError::InvalidArgument(
                "search keyword must not be blank".to_string(),
            ));
        }
        page.validate()?;
        self.repository.search(keyword, page).await
    }

    #[instrument(skip(self))]
    pub async fn log_stats(&self, filter: LogStatsFilter) -> LogResult<LogStats> {
        filter.validate()?;
        self.repository.stats(&filter).await
    }
}

impl<R: DeviceLogRepository> Clone for DeviceLogService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LogType, Pagination};
    use crate::repository::MockDeviceLogRepository;
    use chrono::{Duration, Utc};
    use mockall::predicate::eq;

    fn empty_page<T>(page: PageRequest) -> Page<T> {
        Page {
            items: Vec::new(),
            pagination: Pagination::new(page, 0),
        }
    }

    #[tokio::test]
    async fn test_list_rejects_zero_per_page() {
        let mut mock_repo = MockDeviceLogRepository::new();
        mock_repo.expect_list().never();

        let service = DeviceLogService::new(mock_repo);
        let err = service
            .list_logs(LogFilter::default(), PageRequest::new(1, 0))
            .await
            .unwrap_err();

        assert!(matches!(err, LogError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_list_rejects_inverted_time_range() {
        let mut mock_repo = MockDeviceLogRepository::new();
        mock_repo.expect_list().never();

        let now = Utc::now();
        let filter = LogFilter {
            start_time: Some(now),
            end_time: Some(now - Duration::minutes(1)),
            ..Default::default()
        };

        let service = DeviceLogService::new(mock_repo);
        let err = service
            .list_logs(filter, PageRequest::default())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "invalid_argument");
    }

    #[tokio::test]
    async fn test_list_forwards_filter_and_page() {
        let mut mock_repo = MockDeviceLogRepository::new();
        mock_repo
            .expect_list()
            .withf(|filter, page| {
                filter.device_id.as_deref() == Some("dev1") && page.page == 2 && page.per_page == 10
            })
            .returning(|_, page| Ok(empty_page(page)));

        let service = DeviceLogService::new(mock_repo);
        let filter = LogFilter {
            device_id: Some("dev1".to_string()),
            ..Default::default()
        };
        let page = service
            .list_logs(filter, PageRequest::new(2, 10))
            .await
            .unwrap();

        assert_eq!(page.pagination.page, 2);
        assert!(page.items.is_empty());
    }

    #[tokio::test]
    async fn test_search_rejects_blank_keyword() {
        let mut mock_repo = MockDeviceLogRepository::new();
        mock_repo.expect_search().never();

        let service = DeviceLogService::new(mock_repo);
        let err = service
            .search_logs("   ", PageRequest::default())
            .await
            .unwrap_err();

        assert!(matches!(err, LogError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_search_trims_keyword() {
        let mut mock_repo = MockDeviceLogRepository::new();
        mock_repo
            .expect_search()
            .with(eq("overheat"), eq(PageRequest::default()))
            .times(1)
            .returning(|_, page| Ok(empty_page(page)));

        let service = DeviceLogService::new(mock_repo);
        service
            .search_logs("  overheat ", PageRequest::default())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_create_rejects_empty_message() {
        let mut mock_repo = MockDeviceLogRepository::new();
        mock_repo.expect_create().never();

        let service = DeviceLogService::new(mock_repo);
        let result = service
            .create_log(CreateLog::new("dev1", LogType::Info, ""))
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_stats_rejects_inverted_range() {
        let mut mock_repo = MockDeviceLogRepository::new();
        mock_repo.expect_stats().never();

        let now = Utc::now();
        let service = DeviceLogService::new(mock_repo);
        let result = service
            .log_stats(LogStatsFilter {
                device_id: None,
                start_time: Some(now),
                end_time: Some(now - Duration::hours(1)),
            })
            .await;

        assert!(matches!(result, Err(LogError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_delete_passes_through() {
        let mut mock_repo = MockDeviceLogRepository::new();
        mock_repo
            .expect_delete()
            .with(eq("65f000000000000000000000"))
            .returning(|_| Ok(true));

        let service = DeviceLogService::new(mock_repo);
        assert!(service
            .delete_log("65f000000000000000000000")
            .await
            .unwrap());
    }
}
