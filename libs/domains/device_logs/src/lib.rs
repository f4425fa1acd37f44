//! Device Logs Domain
//!
//! Event logs in the `device_logs` collection: creation, paginated listing
//! newest first, relevance-ranked full-text search and time-bucketed
//! statistics. Logs expire through a TTL index, so any document may vanish
//! between two calls; every operation tolerates that.
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_device_logs::{
//!     DeviceLogService, LogFilter, MongoDeviceLogRepository, PageRequest,
//! };
//! use mongodb::Client;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::with_uri_str("mongodb://localhost:27017").await?;
//! let db = client.database("smart_home");
//!
//! let repository = MongoDeviceLogRepository::new(&db);
//! repository.init_indexes().await?;
//!
//! let service = DeviceLogService::new(repository);
//! let filter = LogFilter {
//!     device_id: Some("thermo-01".to_string()),
//!     ..Default::default()
//! };
//! let page = service.list_logs(filter, PageRequest::default()).await?;
//! println!("{} of {} logs", page.items.len(), page.pagination.total);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod models;
pub mod mongodb;
pub mod repository;
pub mod service;
pub mod time;

pub use error::{LogError, LogResult};
pub use models::{
    CreateLog, DeviceFrequency, DeviceLog, LogContent, LogDetails, LogFilter, LogStats,
    LogStatsFilter, LogType, Page, PageRequest, Pagination, SearchHit,
};
pub use mongodb::MongoDeviceLogRepository;
pub use repository::DeviceLogRepository;
pub use service::DeviceLogService;
pub use time::parse_timestamp;
