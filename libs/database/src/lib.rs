//! Database library providing MongoDB connectors and the query utilities shared
//! by the telemetry domains.
//!
//! # Features
//!
//! - `mongodb` (default) - MongoDB connection management, store error
//!   classification, index helpers and the grouping/aggregation primitive
//! - `config` - Configuration support with `core_config::FromEnv`
//! - `all` - All features
//!
//! # Examples
//!
//! ```ignore
//! use database::mongodb::{self, MongoConfig};
//!
//! let config = MongoConfig::with_database("mongodb://localhost:27017", "smart_home");
//! let client = mongodb::connect_from_config_with_retry(&config, None).await?;
//! let db = client.database(config.database());
//! ```
//!
//! Grouped statistics over any collection:
//!
//! ```ignore
//! use database::mongodb::aggregation;
//!
//! let by_status = aggregation::count_by_field(&collection, None, "status", None).await?;
//! ```

// Always available modules
pub mod common;

#[cfg(feature = "mongodb")]
pub mod mongodb;

pub use common::{RetryConfig, retry_when, retry_with_backoff};
