//! MongoDB connector and the helpers the telemetry domains build on
//!
//! Provides connection management, store error classification, index
//! declaration and the grouping primitive behind every `stats()` call.

pub mod aggregation;
mod config;
mod connector;
mod datetime;
mod error;
mod health;
mod indexes;

pub use config::MongoConfig;
pub use connector::{connect_from_config, connect_from_config_with_retry};
pub use datetime::{from_bson_datetime, to_bson_datetime, truncate_to_millis};
pub use error::{DUPLICATE_KEY_CODE, MongoError, StoreErrorKind, classify, is_duplicate_key};
pub use health::{HealthStatus, check_health, check_health_detailed};
pub use indexes::ensure_indexes;

// Re-export MongoDB types for convenience
pub use mongodb::{Client, Collection, Database};
