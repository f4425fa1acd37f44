//! Subcommand handlers. Each one calls a single domain operation and
//! prints its result.

pub mod devices;
pub mod logs;

use chrono::{DateTime, Utc};
use database::mongodb::{Database, check_health_detailed};
use domain_device_logs::{MongoDeviceLogRepository, parse_timestamp};
use domain_devices::MongoDeviceRepository;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::info;

use crate::config::Config;

/// Repositories over an indexed database
pub struct Stores {
    pub devices: MongoDeviceRepository,
    pub logs: MongoDeviceLogRepository,
}

impl Stores {
    /// Build both repositories and make sure their indexes exist.
    ///
    /// Fails if either index set cannot be created; callers treat that as
    /// fatal.
    pub async fn open(db: &Database, config: &Config) -> eyre::Result<Self> {
        let devices = MongoDeviceRepository::new(db);
        devices.init_indexes().await?;

        let logs = MongoDeviceLogRepository::new(db).with_retention(&config.retention);
        logs.init_indexes().await?;

        info!(
            database = %db.name(),
            retention_days = config.retention.log_retention_days,
            "Indexes ready"
        );
        Ok(Self { devices, logs })
    }
}

/// Print a command result as pretty JSON on stdout
pub fn print_json<T: Serialize>(value: &T) -> eyre::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub async fn health(db: &Database) -> eyre::Result<()> {
    let status = check_health_detailed(db).await;
    print_json(&status)?;

    if !status.healthy {
        eyre::bail!("MongoDB is unhealthy");
    }
    Ok(())
}

/// clap value parser for timestamp arguments
pub fn parse_time(raw: &str) -> Result<DateTime<Utc>, String> {
    parse_timestamp(raw).map_err(|e| e.to_string())
}

/// clap value parser for JSON object arguments (`--config`, `--details`)
pub fn parse_json_object<T: DeserializeOwned>(raw: &str) -> Result<T, String> {
    serde_json::from_str(raw).map_err(|e| format!("expected a JSON object: {}", e))
}
