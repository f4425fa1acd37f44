use crate::{env_parse_or, ConfigError, FromEnv};
use std::time::Duration;

/// Default number of days a device log is kept before the store may reap it
pub const DEFAULT_LOG_RETENTION_DAYS: u64 = 90;

/// Retention window for time-series collections
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetentionConfig {
    pub log_retention_days: u64,
}

impl RetentionConfig {
    pub fn new(log_retention_days: u64) -> Self {
        Self { log_retention_days }
    }

    /// Retention window as a duration, suitable for a TTL index
    pub fn log_retention(&self) -> Duration {
        Duration::from_secs(self.log_retention_days * 24 * 60 * 60)
    }
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_RETENTION_DAYS)
    }
}

impl FromEnv for RetentionConfig {
    /// Reads LOG_RETENTION_DAYS (default: 90). Zero is rejected because a
    /// zero-second TTL would reap every log immediately.
    fn from_env() -> Result<Self, ConfigError> {
        let log_retention_days = env_parse_or("LOG_RETENTION_DAYS", DEFAULT_LOG_RETENTION_DAYS)?;

        if log_retention_days == 0 {
            return Err(ConfigError::ParseError {
                key: "LOG_RETENTION_DAYS".to_string(),
                details: "must be at least 1".to_string(),
            });
        }

        Ok(Self { log_retention_days })
    }
}
