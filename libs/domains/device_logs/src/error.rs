use database::mongodb::{MongoError, StoreErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LogError {
    #[error("Log not found: {0}")]
    NotFound(String),

    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Index creation failed: {0}")]
    IndexCreation(String),
}

pub type LogResult<T> = Result<T, LogError>;

impl LogError {
    pub fn kind(&self) -> &'static str {
        match self {
            LogError::NotFound(_) => "not_found",
            LogError::DuplicateKey(_) => "duplicate_key",
            LogError::InvalidArgument(_) => "invalid_argument",
            LogError::StoreUnavailable(_) => "store_unavailable",
            LogError::IndexCreation(_) => "index_creation",
        }
    }
}

impl From<mongodb::error::Error> for LogError {
    fn from(err: mongodb::error::Error) -> Self {
        match database::mongodb::classify(&err) {
            StoreErrorKind::DuplicateKey => LogError::DuplicateKey(err.to_string()),
            StoreErrorKind::Unavailable => LogError::StoreUnavailable(err.to_string()),
        }
    }
}

impl From<MongoError> for LogError {
    fn from(err: MongoError) -> Self {
        match err {
            MongoError::Mongo(e) => e.into(),
            other @ MongoError::IndexCreation { .. } => LogError::IndexCreation(other.to_string()),
            other => LogError::StoreUnavailable(other.to_string()),
        }
    }
}

impl From<mongodb::bson::ser::Error> for LogError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        LogError::InvalidArgument(format!("value cannot be stored: {}", err))
    }
}

impl From<mongodb::bson::de::Error> for LogError {
    fn from(err: mongodb::bson::de::Error) -> Self {
        LogError::StoreUnavailable(format!("malformed log document: {}", err))
    }
}

impl From<validator::ValidationErrors> for LogError {
    fn from(err: validator::ValidationErrors) -> Self {
        LogError::InvalidArgument(err.to_string())
    }
}
