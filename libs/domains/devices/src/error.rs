use database::mongodb::{MongoError, StoreErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("Device not found: {0}")]
    NotFound(String),

    #[error("Device with id '{0}' already exists")]
    DuplicateKey(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Index creation failed: {0}")]
    IndexCreation(String),
}

pub type DeviceResult<T> = Result<T, DeviceError>;

impl DeviceError {
    /// Stable machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            DeviceError::NotFound(_) => "not_found",
            DeviceError::DuplicateKey(_) => "duplicate_key",
            DeviceError::InvalidArgument(_) => "invalid_argument",
            DeviceError::StoreUnavailable(_) => "store_unavailable",
            DeviceError::IndexCreation(_) => "index_creation",
        }
    }
}

impl From<mongodb::error::Error> for DeviceError {
    fn from(err: mongodb::error::Error) -> Self {
        match database::mongodb::classify(&err) {
            // Callers that can name the key map duplicates themselves
            StoreErrorKind::DuplicateKey => DeviceError::DuplicateKey(err.to_string()),
            StoreErrorKind::Unavailable => DeviceError::StoreUnavailable(err.to_string()),
        }
    }
}

impl From<MongoError> for DeviceError {
    fn from(err: MongoError) -> Self {
        match err {
            MongoError::Mongo(e) => e.into(),
            other @ MongoError::IndexCreation { .. } => {
                DeviceError::IndexCreation(other.to_string())
            }
            other => DeviceError::StoreUnavailable(other.to_string()),
        }
    }
}

impl From<mongodb::bson::ser::Error> for DeviceError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        DeviceError::InvalidArgument(format!("value cannot be stored: {}", err))
    }
}

impl From<mongodb::bson::de::Error> for DeviceError {
    fn from(err: mongodb::bson::de::Error) -> Self {
        DeviceError::StoreUnavailable(format!("malformed device document: {}", err))
    }
}

impl From<validator::ValidationErrors> for DeviceError {
    fn from(err: validator::ValidationErrors) -> Self {
        DeviceError::InvalidArgument(err.to_string())
    }
}
