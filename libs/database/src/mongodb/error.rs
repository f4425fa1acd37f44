use mongodb::error::{ErrorKind, WriteFailure};

/// Server error code for a unique index violation
pub const DUPLICATE_KEY_CODE: i32 = 11000;

/// Error type for MongoDB plumbing (connection, indexes, aggregation output)
#[derive(Debug, thiserror::Error)]
pub enum MongoError {
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Failed to create indexes on '{collection}': {source}")]
    IndexCreation {
        collection: String,
        #[source]
        source: mongodb::error::Error,
    },

    #[error("Unexpected document shape: {0}")]
    MalformedDocument(String),
}

impl MongoError {
    /// Whether a connection attempt that failed with this error is worth repeating.
    ///
    /// A malformed connection string or bad client option fails the same way
    /// every time.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::ConnectionFailed(_) => true,
            Self::Mongo(e) => !matches!(
                e.kind.as_ref(),
                ErrorKind::InvalidArgument { .. } | ErrorKind::Authentication { .. }
            ),
            Self::IndexCreation { .. } | Self::MalformedDocument(_) => false,
        }
    }
}

/// Coarse classification of a driver error, as seen by the query layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    /// A unique index rejected the write
    DuplicateKey,
    /// Anything else: transport, server selection, command failure
    Unavailable,
}

/// Classify a driver error
pub fn classify(err: &mongodb::error::Error) -> StoreErrorKind {
    if is_duplicate_key(err) {
        StoreErrorKind::DuplicateKey
    } else {
        StoreErrorKind::Unavailable
    }
}

/// Whether the error is a unique-index violation (E11000), whichever path
/// (single write, bulk write, or command) reported it
pub fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => {
            write_error.code == DUPLICATE_KEY_CODE
        }
        ErrorKind::Command(command_error) => command_error.code == DUPLICATE_KEY_CODE,
        ErrorKind::InsertMany(insert_error) => insert_error
            .write_errors
            .as_ref()
            .is_some_and(|errors| errors.iter().any(|e| e.code == DUPLICATE_KEY_CODE)),
        _ => false,
    }
}
