use mongodb::{Collection, IndexModel};
use tracing::{info, instrument};

use super::MongoError;

/// Create the given indexes on a collection.
///
/// `createIndexes` is a no-op for an index that already exists with the same
/// keys and options, so this is safe to call on every startup. An index that
/// exists with conflicting options (e.g. a changed TTL) is an error.
#[instrument(
    skip(collection, indexes),
    fields(collection = %collection.name(), count = indexes.len())
)]
pub async fn ensure_indexes<T>(
    collection: &Collection<T>,
    indexes: Vec<IndexModel>,
) -> Result<Vec<String>, MongoError>
where
    T: Send + Sync,
{
    let result = collection
        .create_indexes(indexes)
        .await
        .map_err(|source| MongoError::IndexCreation {
            collection: collection.name().to_string(),
            source,
        })?;

    info!(indexes = ?result.index_names, "Indexes ensured");
    Ok(result.index_names)
}
