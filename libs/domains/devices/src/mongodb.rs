//! MongoDB implementation of DeviceRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use database::mongodb::{
    aggregation, ensure_indexes, from_bson_datetime, is_duplicate_key, to_bson_datetime,
    truncate_to_millis,
};
use futures_util::TryStreamExt;
use mongodb::{
    bson::{self, doc, from_document, to_bson, Bson, Document},
    options::{FindOneAndUpdateOptions, IndexOptions, ReturnDocument},
    Collection, Database, IndexModel,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::error::{DeviceError, DeviceResult};
use crate::models::{
    CreateDevice, Device, DeviceConfig, DeviceFilter, DeviceStats, DeviceStatus, GeoPoint,
    NearbyDevice, NearbyQuery, UpdateDevice,
};
use crate::repository::DeviceRepository;

pub const DEVICES_COLLECTION: &str = "devices";

/// Output field `$geoNear` writes the computed distance into
const DISTANCE_FIELD: &str = "distance_meters";

/// Stored shape of a device. Timestamps are BSON dates so the store can
/// compare and bucket them; the driver-assigned `_id` is ignored.
///
/// Only `device_id` is required when decoding; documents written by other
/// tools may lack any other field.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct DeviceDocument {
    device_id: String,
    #[serde(default)]
    name: String,
    #[serde(rename = "type", default)]
    device_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    location: Option<GeoPoint>,
    #[serde(default)]
    status: DeviceStatus,
    #[serde(default)]
    config: DeviceConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_at: Option<bson::DateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<bson::DateTime>,
}

impl DeviceDocument {
    fn new(input: CreateDevice, now: DateTime<Utc>) -> Self {
        let now = to_bson_datetime(now);
        Self {
            device_id: input.device_id,
            name: input.name,
            device_type: input.device_type,
            location: input.location.map(GeoPoint::from),
            status: input.status,
            config: input.config,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    /// Encode for insertion; values BSON cannot hold are the caller's fault
    fn encode(&self) -> DeviceResult<Document> {
        Ok(bson::to_document(self)?)
    }
}

impl From<DeviceDocument> for Device {
    fn from(doc: DeviceDocument) -> Self {
        Self {
            device_id: doc.device_id,
            name: doc.name,
            device_type: doc.device_type,
            location: doc.location,
            status: doc.status,
            config: doc.config,
            created_at: doc.created_at.map(from_bson_datetime),
            updated_at: doc.updated_at.map(from_bson_datetime),
        }
    }
}

/// MongoDB implementation of the DeviceRepository
pub struct MongoDeviceRepository {
    collection: Collection<DeviceDocument>,
}

impl MongoDeviceRepository {
    pub fn new(db: &Database) -> Self {
        Self::with_collection(db, DEVICES_COLLECTION)
    }

    pub fn with_collection(db: &Database, collection_name: &str) -> Self {
        let collection = db.collection::<DeviceDocument>(collection_name);
        Self { collection }
    }

    /// Index set required by the device queries
    pub fn index_models() -> Vec<IndexModel> {
        vec![
            // Proximity search
            IndexModel::builder()
                .keys(doc! { "location": "2dsphere" })
                .options(
                    IndexOptions::builder()
                        .name("idx_location_2dsphere".to_string())
                        .build(),
                )
                .build(),
            IndexModel::builder()
                .keys(doc! { "type": 1 })
                .options(IndexOptions::builder().name("idx_type".to_string()).build())
                .build(),
            IndexModel::builder()
                .keys(doc! { "status": 1 })
                .options(IndexOptions::builder().name("idx_status".to_string()).build())
                .build(),
            IndexModel::builder()
                .keys(doc! { "device_id": 1 })
                .options(
                    IndexOptions::builder()
                        .unique(true)
                        .name("idx_device_id_unique".to_string())
                        .build(),
                )
                .build(),
        ]
    }

    /// Create the device indexes. Idempotent; failure is meant to be fatal at startup.
    pub async fn init_indexes(&self) -> DeviceResult<()> {
        ensure_indexes(&self.collection, Self::index_models()).await?;
        info!("Device indexes created successfully");
        Ok(())
    }

    fn build_filter(filter: &DeviceFilter) -> Document {
        let mut doc = doc! {};

        if let Some(ref device_type) = filter.device_type {
            doc.insert("type", device_type.as_str());
        }

        if let Some(status) = filter.status {
            doc.insert("status", status.to_string());
        }

        if let Some(term) = filter.search_term() {
            let pattern = regex::escape(term);
            doc.insert(
                "$or",
                vec![
                    doc! { "device_id": { "$regex": pattern.as_str(), "$options": "i" } },
                    doc! { "name": { "$regex": pattern.as_str(), "$options": "i" } },
                ],
            );
        }

        doc
    }

    fn build_update(patch: &UpdateDevice, now: DateTime<Utc>) -> DeviceResult<Document> {
        let mut set = doc! { "updated_at": to_bson_datetime(now) };

        if let Some(ref name) = patch.name {
            set.insert("name", name.as_str());
        }
        if let Some(ref device_type) = patch.device_type {
            set.insert("type", device_type.as_str());
        }
        if let Some(status) = patch.status {
            set.insert("status", status.to_string());
        }
        if let Some(location) = patch.location {
            set.insert("location", to_bson(&GeoPoint::from(location))?);
        }
        if let Some(ref config) = patch.config {
            set.insert("config", to_bson(config)?);
        }

        Ok(doc! { "$set": set })
    }

    /// `$geoNear` must be the first stage; it sorts by distance itself
    fn nearby_pipeline(query: &NearbyQuery) -> Vec<Document> {
        let mut geo_near = doc! {
            "near": {
                "type": "Point",
                "coordinates": [query.center.longitude, query.center.latitude]
            },
            "distanceField": DISTANCE_FIELD,
            "maxDistance": query.max_distance_meters,
            "spherical": true,
            "key": "location",
        };

        if let Some(status) = query.status {
            geo_near.insert("query", doc! { "status": status.to_string() });
        }

        vec![
            doc! { "$geoNear": geo_near },
            doc! { "$limit": query.limit },
        ]
    }

    fn parse_nearby(mut doc: Document) -> DeviceResult<NearbyDevice> {
        let distance_meters = match doc.remove(DISTANCE_FIELD) {
            Some(Bson::Double(d)) => d,
            Some(Bson::Int32(d)) => f64::from(d),
            Some(Bson::Int64(d)) => d as f64,
            _ => {
                return Err(DeviceError::StoreUnavailable(
                    "proximity result without a distance".to_string(),
                ))
            }
        };

        let stored: DeviceDocument = from_document(doc)?;
        Ok(NearbyDevice {
            device: stored.into(),
            distance_meters,
        })
    }
}

#[async_trait]
impl DeviceRepository for MongoDeviceRepository {
    #[instrument(skip(self, input), fields(device_id = %input.device_id))]
    async fn create(&self, input: CreateDevice) -> DeviceResult<Device> {
        let device_id = input.device_id.clone();
        let stored = DeviceDocument::new(input, truncate_to_millis(Utc::now()));

        self.collection
            .clone_with_type::<Document>()
            .insert_one(stored.encode()?)
            .await
            .map_err(|e| {
                if is_duplicate_key(&e) {
                    DeviceError::DuplicateKey(device_id.clone())
                } else {
                    e.into()
                }
            })?;

        info!(device_id = %device_id, "Device created successfully");
        Ok(stored.into())
    }

    #[instrument(skip(self))]
    async fn get(&self, device_id: &str) -> DeviceResult<Option<Device>> {
        let stored = self
            .collection
            .find_one(doc! { "device_id": device_id })
            .await?;
        Ok(stored.map(Device::from))
    }

    #[instrument(skip(self))]
    async fn list(&self, filter: &DeviceFilter) -> DeviceResult<Vec<Device>> {
        let mongo_filter = Self::build_filter(filter);
        debug!(filter = %mongo_filter, "Listing devices");

        let cursor = self.collection.find(mongo_filter).await?;
        let stored: Vec<DeviceDocument> = cursor.try_collect().await?;

        Ok(stored.into_iter().map(Device::from).collect())
    }

    #[instrument(skip(self, patch))]
    async fn update(&self, device_id: &str, patch: UpdateDevice) -> DeviceResult<Option<Device>> {
        let update = Self::build_update(&patch, truncate_to_millis(Utc::now()))?;

        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        let updated = self
            .collection
            .find_one_and_update(doc! { "device_id": device_id }, update)
            .with_options(options)
            .await?;

        if updated.is_some() {
            info!(device_id = %device_id, "Device updated successfully");
        }
        Ok(updated.map(Device::from))
    }

    #[instrument(skip(self))]
    async fn delete(&self, device_id: &str) -> DeviceResult<bool> {
        let result = self
            .collection
            .delete_one(doc! { "device_id": device_id })
            .await?;

        let deleted = result.deleted_count > 0;
        if deleted {
            info!(device_id = %device_id, "Device deleted successfully");
        }
        Ok(deleted)
    }

    #[instrument(skip(self))]
    async fn nearby(&self, query: &NearbyQuery) -> DeviceResult<Vec<NearbyDevice>> {
        let cursor = self
            .collection
            .aggregate(Self::nearby_pipeline(query))
            .await?;
        let docs: Vec<Document> = cursor.try_collect().await?;

        docs.into_iter().map(Self::parse_nearby).collect()
    }

    #[instrument(skip(self))]
    async fn stats(&self) -> DeviceResult<DeviceStats> {
        let total = self.collection.count_documents(doc! {}).await?;
        let by_type = aggregation::count_by_field(&self.collection, None, "type", None).await?;
        let by_status =
            aggregation::count_by_field(&self.collection, None, "status", None).await?;

        Ok(DeviceStats {
            total,
            by_type,
            by_status,
        })
    }
}
