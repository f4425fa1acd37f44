//! Device Service - validation and not-found mapping over a DeviceRepository

use std::sync::Arc;
use tracing::instrument;
use validator::Validate;

use crate::error::{DeviceError, DeviceResult};
use crate::models::{
    CreateDevice, Device, DeviceFilter, DeviceStats, NearbyDevice, NearbyQuery, UpdateDevice,
};
use crate::repository::DeviceRepository;

/// Device query operations
///
/// Validates caller input before it reaches the store and turns missing
/// documents into `DeviceError::NotFound`. Holds no state beyond the
/// repository, so clones are cheap and safe to share between tasks.
pub struct DeviceService<R: DeviceRepository> {
    repository: Arc<R>,
}

impl<R: DeviceRepository> DeviceService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    /// List devices, all of them when the filter is empty
    #[instrument(skip(self))]
    pub async fn list_devices(&self, filter: DeviceFilter) -> DeviceResult<Vec<Device>> {
        self.repository.list(&filter).await
    }

    #[instrument(skip(self))]
    pub async fn get_device(&self, device_id: &str) -> DeviceResult<Device> {
        self.repository
            .get(device_id)
            .await?
            .ok_or_else(|| DeviceError::NotFound(device_id.to_string()))
    }

    /// Register a device; fails with `DuplicateKey` if the id is taken
    #[instrument(skip(self, input), fields(device_id = %input.device_id))]
    pub async fn create_device(&self, input: CreateDevice) -> DeviceResult<Device> {
        input.validate()?;
        self.repository.create(input).await
    }

    #[instrument(skip(self, patch))]
    pub async fn update_device(
        &self,
        device_id: &str,
        patch: UpdateDevice,
    ) -> DeviceResult<Device> {
        patch.validate()?;
        self.repository
            .update(device_id, patch)
            .await?
            .ok_or_else(|| DeviceError::NotFound(device_id.to_string()))
    }

    /// Returns whether a device was removed. The device's logs are kept.
    #[instrument(skip(self))]
    pub async fn delete_device(&self, device_id: &str) -> DeviceResult<bool> {
        self.repository.delete(device_id).await
    }

    /// Devices within `max_distance_meters` of a point, nearest first
    #[instrument(skip(self))]
    pub async fn nearby_devices(&self, query: NearbyQuery) -> DeviceResult<Vec<NearbyDevice>> {
        query.validate()?;
        self.repository.nearby(&query).await
    }

    #[instrument(skip(self))]
    pub async fn device_stats(&self) -> DeviceResult<DeviceStats> {
        self.repository.stats().await
    }
}

impl<R: DeviceRepository> Clone for DeviceService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}
