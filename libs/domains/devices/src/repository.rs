use async_trait::async_trait;

use crate::error::DeviceResult;
use crate::models::{
    CreateDevice, Device, DeviceFilter, DeviceStats, NearbyDevice, NearbyQuery, UpdateDevice,
};

/// Repository trait for Device persistence
///
/// Inputs are assumed to be validated by the caller; implementations only
/// report store-side failures and uniqueness violations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeviceRepository: Send + Sync {
    /// Insert a new device, stamping `created_at`/`updated_at`
    async fn create(&self, input: CreateDevice) -> DeviceResult<Device>;

    /// Get a device by its `device_id`
    async fn get(&self, device_id: &str) -> DeviceResult<Option<Device>>;

    /// List devices matching the filter, in store order
    async fn list(&self, filter: &DeviceFilter) -> DeviceResult<Vec<Device>>;

    /// Apply a partial update; `None` when no such device exists
    async fn update(&self, device_id: &str, patch: UpdateDevice) -> DeviceResult<Option<Device>>;

    /// Delete a device, reporting whether one was removed
    async fn delete(&self, device_id: &str) -> DeviceResult<bool>;

    /// Devices with a location within range, nearest first
    async fn nearby(&self, query: &NearbyQuery) -> DeviceResult<Vec<NearbyDevice>>;

    /// Total count plus counts per type and per status
    async fn stats(&self) -> DeviceResult<DeviceStats>;
}
