use chrono::{DateTime, Utc};
use database::mongodb::aggregation::KeyCount;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum::{Display, EnumString};
use validator::{Validate, ValidationError};

/// Per-device settings; shape varies by device type and is not enforced
pub type DeviceConfig = HashMap<String, serde_json::Value>;

/// Device status
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DeviceStatus {
    #[default]
    Online,
    Offline,
    Maintenance,
}

/// GeoJSON point, `{ "type": "Point", "coordinates": [lon, lat] }`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "Point")]
pub struct GeoPoint {
    pub coordinates: [f64; 2],
}

impl GeoPoint {
    pub fn longitude(&self) -> f64 {
        self.coordinates[0]
    }

    pub fn latitude(&self) -> f64 {
        self.coordinates[1]
    }
}

impl From<Coordinates> for GeoPoint {
    fn from(c: Coordinates) -> Self {
        Self {
            coordinates: [c.longitude, c.latitude],
        }
    }
}

/// A WGS84 position supplied by a caller
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "coordinates_are_finite"))]
pub struct Coordinates {
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
}

impl Coordinates {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }
}

// Range checks let NaN through
fn coordinates_are_finite(c: &Coordinates) -> Result<(), ValidationError> {
    if c.longitude.is_finite() && c.latitude.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::new("coordinates_not_finite"))
    }
}

/// Device entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub device_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub device_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
    pub status: DeviceStatus,
    #[serde(default)]
    pub config: DeviceConfig,
    /// Set by the store on write; absent on documents stored without one
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// DTO for registering a device
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateDevice {
    #[validate(length(min = 1, max = 128))]
    pub device_id: String,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[serde(rename = "type")]
    #[validate(length(min = 1, max = 64))]
    pub device_type: String,
    #[serde(default)]
    #[validate(nested)]
    pub location: Option<Coordinates>,
    #[serde(default)]
    pub status: DeviceStatus,
    #[serde(default)]
    pub config: DeviceConfig,
}

impl CreateDevice {
    pub fn new(
        device_id: impl Into<String>,
        name: impl Into<String>,
        device_type: impl Into<String>,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            name: name.into(),
            device_type: device_type.into(),
            location: None,
            status: DeviceStatus::default(),
            config: DeviceConfig::new(),
        }
    }

    pub fn with_location(mut self, longitude: f64, latitude: f64) -> Self {
        self.location = Some(Coordinates::new(longitude, latitude));
        self
    }

    pub fn with_status(mut self, status: DeviceStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_config(mut self, config: DeviceConfig) -> Self {
        self.config = config;
        self
    }
}

/// Partial update; absent fields are left untouched. `device_id` is immutable.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateDevice {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[serde(rename = "type")]
    #[validate(length(min = 1, max = 64))]
    pub device_type: Option<String>,
    #[validate(nested)]
    pub location: Option<Coordinates>,
    pub status: Option<DeviceStatus>,
    pub config: Option<DeviceConfig>,
}

/// Filters for listing devices
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceFilter {
    #[serde(rename = "type")]
    pub device_type: Option<String>,
    pub status: Option<DeviceStatus>,
    /// Case-insensitive substring of `device_id` or `name`
    pub search: Option<String>,
}

impl DeviceFilter {
    /// The search term with surrounding whitespace removed, if anything is left
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
    }
}

pub const DEFAULT_NEARBY_DISTANCE_METERS: f64 = 1000.0;
pub const DEFAULT_NEARBY_LIMIT: i64 = 10;

/// Proximity query around a point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "distance_is_finite"))]
pub struct NearbyQuery {
    #[validate(nested)]
    pub center: Coordinates,
    #[validate(range(exclusive_min = 0.0))]
    pub max_distance_meters: f64,
    #[validate(range(min = 1))]
    pub limit: i64,
    pub status: Option<DeviceStatus>,
}

impl NearbyQuery {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            center: Coordinates::new(longitude, latitude),
            max_distance_meters: DEFAULT_NEARBY_DISTANCE_METERS,
            limit: DEFAULT_NEARBY_LIMIT,
            status: None,
        }
    }

    pub fn within(mut self, max_distance_meters: f64) -> Self {
        self.max_distance_meters = max_distance_meters;
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_status(mut self, status: DeviceStatus) -> Self {
        self.status = Some(status);
        self
    }
}

fn distance_is_finite(q: &NearbyQuery) -> Result<(), ValidationError> {
    if q.max_distance_meters.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::new("distance_not_finite"))
    }
}

/// A device matched by a proximity query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearbyDevice {
    #[serde(flatten)]
    pub device: Device,
    pub distance_meters: f64,
}

/// Inventory counts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceStats {
    pub total: u64,
    pub by_type: Vec<KeyCount>,
    pub by_status: Vec<KeyCount>,
}
