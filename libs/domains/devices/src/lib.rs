//! Devices Domain
//!
//! Registry of smart-home devices stored in the `devices` collection: CRUD,
//! filtered listing, proximity search and inventory statistics.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │   Service   │  ← Validation, not-found mapping
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← Data access (trait + MongoDB implementation)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← Entities, inputs, query results
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_devices::{MongoDeviceRepository, DeviceService, DeviceFilter};
//! use mongodb::Client;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::with_uri_str("mongodb://localhost:27017").await?;
//! let db = client.database("smart_home");
//!
//! let repository = MongoDeviceRepository::new(&db);
//! repository.init_indexes().await?;
//!
//! let service = DeviceService::new(repository);
//! let online = service.list_devices(DeviceFilter::default()).await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod models;
pub mod mongodb;
pub mod repository;
pub mod service;

pub use error::{DeviceError, DeviceResult};
pub use models::{
    Coordinates, CreateDevice, Device, DeviceConfig, DeviceFilter, DeviceStats, DeviceStatus,
    GeoPoint, NearbyDevice, NearbyQuery, UpdateDevice,
};
pub use mongodb::MongoDeviceRepository;
pub use repository::DeviceRepository;
pub use service::DeviceService;
