use clap::{Args, Subcommand};
use domain_devices::{
    Coordinates, CreateDevice, DeviceConfig, DeviceFilter, DeviceService, DeviceStatus,
    MongoDeviceRepository, NearbyQuery, UpdateDevice,
    models::{DEFAULT_NEARBY_DISTANCE_METERS, DEFAULT_NEARBY_LIMIT},
};
use serde_json::json;

use super::{parse_json_object, print_json};

#[derive(Subcommand, Debug)]
pub enum DeviceCommand {
    /// List devices, optionally filtered
    List {
        #[arg(long = "type")]
        device_type: Option<String>,

        #[arg(long)]
        status: Option<DeviceStatus>,

        /// Case-insensitive substring of the device id or name
        #[arg(long)]
        search: Option<String>,
    },

    /// Show one device
    Get { device_id: String },

    /// Register a device
    Create {
        #[arg(long)]
        device_id: String,

        #[arg(long)]
        name: String,

        #[arg(long = "type")]
        device_type: String,

        #[command(flatten)]
        location: LocationArgs,

        #[arg(long, default_value_t = DeviceStatus::Online)]
        status: DeviceStatus,

        /// Device configuration as a JSON object
        #[arg(long, value_parser = parse_json_object::<DeviceConfig>)]
        config: Option<DeviceConfig>,
    },

    /// Change selected fields of a device
    Update {
        device_id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long = "type")]
        device_type: Option<String>,

        #[arg(long)]
        status: Option<DeviceStatus>,

        #[command(flatten)]
        location: LocationArgs,

        /// Replacement configuration as a JSON object
        #[arg(long, value_parser = parse_json_object::<DeviceConfig>)]
        config: Option<DeviceConfig>,
    },

    /// Remove a device; its logs are kept
    Delete { device_id: String },

    /// Devices around a point, nearest first
    Nearby {
        #[arg(long, allow_negative_numbers = true)]
        longitude: f64,

        #[arg(long, allow_negative_numbers = true)]
        latitude: f64,

        /// Search radius in metres
        #[arg(long, default_value_t = DEFAULT_NEARBY_DISTANCE_METERS)]
        max_distance: f64,

        #[arg(long, default_value_t = DEFAULT_NEARBY_LIMIT)]
        limit: i64,

        #[arg(long)]
        status: Option<DeviceStatus>,
    },

    /// Device counts by type and status
    Stats,
}

/// Optional `--longitude`/`--latitude` pair
#[derive(Args, Debug)]
pub struct LocationArgs {
    #[arg(long, requires = "latitude", allow_negative_numbers = true)]
    longitude: Option<f64>,

    #[arg(long, requires = "longitude", allow_negative_numbers = true)]
    latitude: Option<f64>,
}

impl LocationArgs {
    fn coordinates(&self) -> Option<Coordinates> {
        match (self.longitude, self.latitude) {
            (Some(longitude), Some(latitude)) => Some(Coordinates::new(longitude, latitude)),
            _ => None,
        }
    }
}

pub async fn run(
    service: &DeviceService<MongoDeviceRepository>,
    command: DeviceCommand,
) -> eyre::Result<()> {
    match command {
        DeviceCommand::List {
            device_type,
            status,
            search,
        } => {
            let filter = DeviceFilter {
                device_type,
                status,
                search,
            };
            print_json(&service.list_devices(filter).await?)
        }

        DeviceCommand::Get { device_id } => print_json(&service.get_device(&device_id).await?),

        DeviceCommand::Create {
            device_id,
            name,
            device_type,
            location,
            status,
            config,
        } => {
            let mut input = CreateDevice::new(device_id, name, device_type).with_status(status);
            input.location = location.coordinates();
            if let Some(config) = config {
                input = input.with_config(config);
            }
            print_json(&service.create_device(input).await?)
        }

        DeviceCommand::Update {
            device_id,
            name,
            device_type,
            status,
            location,
            config,
        } => {
            let patch = UpdateDevice {
                name,
                device_type,
                location: location.coordinates(),
                status,
                config,
            };
            print_json(&service.update_device(&device_id, patch).await?)
        }

        DeviceCommand::Delete { device_id } => {
            let deleted = service.delete_device(&device_id).await?;
            print_json(&json!({ "device_id": device_id, "deleted": deleted }))
        }

        DeviceCommand::Nearby {
            longitude,
            latitude,
            max_distance,
            limit,
            status,
        } => {
            let mut query = NearbyQuery::new(longitude, latitude)
                .within(max_distance)
                .limit(limit);
            if let Some(status) = status {
                query = query.with_status(status);
            }
            print_json(&service.nearby_devices(query).await?)
        }

        DeviceCommand::Stats => print_json(&service.device_stats().await?),
    }
}
