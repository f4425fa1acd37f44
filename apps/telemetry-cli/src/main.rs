//! Telemetry CLI
//!
//! Operator tool for the smart-home store: device registry queries and
//! device log listing, search and statistics. Every command ensures the
//! collection indexes first and prints its result as JSON on stdout.

use clap::{Parser, Subcommand};
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_device_logs::DeviceLogService;
use domain_devices::DeviceService;
use tracing::info;

mod commands;
mod config;

use commands::{Stores, devices::DeviceCommand, logs::LogCommand};
use config::Config;

#[derive(Parser)]
#[command(name = "telemetry-cli", version)]
#[command(about = "Query smart-home devices and their logs in MongoDB")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the device and log indexes, then exit
    InitIndexes,

    /// Ping the database
    Health,

    /// Device registry operations
    #[command(subcommand)]
    Devices(DeviceCommand),

    /// Device log operations
    #[command(subcommand)]
    Logs(LogCommand),
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();

    let cli = Cli::parse();

    let config = Config::from_env()?;
    init_tracing(&config.environment);

    info!("Connecting to MongoDB at {}", config.mongodb.url());
    let client = database::mongodb::connect_from_config_with_retry(&config.mongodb, None).await?;
    let db = client.database(config.mongodb.database());

    let stores = Stores::open(&db, &config).await?;

    match cli.command {
        Commands::InitIndexes => {
            commands::print_json(&serde_json::json!({ "indexes": "ready" }))?;
        }
        Commands::Health => commands::health(&db).await?,
        Commands::Devices(command) => {
            commands::devices::run(&DeviceService::new(stores.devices), command).await?;
        }
        Commands::Logs(command) => {
            commands::logs::run(&DeviceLogService::new(stores.logs), command).await?;
        }
    }

    Ok(())
}
