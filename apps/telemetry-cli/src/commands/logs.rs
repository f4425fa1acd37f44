use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use domain_device_logs::{
    CreateLog, DeviceLogService, LogDetails, LogFilter, LogStatsFilter, LogType,
    MongoDeviceLogRepository, PageRequest,
    models::{DEFAULT_PAGE, DEFAULT_PER_PAGE},
};
use serde_json::json;

use super::{parse_json_object, parse_time, print_json};

#[derive(Subcommand, Debug)]
pub enum LogCommand {
    /// Page through logs, newest first
    List {
        #[arg(long)]
        device_id: Option<String>,

        #[arg(long)]
        log_type: Option<LogType>,

        #[command(flatten)]
        range: TimeRangeArgs,

        #[command(flatten)]
        page: PageArgs,
    },

    /// Record a log entry
    Create {
        #[arg(long)]
        device_id: String,

        #[arg(long)]
        log_type: LogType,

        #[arg(long)]
        message: String,

        /// Extra payload as a JSON object
        #[arg(long, value_parser = parse_json_object::<LogDetails>)]
        details: Option<LogDetails>,

        /// Defaults to now
        #[arg(long, value_parser = parse_time)]
        timestamp: Option<DateTime<Utc>>,
    },

    /// Remove a log entry by id
    Delete { log_id: String },

    /// Full-text search over message and details, best match first
    Search {
        keyword: String,

        #[command(flatten)]
        page: PageArgs,
    },

    /// Counts by type, hour and device, plus per-device logging rates
    Stats {
        #[arg(long)]
        device_id: Option<String>,

        #[command(flatten)]
        range: TimeRangeArgs,
    },
}

/// Half-open `[start, end)` range
#[derive(Args, Debug)]
pub struct TimeRangeArgs {
    #[arg(long, value_parser = parse_time)]
    start_time: Option<DateTime<Utc>>,

    #[arg(long, value_parser = parse_time)]
    end_time: Option<DateTime<Utc>>,
}

#[derive(Args, Debug)]
pub struct PageArgs {
    #[arg(long, default_value_t = DEFAULT_PAGE)]
    page: u64,

    #[arg(long, default_value_t = DEFAULT_PER_PAGE)]
    per_page: u64,
}

impl From<PageArgs> for PageRequest {
    fn from(args: PageArgs) -> Self {
        PageRequest::new(args.page, args.per_page)
    }
}

pub async fn run(
    service: &DeviceLogService<MongoDeviceLogRepository>,
    command: LogCommand,
) -> eyre::Result<()> {
    match command {
        LogCommand::List {
            device_id,
            log_type,
            range,
            page,
        } => {
            let filter = LogFilter {
                device_id,
                log_type,
                start_time: range.start_time,
                end_time: range.end_time,
            };
            print_json(&service.list_logs(filter, page.into()).await?)
        }

        LogCommand::Create {
            device_id,
            log_type,
            message,
            details,
            timestamp,
        } => {
            let mut input = CreateLog::new(device_id, log_type, message);
            if let Some(details) = details {
                input = input.with_details(details);
            }
            if let Some(timestamp) = timestamp {
                input = input.at(timestamp);
            }
            print_json(&service.create_log(input).await?)
        }

        LogCommand::Delete { log_id } => {
            let deleted = service.delete_log(&log_id).await?;
            print_json(&json!({ "log_id": log_id, "deleted": deleted }))
        }

        LogCommand::Search { keyword, page } => {
            print_json(&service.search_logs(&keyword, page.into()).await?)
        }

        LogCommand::Stats { device_id, range } => {
            let filter = LogStatsFilter {
                device_id,
                start_time: range.start_time,
                end_time: range.end_time,
            };
            print_json(&service.log_stats(filter).await?)
        }
    }
}
