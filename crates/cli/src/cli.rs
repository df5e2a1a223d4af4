//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// IoT Hub - typed message dispatch and device report fan-out
#[derive(Parser, Debug)]
#[command(
    name = "iot-hub",
    author,
    version,
    about = "IoT message hub",
    long_about = "An edge/cloud IoT message hub.\n\n\
                  Buffers inbound device traffic, routes each message to the processor \n\
                  registered for its type, and periodically fans property and event \n\
                  reports out over the device directory."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "IOT_HUB_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "IOT_HUB_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the hub
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "config.toml", env = "IOT_HUB_CONFIG")]
    pub config: PathBuf,

    /// Override the local role from configuration (cloud | edge)
    #[arg(long, env = "IOT_HUB_ROLE")]
    pub role: Option<String>,

    /// Override the ingest queue capacity
    #[arg(long, env = "IOT_HUB_QUEUE_CAPACITY")]
    pub queue_capacity: Option<usize>,

    /// Run for this many seconds, then shut down (0 = until Ctrl+C)
    #[arg(long, default_value = "0", env = "IOT_HUB_DURATION")]
    pub duration: u64,

    /// Generate mock heartbeat and command traffic for the seeded devices
    #[arg(long, env = "IOT_HUB_SIMULATE")]
    pub simulate: bool,

    /// Mock traffic rate per device (Hz)
    #[arg(long, default_value = "1.0", env = "IOT_HUB_SIMULATE_HZ")]
    pub simulate_hz: f64,

    /// Disable the report scheduler regardless of configuration
    #[arg(long)]
    pub no_scheduler: bool,

    /// Validate configuration and exit without running
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "IOT_HUB_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "config.toml", env = "IOT_HUB_CONFIG")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml", env = "IOT_HUB_CONFIG")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// List seeded devices
    #[arg(long)]
    pub devices: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
