use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Subcommand};
use znp_api::ZnpApi;
use znp_transport::{SerialConfig, StreamInterface};

use crate::exit::{CliError, CliResult, INTERNAL, USAGE};
use crate::output::OutputFormat;

pub mod info;
pub mod listen;
pub mod nv_read;
pub mod ping;
pub mod reset;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check the device answers and list its subsystems.
    Ping(PingArgs),
    /// Print the device's network parameters.
    Info(InfoArgs),
    /// Read a non-volatile memory item.
    NvRead(NvReadArgs),
    /// Reset the device and print its reset indication.
    Reset(ResetArgs),
    /// Print device events as they arrive.
    Listen(ListenArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Ping(args) => ping::run(args, format),
        Command::Info(args) => info::run(args, format),
        Command::NvRead(args) => nv_read::run(args, format),
        Command::Reset(args) => reset::run(args, format),
        Command::Listen(args) => listen::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct DeviceArgs {
    /// Serial device of the ZNP adapter (e.g. /dev/ttyACM0).
    pub device: PathBuf,
    /// Serial baud rate.
    #[arg(long, default_value = "115200", value_parser = clap::value_parser!(u32).range(1..))]
    pub baud: u32,
    /// Maximum time to wait for each device response (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct PingArgs {
    #[command(flatten)]
    pub device: DeviceArgs,
}

#[derive(Args, Debug)]
pub struct InfoArgs {
    #[command(flatten)]
    pub device: DeviceArgs,
}

#[derive(Args, Debug)]
pub struct NvReadArgs {
    #[command(flatten)]
    pub device: DeviceArgs,
    /// NV item id, decimal or 0x-prefixed hex.
    #[arg(long, value_parser = parse_u16)]
    pub id: u16,
    /// Byte offset into the item.
    #[arg(long, default_value = "0")]
    pub offset: u8,
}

#[derive(Args, Debug)]
pub struct ResetArgs {
    #[command(flatten)]
    pub device: DeviceArgs,
    /// Hard reset (the default is a soft reset).
    #[arg(long)]
    pub hard: bool,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    #[command(flatten)]
    pub device: DeviceArgs,
    /// Exit after printing N events.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// An engine attached to an open device.
pub struct Session {
    pub api: ZnpApi,
    pub timeout: Duration,
}

impl Session {
    pub fn open(args: &DeviceArgs) -> CliResult<Self> {
        let timeout = parse_timeout(&args.timeout)?;
        let config = SerialConfig {
            baud_rate: args.baud,
            ..SerialConfig::default()
        };
        let stream = StreamInterface::open(&args.device, &config)
            .map_err(|err| crate::exit::transport_error("open failed", err))?;
        tracing::debug!(device = %args.device.display(), ?timeout, "session opened");

        Ok(Self {
            api: ZnpApi::new(Arc::new(stream)),
            timeout,
        })
    }
}

pub fn runtime() -> CliResult<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| CliError::new(INTERNAL, format!("runtime setup failed: {err}")))
}

fn parse_u16(input: &str) -> Result<u16, String> {
    let parsed = match input.strip_prefix("0x").or_else(|| input.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => input.parse(),
    };
    parsed.map_err(|err| format!("invalid id {input:?}: {err}"))
}

pub fn parse_timeout(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "timeout must not be empty"));
    }

    let (number, millis) = match input.strip_suffix("ms") {
        Some(num) => (num, true),
        None => (input.strip_suffix('s').unwrap_or(input), false),
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid timeout value: {input}")))?;
    if value == 0 {
        return Err(CliError::new(USAGE, "timeout must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}
