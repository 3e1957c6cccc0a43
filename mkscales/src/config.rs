//! Emulator configuration
//!
//! Supports both command-line arguments and a TOML configuration file.
//! CLI arguments take precedence over config file values.

use std::path::PathBuf;

use clap::Parser;
use serde::Deserialize;

use mkscales_core::{
    constants::{DEFAULT_LISTEN, DEFAULT_READ_LIMIT},
    Checksum, DeviceProfile, Emulator, FrameCodec, LengthWidth,
};
use mkscales_types::{DeviceIdentity, DivisionCode};

/// Command-line arguments for the emulator
#[derive(Parser, Debug, Default)]
#[command(name = "mk-emulator")]
#[command(version)]
#[command(about = "MK scales protocol emulator", long_about = None)]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Address to bind to (e.g., 0.0.0.0:8000)
    #[arg(short = 'l', long)]
    pub listen: Option<String>,

    /// Maximum request size taken in a single read
    #[arg(long)]
    pub read_limit: Option<usize>,

    /// Initial CRC value, decimal or 0x-prefixed hex (0x1D0F for the legacy client)
    #[arg(long, value_parser = parse_u16)]
    pub checksum_init: Option<u16>,

    /// Serial number reported by get-device-id (4 ASCII characters)
    #[arg(long)]
    pub serial: Option<String>,

    /// Raw weight reported by get-weight
    #[arg(long)]
    pub weight: Option<u32>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,
}

/// TOML configuration file structure
#[derive(Debug, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub protocol: ProtocolConfig,
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Listener configuration
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to
    #[serde(default = "default_listen")]
    pub listen: String,
    /// Maximum request size taken in a single read
    #[serde(default = "default_read_limit")]
    pub read_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            read_limit: default_read_limit(),
        }
    }
}

/// Wire format configuration
#[derive(Debug, Deserialize)]
pub struct ProtocolConfig {
    /// Length field width of requests, in bytes
    #[serde(default = "default_request_width")]
    pub request_length_width: u8,
    /// Length field width of responses, in bytes
    #[serde(default = "default_response_width")]
    pub response_length_width: u8,
    /// Initial CRC value
    #[serde(default)]
    pub checksum_init: u16,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            request_length_width: default_request_width(),
            response_length_width: default_response_width(),
            checksum_init: 0,
        }
    }
}

/// Values reported by the emulated device
#[derive(Debug, Deserialize)]
pub struct DeviceConfig {
    #[serde(default = "default_serial")]
    pub serial: String,
    #[serde(default)]
    pub weight: u32,
    #[serde(default = "default_division")]
    pub division: u8,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            serial: default_serial(),
            weight: 0,
            division: default_division(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_listen() -> String {
    DEFAULT_LISTEN.to_string()
}

fn default_read_limit() -> usize {
    DEFAULT_READ_LIMIT
}

fn default_request_width() -> u8 {
    FrameCodec::DEFAULT_REQUEST_WIDTH.bytes() as u8
}

fn default_response_width() -> u8 {
    FrameCodec::DEFAULT_RESPONSE_WIDTH.bytes() as u8
}

fn default_serial() -> String {
    DeviceIdentity::default().serial_str().to_string()
}

fn default_division() -> u8 {
    DivisionCode::DEFAULT.0
}

fn default_log_level() -> String {
    "info".to_string()
}

fn parse_u16(value: &str) -> Result<u16, String> {
    let parsed = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => value.parse::<u16>(),
    };
    parsed.map_err(|e| format!("invalid 16-bit value '{}': {}", value, e))
}

/// Final resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub listen: String,
    pub read_limit: usize,
    pub request_width: LengthWidth,
    pub response_width: LengthWidth,
    pub checksum_init: u16,
    pub profile: DeviceProfile,
    pub log_level: String,
}

impl Config {
    /// Load configuration from CLI args and optional TOML file.
    /// CLI arguments take precedence over TOML file values.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_args(CliArgs::parse())
    }

    /// Resolve already-parsed CLI args, reading the TOML file they name
    pub fn from_args(cli: CliArgs) -> Result<Self, ConfigError> {
        let toml_config = if let Some(ref config_path) = cli.config {
            let contents = std::fs::read_to_string(config_path)
                .map_err(|e| ConfigError::FileRead(config_path.clone(), e))?;
            toml::from_str(&contents)
                .map_err(|e| ConfigError::TomlParse(config_path.clone(), e))?
        } else {
            TomlConfig::default()
        };

        Self::merge(cli, toml_config)
    }

    /// Merge CLI args over a parsed TOML config
    pub fn merge(cli: CliArgs, toml_config: TomlConfig) -> Result<Self, ConfigError> {
        let request_width = length_width(toml_config.protocol.request_length_width)?;
        let response_width = length_width(toml_config.protocol.response_length_width)?;

        let read_limit = cli.read_limit.unwrap_or(toml_config.server.read_limit);
        if read_limit == 0 {
            return Err(ConfigError::Invalid("read_limit must be at least 1".into()));
        }

        let serial = cli.serial.unwrap_or(toml_config.device.serial);
        let profile = DeviceProfile::new(
            cli.weight.unwrap_or(toml_config.device.weight),
            DivisionCode(toml_config.device.division),
            &serial,
        )
        .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        Ok(Config {
            listen: cli.listen.unwrap_or(toml_config.server.listen),
            read_limit,
            request_width,
            response_width,
            checksum_init: cli
                .checksum_init
                .unwrap_or(toml_config.protocol.checksum_init),
            profile,
            log_level: cli.log_level.unwrap_or(toml_config.logging.level),
        })
    }

    /// Frame codec described by this configuration
    pub fn codec(&self) -> FrameCodec {
        FrameCodec::new()
            .with_request_width(self.request_width)
            .with_response_width(self.response_width)
            .with_checksum(Checksum::new(self.checksum_init))
    }

    /// Emulator described by this configuration
    pub fn emulator(&self) -> Emulator {
        Emulator::with_profile(self.codec(), &self.profile)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            read_limit: DEFAULT_READ_LIMIT,
            request_width: FrameCodec::DEFAULT_REQUEST_WIDTH,
            response_width: FrameCodec::DEFAULT_RESPONSE_WIDTH,
            checksum_init: 0,
            profile: DeviceProfile::default(),
            log_level: default_log_level(),
        }
    }
}

fn length_width(bytes: u8) -> Result<LengthWidth, ConfigError> {
    LengthWidth::try_from(bytes).map_err(|other| {
        ConfigError::Invalid(format!("length width must be 1 or 2 bytes, got {}", other))
    })
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{}': {1}", .0.display())]
    FileRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse config file '{}': {1}", .0.display())]
    TomlParse(PathBuf, #[source] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
