//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{PadViewError, Result};
use crate::mapping::ControllerFamily;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    pub serial: SerialConfig,
    pub skins: SkinsConfig,
    pub log: LogConfig,
}

/// Serial port configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SerialConfig {
    /// Platform identifier of the device, e.g. `/dev/ttyACM0` or `COM3`
    #[serde(default = "default_serial_port")]
    pub port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_reconnect_backoff_ms")]
    pub reconnect_backoff_ms: u64,
}

/// Skin selection configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SkinsConfig {
    /// Root directory scanned for skin subdirectories
    #[serde(default = "default_skins_root")]
    pub root: String,

    /// Skin name to load, as declared in its descriptor
    #[serde(default)]
    pub skin: String,

    /// Controller family name (`n64` / `gamecube`)
    #[serde(default = "default_family")]
    pub family: String,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    /// When set, log output is additionally written to daily files in this
    /// directory
    #[serde(default)]
    pub dir: String,
}

// Default value functions
fn default_serial_port() -> String { String::new() }
fn default_baud_rate() -> u32 { 115200 }
fn default_timeout_ms() -> u64 { 100 }
fn default_reconnect_backoff_ms() -> u64 { 1000 }

fn default_skins_root() -> String { "./skins".to_string() }
fn default_family() -> String { "n64".to_string() }

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: default_serial_port(),
            baud_rate: default_baud_rate(),
            timeout_ms: default_timeout_ms(),
            reconnect_backoff_ms: default_reconnect_backoff_ms(),
        }
    }
}

impl Default for SkinsConfig {
    fn default() -> Self {
        Self {
            root: default_skins_root(),
            skin: String::new(),
            family: default_family(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { dir: String::new() }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            serial: SerialConfig::default(),
            skins: SkinsConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, TOML parsing fails, or
    /// validation fails
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.serial.baud_rate == 0 {
            return Err(PadViewError::Configuration(
                "baud_rate must be greater than 0".to_string(),
            ));
        }

        if self.serial.timeout_ms == 0 || self.serial.timeout_ms > 10_000 {
            return Err(PadViewError::Configuration(
                "timeout_ms must be between 1 and 10000".to_string(),
            ));
        }

        if self.serial.reconnect_backoff_ms == 0 || self.serial.reconnect_backoff_ms > 60_000 {
            return Err(PadViewError::Configuration(
                "reconnect_backoff_ms must be between 1 and 60000".to_string(),
            ));
        }

        if self.skins.root.is_empty() {
            return Err(PadViewError::Configuration(
                "skins root cannot be empty".to_string(),
            ));
        }

        self.skins.family()?;

        Ok(())
    }
}

impl SerialConfig {
    /// Per-read timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Wait between reconnect attempts after a failed reconnect
    pub fn reconnect_backoff(&self) -> Duration {
        Duration::from_millis(self.reconnect_backoff_ms)
    }
}

impl SkinsConfig {
    /// Parse the configured family name
    pub fn family(&self) -> Result<ControllerFamily> {
        ControllerFamily::from_name(&self.family).ok_or_else(|| {
            PadViewError::Configuration(format!("unknown controller family: {}", self.family))
        })
    }
}
