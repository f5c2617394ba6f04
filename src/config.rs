//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the
//! station-config.toml file. Every section is optional; missing keys take the
//! values the station was built with (Trinket at 0x08, coils on BCM 4/17/23/24,
//! a three-minute poll, sliding time scale).
//!
//! The one value with no default is the weather source URL. It normally comes
//! from the `API_URL` environment variable and may also be set in `[source]`.

use crate::TimeScale;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Config file read from the working directory.
pub const CONFIG_FILE: &str = "station-config.toml";

/// Environment variable holding the weather source URL.
pub const URL_ENV: &str = "API_URL";

/// Longest accepted poll interval, one day.
pub const MAX_POLL_INTERVAL_MINUTES: i64 = 24 * 60;

/// Settings the station cannot start without.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("no weather source URL: set API_URL or [source] url in station-config.toml")]
    MissingUrl,
}

/// Application configuration loaded from station-config.toml
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Weather data source
    pub source: SourceConfig,
    /// Rendering options
    pub display: DisplayConfig,
    /// Bus, pins and timing of the attached hardware
    pub hardware: HardwareConfig,
    /// Persisted state locations
    pub state: StateConfig,
    /// Tide bell playback
    pub bell: BellConfig,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Fallback URL when `API_URL` is not set
    pub url: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Minutes between polls
    pub poll_interval_minutes: i64,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// "sliding" (time from now) or "fixed" (clock time)
    pub time_scale: TimeScale,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct HardwareConfig {
    /// Linux I2C bus device
    pub i2c_bus: String,
    /// 7-bit address of the Trinket
    pub trinket_address: u8,
    /// GPIO character device for the coil pins
    pub gpio_chip: String,
    /// Coil lines A1, A2, B1, B2 (BCM numbering)
    pub coil_pins: [u32; 4],
    /// Dwell per coil pattern in milliseconds
    pub step_delay_ms: u32,
    /// Pause between showing the temperature strip and moving its needle
    pub settle_delay_ms: u64,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct StateConfig {
    /// Plain-text file holding the wheel position
    pub position_file: String,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct BellConfig {
    /// Player program
    pub command: String,
    /// Sound asset passed to the player
    pub asset: String,
    /// Times the asset is played per tide
    pub repeats: u32,
    /// Run once at startup to set the output volume; empty to skip
    pub volume_command: Vec<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig {
            url: None,
            timeout_secs: 120,
            poll_interval_minutes: 3,
        }
    }
}

impl Default for HardwareConfig {
    fn default() -> Self {
        HardwareConfig {
            i2c_bus: "/dev/i2c-1".to_string(),
            trinket_address: crate::protocol::TRINKET_ADDRESS,
            gpio_chip: "/dev/gpiochip0".to_string(),
            coil_pins: [4, 17, 23, 24],
            step_delay_ms: crate::stepper::STEP_DELAY_MS,
            settle_delay_ms: 100,
        }
    }
}

impl Default for StateConfig {
    fn default() -> Self {
        StateConfig {
            position_file: "state".to_string(),
        }
    }
}

impl Default for BellConfig {
    fn default() -> Self {
        BellConfig {
            command: "aplay".to_string(),
            asset: "./assets/bell.wav".to_string(),
            repeats: 2,
            volume_command: ["amixer", "cset", "numid=3", "100%"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl SourceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Poll interval, clamped to between one minute and one day.
    pub fn poll_interval(&self) -> chrono::Duration {
        chrono::Duration::minutes(
            self.poll_interval_minutes
                .clamp(1, MAX_POLL_INTERVAL_MINUTES),
        )
    }
}

impl Config {
    /// Load configuration from station-config.toml
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load() -> Self {
        Self::load_from_path(CONFIG_FILE)
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => {
                    info!("Loaded configuration from {}", path.as_ref().display());
                    config
                }
                Err(e) => {
                    warn!("Invalid config file format: {}", e);
                    warn!("Using default configuration");
                    Self::default()
                }
            },
            Err(_) => {
                info!("No config file found, using default configuration");
                Self::default()
            }
        }
    }

    /// Weather source URL, preferring the environment over the file.
    pub fn source_url(&self) -> Result<String, ConfigError> {
        resolve_url(env::var(URL_ENV).ok(), self.source.url.as_deref())
    }
}

fn resolve_url(from_env: Option<String>, from_file: Option<&str>) -> Result<String, ConfigError> {
    from_env
        .filter(|u| !u.trim().is_empty())
        .or_else(|| {
            from_file
                .filter(|u| !u.trim().is_empty())
                .map(str::to_string)
        })
        .ok_or(ConfigError::MissingUrl)
}
