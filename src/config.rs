//! Service configuration loader - parses station.toml
//!
//! Keeps deployment details (serial device, coordinates, intervals, file
//! locations) out of the code. Every field has a default, so a missing
//! section or an empty file runs the station with the stock settings.

use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::ingest::forecast::{DEFAULT_REFRESH_INTERVAL_SECS, OPEN_METEO_BASE_URL};
use crate::ingest::geolocation::{Coordinates, IP_API_URL};
use crate::ingest::line::RAIN_PRESENCE_THRESHOLD;
use crate::model::ConfigError;

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "station.toml";

/// Environment variable overriding `[serial] port`.
pub const SERIAL_PORT_ENV: &str = "LANDMON_SERIAL_PORT";

/// Root configuration structure for TOML parsing
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub serial: SerialConfig,
    pub station: StationConfig,
    pub forecast: ForecastConfig,
    pub ingest: IngestConfig,
    pub storage: StorageConfig,
    pub endpoint: EndpointConfig,
}

/// Sensor serial link
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    pub port: String,
    pub baud_rate: u32,
    pub read_timeout_ms: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyACM0".to_string(),
            baud_rate: 9600,
            read_timeout_ms: 1000,
        }
    }
}

/// Station location. Leave latitude/longitude unset to geolocate by IP.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StationConfig {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub geolocation_url: String,
    pub geolocation_timeout_secs: u64,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            latitude: None,
            longitude: None,
            geolocation_url: IP_API_URL.to_string(),
            geolocation_timeout_secs: 5,
        }
    }
}

impl StationConfig {
    /// Coordinates pinned in the file, if both are present.
    pub fn pinned_coordinates(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinates { latitude, longitude }),
            _ => None,
        }
    }
}

/// Open-Meteo forecast client
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    pub base_url: String,
    pub refresh_interval_secs: i64,
    pub timeout_secs: u64,
    /// Trailing hours summed into each reading's rain value.
    pub rain_window_hours: usize,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            base_url: OPEN_METEO_BASE_URL.to_string(),
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
            timeout_secs: 5,
            rain_window_hours: 3,
        }
    }
}

/// Ingestion loop pacing and sensor calibration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub cycle_delay_secs: u64,
    pub rain_presence_threshold: f64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            cycle_delay_secs: 2,
            rain_presence_threshold: RAIN_PRESENCE_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub history_csv: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            history_csv: PathBuf::from("storico_dati.csv"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// Port for the JSON query endpoint; unset disables it.
    pub port: Option<u16>,
}

impl ServiceConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.serial.read_timeout_ms)
    }

    pub fn forecast_timeout(&self) -> Duration {
        Duration::from_secs(self.forecast.timeout_secs)
    }

    pub fn geolocation_timeout(&self) -> Duration {
        Duration::from_secs(self.station.geolocation_timeout_secs)
    }

    pub fn cycle_delay(&self) -> Duration {
        Duration::from_secs(self.ingest.cycle_delay_secs)
    }

    pub fn forecast_interval(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.forecast.refresh_interval_secs)
    }

    /// Applies environment overrides (`LANDMON_SERIAL_PORT`).
    pub fn apply_env_overrides(&mut self) {
        if let Ok(port) = std::env::var(SERIAL_PORT_ENV) {
            if !port.trim().is_empty() {
                self.serial.port = port.trim().to_string();
            }
        }
    }
}

/// Parses configuration from TOML text.
pub fn parse_config(contents: &str, path: &str) -> Result<ServiceConfig, ConfigError> {
    toml::from_str(contents).map_err(|source| ConfigError::Parse {
        path: path.to_string(),
        source,
    })
}

/// Loads configuration from `path`.
///
/// A missing default file yields the stock configuration; an explicitly
/// named file that cannot be read is an error.
pub fn load_config(path: &str) -> Result<ServiceConfig, ConfigError> {
    match fs::read_to_string(path) {
        Ok(contents) => parse_config(&contents, path),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && path == DEFAULT_CONFIG_PATH => {
            Ok(ServiceConfig::default())
        }
        Err(source) => Err(ConfigError::Read {
            path: path.to_string(),
            source,
        }),
    }
}
