//! Core data types for the landslide monitoring service.
//!
//! This module defines the shared domain model imported by all other modules:
//! readings, risk points, risk classes and the error types raised at each
//! boundary. It contains no I/O.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Buffer capacities
// ---------------------------------------------------------------------------

/// Number of live readings kept in memory (current conditions).
pub const READING_CAPACITY: usize = 100;

/// Number of landslide risk points kept in memory (12 minutes at a 2 s cycle).
pub const RISK_HISTORY_CAPACITY: usize = 360;

// ---------------------------------------------------------------------------
// Reading types
// ---------------------------------------------------------------------------

/// One sensor sample enriched with forecast-derived pressure and rain.
///
/// Built by the daemon once per successfully parsed line and never mutated
/// afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub timestamp: DateTime<Local>,
    pub temperature: f64, // °C, from the sensor
    pub humidity: f64,    // %, from the sensor
    pub pressure: f64,    // hPa, latest forecast value
    pub rain: f64,        // mm, cumulative over the trailing forecast window
}

// ---------------------------------------------------------------------------
// Risk types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskClass {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for RiskClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskClass::Low => write!(f, "LOW"),
            RiskClass::Medium => write!(f, "MEDIUM"),
            RiskClass::High => write!(f, "HIGH"),
        }
    }
}

/// One entry of the landslide risk history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskPoint {
    /// Time of day the reading was taken, "HH:MM:SS".
    pub timestamp: String,
    /// Smoothed landslide probability, 0–100.
    pub probability: f64,
    pub class: RiskClass,
}

impl RiskPoint {
    /// The probability as a 0–1 fraction, the form the smoothing model carries.
    pub fn fraction(&self) -> f64 {
        self.probability / 100.0
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// A sensor line that could not be turned into a reading. Always recoverable.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LineError {
    #[error("empty line")]
    Empty,
    #[error("missing field {0}")]
    MissingField(&'static str),
    #[error("field {key} is not a number: {value:?}")]
    InvalidNumber { key: &'static str, value: String },
}

/// Failure to obtain the hourly forecast from the external service.
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("forecast response contained no {0} values")]
    EmptySeries(&'static str),
}

/// Failure to resolve station coordinates from the caller's IP address.
#[derive(Debug, Error)]
pub enum GeoError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("geolocation response had no coordinates")]
    MissingCoordinates,
}

/// Failure to read or append the CSV history log.
#[derive(Debug, Error)]
pub enum HistoryLogError {
    #[error("history log I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("history log CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Failure to load `station.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Failure to open the sensor line source. Fatal at startup.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to open serial port {port}: {source}")]
    Serial {
        port: String,
        #[source]
        source: serialport::Error,
    },
}

/// Why a single ingestion cycle produced no reading.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("malformed sensor line: {0}")]
    Line(#[from] LineError),
    #[error("reading rejected: {0}")]
    InvalidReading(String),
}
