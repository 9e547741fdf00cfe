//! Open-Meteo hourly forecast client and the local forecast cache.
//!
//! The station has no barometer or rain gauge, so pressure and rainfall
//! amounts come from the Open-Meteo forecast for the station coordinates:
//!   https://api.open-meteo.com/v1/forecast?hourly=pressure_msl,precipitation
//!
//! The cache is refreshed at most once per interval. A failed refresh leaves
//! the previous series in place; the daemon keeps running on stale data for
//! as long as the service stays unreachable.

use chrono::{DateTime, Duration, Local};
use serde::{Deserialize, Serialize};

use crate::model::ForecastError;

pub const OPEN_METEO_BASE_URL: &str = "https://api.open-meteo.com/v1/forecast";

/// Pressure assumed until the first successful refresh (standard sea level, hPa).
pub const DEFAULT_PRESSURE_HPA: f64 = 1015.0;

/// Minimum time between two forecast fetches.
pub const DEFAULT_REFRESH_INTERVAL_SECS: i64 = 60;

// ---------------------------------------------------------------------------
// Open-Meteo response structures
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ForecastResponse {
    hourly: HourlyBlock,
}

#[derive(Deserialize)]
struct HourlyBlock {
    time: Vec<String>,
    #[serde(default)]
    pressure_msl: Vec<Option<f64>>,
    #[serde(default)]
    precipitation: Vec<Option<f64>>,
}

/// The parts of a forecast response the service consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastSeries {
    /// Last pressure value in the hourly series, hPa.
    pub pressure: f64,
    /// Hourly precipitation, mm, oldest first.
    pub precip_hourly: Vec<f64>,
    /// Hour labels as returned by the API, e.g. "2026-02-19T14:00".
    pub timestamps: Vec<String>,
}

/// Parses an Open-Meteo hourly forecast body.
///
/// Null precipitation hours count as dry so the series stays aligned with the
/// hour labels; null pressure entries are skipped. A response without any
/// pressure value or any hour label is rejected so a half-empty payload never
/// replaces a good cache.
pub fn parse_forecast_response(body: &str) -> Result<ForecastSeries, ForecastError> {
    let response: ForecastResponse = serde_json::from_str(body)?;
    let hourly = response.hourly;

    let pressure = hourly
        .pressure_msl
        .iter()
        .rev()
        .find_map(|p| *p)
        .ok_or(ForecastError::EmptySeries("pressure_msl"))?;

    if hourly.time.is_empty() {
        return Err(ForecastError::EmptySeries("time"));
    }

    Ok(ForecastSeries {
        pressure,
        precip_hourly: hourly.precipitation.into_iter().map(|mm| mm.unwrap_or(0.0)).collect(),
        timestamps: hourly.time,
    })
}

// ---------------------------------------------------------------------------
// Fetcher
// ---------------------------------------------------------------------------

/// Source of hourly forecasts. Implemented by the HTTP client in production
/// and by canned series in tests.
pub trait ForecastFetcher {
    fn fetch(&self, latitude: f64, longitude: f64) -> Result<ForecastSeries, ForecastError>;
}

/// Blocking Open-Meteo client with a bounded request timeout.
pub struct OpenMeteoClient {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl OpenMeteoClient {
    pub fn new(base_url: &str, timeout: std::time::Duration) -> Result<Self, ForecastError> {
        let client = reqwest::blocking::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

impl ForecastFetcher for OpenMeteoClient {
    fn fetch(&self, latitude: f64, longitude: f64) -> Result<ForecastSeries, ForecastError> {
        let url = format!(
            "{}?latitude={}&longitude={}&hourly=pressure_msl,precipitation&forecast_days=1",
            self.base_url, latitude, longitude
        );

        let body = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()?
            .error_for_status()?
            .text()?;

        parse_forecast_response(&body)
    }
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

/// What a call to [`ForecastCache::refresh`] did.
#[derive(Debug)]
pub enum Refresh {
    /// A new series replaced the cache.
    Updated,
    /// The refresh interval has not elapsed; nothing was fetched.
    NotDue,
    /// The fetch failed; the cache still holds the last good (or default) data.
    Stale(ForecastError),
}

/// Locally held copy of the latest hourly forecast.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastCache {
    pub pressure: f64,
    pub precip_hourly: Vec<f64>,
    pub timestamps: Vec<String>,
    pub last_refresh: Option<DateTime<Local>>,
    pub latest_forecast_hour: Option<String>,
    #[serde(skip)]
    refresh_interval: Duration,
}

impl Default for ForecastCache {
    fn default() -> Self {
        Self::with_interval(Duration::seconds(DEFAULT_REFRESH_INTERVAL_SECS))
    }
}

impl ForecastCache {
    pub fn with_interval(refresh_interval: Duration) -> Self {
        Self {
            pressure: DEFAULT_PRESSURE_HPA,
            precip_hourly: Vec::new(),
            timestamps: Vec::new(),
            last_refresh: None,
            latest_forecast_hour: None,
            refresh_interval,
        }
    }

    /// True when the cache has never been filled or the interval has elapsed.
    pub fn is_due(&self, now: DateTime<Local>) -> bool {
        match self.last_refresh {
            None => true,
            Some(last) => now - last >= self.refresh_interval,
        }
    }

    /// Replaces the cached forecast wholesale.
    pub fn apply(&mut self, series: ForecastSeries, now: DateTime<Local>) {
        self.latest_forecast_hour = series.timestamps.last().cloned();
        self.pressure = series.pressure;
        self.precip_hourly = series.precip_hourly;
        self.timestamps = series.timestamps;
        self.last_refresh = Some(now);
    }

    /// Fetches a new forecast if one is due. Failures are reported, never
    /// propagated, and leave the cache untouched.
    pub fn refresh(
        &mut self,
        now: DateTime<Local>,
        fetcher: &dyn ForecastFetcher,
        latitude: f64,
        longitude: f64,
    ) -> Refresh {
        if !self.is_due(now) {
            return Refresh::NotDue;
        }

        match fetcher.fetch(latitude, longitude) {
            Ok(series) => {
                self.apply(series, now);
                Refresh::Updated
            }
            Err(e) => Refresh::Stale(e),
        }
    }

    /// Total precipitation over the last `n_hours` of the series, mm, rounded
    /// to one decimal. Asking for more hours than the series holds sums it all.
    pub fn cumulative_rain(&self, n_hours: usize) -> f64 {
        if self.precip_hourly.is_empty() {
            return 0.0;
        }

        let start = self.precip_hourly.len().saturating_sub(n_hours);
        round1(self.precip_hourly[start..].iter().sum())
    }

    /// Time-of-day part of the latest forecast hour ("14:00"), if any.
    pub fn latest_forecast_time(&self) -> Option<&str> {
        self.latest_forecast_hour
            .as_deref()
            .map(|label| label.split_once('T').map_or(label, |(_, time)| time))
    }
}

pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
