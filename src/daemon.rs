//! Core ingestion loop for the landslide monitoring station
//!
//! Each sensor line goes through one cycle:
//! 1. Parse the line (malformed lines are logged and dropped)
//! 2. Refresh the hourly forecast if due (failures keep the cached data)
//! 3. Build the reading from sensor values plus forecast pressure and rain
//! 4. Append it to the live buffer
//! 5. Compute the smoothed landslide probability from the previous estimate
//! 6. Append the risk point to the history
//! 7. Append a row to the CSV history log (failures are logged only)
//! 8. Sleep for the fixed cycle delay
//!
//! Nothing after parsing can end the loop. The only way out is the line
//! source closing.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Local};
use tracing::{debug, info, warn};

use crate::analysis::risk::landslide_probability;
use crate::config::ServiceConfig;
use crate::history_log::{HistoryLog, HistoryRecord};
use crate::ingest::forecast::{ForecastFetcher, Refresh};
use crate::ingest::line::{RAIN_PRESENCE_THRESHOLD, SensorLine, parse_line};
use crate::ingest::serial::{LineReader, NextLine};
use crate::model::{CycleError, Reading, RiskPoint};
use crate::monitor::MonitorState;

/// Hours of rain written to the history log's `pioggia_3h` column.
pub const LOG_RAIN_HOURS: usize = 3;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// Pause after each accepted line (default: 2 seconds)
    pub cycle_delay: Duration,

    /// Trailing forecast hours summed into each reading's rain (default: 3)
    pub rain_window_hours: usize,

    /// Raw rain-sensor value below which rain is present (default: 500)
    pub rain_presence_threshold: f64,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            cycle_delay: Duration::from_secs(2),
            rain_window_hours: 3,
            rain_presence_threshold: RAIN_PRESENCE_THRESHOLD,
        }
    }
}

impl From<&ServiceConfig> for DaemonConfig {
    fn from(config: &ServiceConfig) -> Self {
        Self {
            cycle_delay: config.cycle_delay(),
            rain_window_hours: config.forecast.rain_window_hours,
            rain_presence_threshold: config.ingest.rain_presence_threshold,
        }
    }
}

// ---------------------------------------------------------------------------
// Cycle results
// ---------------------------------------------------------------------------

/// What one accepted line produced.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub reading: Reading,
    pub risk: RiskPoint,
    pub rain_present: bool,
    /// False when the history log row could not be written.
    pub persisted: bool,
}

/// Running totals since startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleStats {
    pub accepted: u64,
    pub rejected: u64,
    pub forecast_failures: u64,
    pub log_failures: u64,
}

// ---------------------------------------------------------------------------
// Daemon State
// ---------------------------------------------------------------------------

/// Main daemon state
pub struct Daemon {
    config: DaemonConfig,
    state: Arc<MonitorState>,
    fetcher: Box<dyn ForecastFetcher>,
    history: Option<HistoryLog>,
    stats: CycleStats,
}

impl Daemon {
    pub fn new(config: DaemonConfig, state: Arc<MonitorState>, fetcher: Box<dyn ForecastFetcher>) -> Self {
        Self {
            config,
            state,
            fetcher,
            history: None,
            stats: CycleStats::default(),
        }
    }

    /// Enables the CSV history log.
    pub fn with_history_log(mut self, log: HistoryLog) -> Self {
        self.history = Some(log);
        self
    }

    pub fn state(&self) -> &Arc<MonitorState> {
        &self.state
    }

    pub fn stats(&self) -> CycleStats {
        self.stats
    }

    /// Runs one ingestion cycle for `line` at time `now`, without sleeping.
    ///
    /// Returns an error only when the line is rejected; in that case the
    /// buffers are untouched.
    pub fn process_line(&mut self, line: &str, now: DateTime<Local>) -> Result<CycleReport, CycleError> {
        let result = self.ingest(line, now);
        match &result {
            Ok(_) => self.stats.accepted += 1,
            Err(_) => self.stats.rejected += 1,
        }
        result
    }

    fn ingest(&mut self, line: &str, now: DateTime<Local>) -> Result<CycleReport, CycleError> {
        let sensor = parse_line(line)?;

        match self.state.refresh_forecast(now, self.fetcher.as_ref()) {
            Refresh::Updated => debug!("forecast refreshed"),
            Refresh::NotDue => {}
            Refresh::Stale(e) => {
                self.stats.forecast_failures += 1;
                warn!(error = %e, "forecast refresh failed, using cached forecast");
            }
        }

        let forecast = self.state.forecast();
        let reading = build_reading(
            &sensor,
            forecast.pressure,
            forecast.cumulative_rain(self.config.rain_window_hours),
            now,
        )?;

        let rain_present = sensor.is_raining(self.config.rain_presence_threshold);
        self.state.set_rain_present(rain_present);
        self.state.push_reading(reading.clone());

        let previous = self.state.previous_probability();
        let estimate = landslide_probability(&reading, previous);
        let risk = RiskPoint {
            timestamp: now.format("%H:%M:%S").to_string(),
            probability: estimate.probability,
            class: estimate.class,
        };
        self.state.push_risk(risk.clone());

        let persisted = self.persist(&reading, forecast.cumulative_rain(LOG_RAIN_HOURS), rain_present);

        Ok(CycleReport {
            reading,
            risk,
            rain_present,
            persisted,
        })
    }

    fn persist(&mut self, reading: &Reading, rain_3h: f64, rain_present: bool) -> bool {
        let Some(log) = &self.history else {
            return true;
        };

        let record = HistoryRecord::from_reading(reading, rain_3h, rain_present);
        match log.append(&record) {
            Ok(()) => true,
            Err(e) => {
                self.stats.log_failures += 1;
                warn!(path = %log.path().display(), error = %e, "history log append failed, row dropped");
                false
            }
        }
    }

    /// Main daemon loop. Returns only when the line source closes.
    pub fn run<R: std::io::BufRead>(&mut self, mut source: LineReader<R>) {
        info!(
            cycle_delay_secs = self.config.cycle_delay.as_secs_f64(),
            rain_window_hours = self.config.rain_window_hours,
            "starting ingestion loop"
        );

        loop {
            match source.next_line() {
                Ok(NextLine::Line(line)) if line.is_empty() => continue,
                Ok(NextLine::Line(line)) => match self.process_line(&line, Local::now()) {
                    Ok(report) => {
                        info!(
                            temperature = report.reading.temperature,
                            humidity = report.reading.humidity,
                            pressure = report.reading.pressure,
                            rain = report.reading.rain,
                            probability = format_args!("{:.1}", report.risk.probability),
                            class = %report.risk.class,
                            "reading accepted"
                        );
                        thread::sleep(self.config.cycle_delay);
                    }
                    Err(e) => warn!(line = %line, error = %e, "discarding sensor line"),
                },
                Ok(NextLine::Idle) => continue,
                Ok(NextLine::Closed) => {
                    info!(
                        accepted = self.stats.accepted,
                        rejected = self.stats.rejected,
                        "line source closed, stopping ingestion"
                    );
                    return;
                }
                Err(e) => {
                    warn!(error = %e, "sensor read failed, retrying");
                    thread::sleep(self.config.cycle_delay);
                }
            }
        }
    }
}

/// Combines sensor values with forecast-derived pressure and rain.
fn build_reading(
    sensor: &SensorLine,
    pressure: f64,
    rain: f64,
    now: DateTime<Local>,
) -> Result<Reading, CycleError> {
    if !pressure.is_finite() || !rain.is_finite() {
        return Err(CycleError::InvalidReading(format!(
            "forecast values not finite (pressure {}, rain {})",
            pressure, rain
        )));
    }

    Ok(Reading {
        timestamp: now,
        temperature: sensor.temperature,
        humidity: sensor.humidity,
        pressure,
        rain,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
