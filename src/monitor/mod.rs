//! Shared in-memory monitoring state.
//!
//! ## Single producer, many readers
//!
//! The daemon thread is the only writer: it appends readings and risk
//! points and refreshes the forecast cache. The endpoint thread only reads.
//!
//! Each buffer sits behind its own `RwLock`. Readers never iterate a live
//! buffer; they copy a snapshot under the read lock and compute averages,
//! trends and risk on the copy, so an eviction can never happen mid-scan.
//!
//! The forecast fetch runs outside any lock. Only the wholesale replacement
//! of the cache takes the write lock, so a slow forecast service never
//! stalls readers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Duration, Local};

use crate::analysis::buffer::RingBuffer;
use crate::ingest::forecast::{ForecastCache, ForecastFetcher, Refresh};
use crate::ingest::geolocation::Coordinates;
use crate::model::{READING_CAPACITY, RISK_HISTORY_CAPACITY, Reading, RiskPoint};

pub struct MonitorState {
    readings: RwLock<RingBuffer<Reading>>,
    risk_history: RwLock<RingBuffer<RiskPoint>>,
    forecast: RwLock<ForecastCache>,
    rain_present: AtomicBool,
    coordinates: Coordinates,
}

impl MonitorState {
    /// State with the standard buffer capacities.
    pub fn new(coordinates: Coordinates, forecast_interval: Duration) -> Self {
        Self::with_capacities(coordinates, forecast_interval, READING_CAPACITY, RISK_HISTORY_CAPACITY)
    }

    pub fn with_capacities(
        coordinates: Coordinates,
        forecast_interval: Duration,
        reading_capacity: usize,
        risk_capacity: usize,
    ) -> Self {
        Self {
            readings: RwLock::new(RingBuffer::with_capacity(reading_capacity)),
            risk_history: RwLock::new(RingBuffer::with_capacity(risk_capacity)),
            forecast: RwLock::new(ForecastCache::with_interval(forecast_interval)),
            rain_present: AtomicBool::new(false),
            coordinates,
        }
    }

    pub fn coordinates(&self) -> Coordinates {
        self.coordinates
    }

    // -----------------------------------------------------------------------
    // Reads (snapshots)
    // -----------------------------------------------------------------------

    /// Copy of the live readings, oldest first.
    pub fn readings(&self) -> Vec<Reading> {
        self.readings.read().unwrap_or_else(PoisonError::into_inner).to_vec()
    }

    pub fn latest_reading(&self) -> Option<Reading> {
        self.readings.read().unwrap_or_else(PoisonError::into_inner).last().cloned()
    }

    /// Copy of the landslide risk history, oldest first.
    pub fn risk_history(&self) -> Vec<RiskPoint> {
        self.risk_history.read().unwrap_or_else(PoisonError::into_inner).to_vec()
    }

    pub fn latest_risk(&self) -> Option<RiskPoint> {
        self.risk_history.read().unwrap_or_else(PoisonError::into_inner).last().cloned()
    }

    /// The smoothing input for the next landslide estimate: the last
    /// recorded probability as a 0–1 fraction, or `None` before the first.
    pub fn previous_probability(&self) -> Option<f64> {
        self.latest_risk().map(|point| point.fraction())
    }

    pub fn forecast(&self) -> ForecastCache {
        self.forecast.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Rain over the trailing `n_hours` of the cached forecast, mm.
    pub fn rain_over(&self, n_hours: usize) -> f64 {
        self.forecast.read().unwrap_or_else(PoisonError::into_inner).cumulative_rain(n_hours)
    }

    /// Whether the rain sensor reported precipitation on the last good line.
    pub fn rain_present(&self) -> bool {
        self.rain_present.load(Ordering::Relaxed)
    }

    // -----------------------------------------------------------------------
    // Writes (producer only)
    // -----------------------------------------------------------------------

    pub fn push_reading(&self, reading: Reading) {
        self.readings.write().unwrap_or_else(PoisonError::into_inner).push(reading);
    }

    pub fn push_risk(&self, point: RiskPoint) {
        self.risk_history.write().unwrap_or_else(PoisonError::into_inner).push(point);
    }

    pub fn set_rain_present(&self, present: bool) {
        self.rain_present.store(present, Ordering::Relaxed);
    }

    /// Refreshes the forecast cache if due. The fetch itself holds no lock.
    pub fn refresh_forecast(&self, now: DateTime<Local>, fetcher: &dyn ForecastFetcher) -> Refresh {
        let due = self.forecast.read().unwrap_or_else(PoisonError::into_inner).is_due(now);
        if !due {
            return Refresh::NotDue;
        }

        match fetcher.fetch(self.coordinates.latitude, self.coordinates.longitude) {
            Ok(series) => {
                self.forecast.write().unwrap_or_else(PoisonError::into_inner).apply(series, now);
                Refresh::Updated
            }
            Err(e) => Refresh::Stale(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::forecast::ForecastSeries;
    use crate::ingest::geolocation::FALLBACK_COORDINATES;
    use crate::model::{ForecastError, RiskClass};
    use std::sync::Arc;
    use std::thread;

    fn state() -> MonitorState {
        MonitorState::new(FALLBACK_COORDINATES, Duration::seconds(60))
    }

    fn reading(rain: f64) -> Reading {
        Reading { timestamp: Local::now(), temperature: 20.0, humidity: 60.0, pressure: 1013.0, rain }
    }

    struct Failing;

    impl ForecastFetcher for Failing {
        fn fetch(&self, _lat: f64, _lon: f64) -> Result<ForecastSeries, ForecastError> {
            Err(ForecastError::EmptySeries("time"))
        }
    }

    struct Fixed;

    impl ForecastFetcher for Fixed {
        fn fetch(&self, lat: f64, lon: f64) -> Result<ForecastSeries, ForecastError> {
            assert_eq!((lat, lon), (41.9, 12.5), "fetch uses the station coordinates");
            Ok(ForecastSeries {
                pressure: 1004.0,
                precip_hourly: vec![1.0, 2.0, 3.0, 4.0],
                timestamps: vec!["2026-02-19T10:00".into(), "2026-02-19T11:00".into()],
            })
        }
    }

    #[test]
    fn test_empty_state() {
        let state = state();
        assert!(state.latest_reading().is_none());
        assert!(state.previous_probability().is_none());
        assert_eq!(state.rain_over(3), 0.0);
        assert!(!state.rain_present());
    }

    #[test]
    fn test_previous_probability_comes_from_last_point() {
        let state = state();
        state.push_risk(RiskPoint { timestamp: "10:00:00".into(), probability: 12.0, class: RiskClass::Low });
        state.push_risk(RiskPoint { timestamp: "10:00:02".into(), probability: 45.0, class: RiskClass::Medium });

        let previous = state.previous_probability().unwrap();
        assert!((previous - 0.45).abs() < 1e-12);
    }

    #[test]
    fn test_buffers_respect_capacities() {
        let state = MonitorState::with_capacities(FALLBACK_COORDINATES, Duration::seconds(60), 3, 2);
        for i in 0..5 {
            state.push_reading(reading(i as f64));
        }
        let rains: Vec<f64> = state.readings().iter().map(|r| r.rain).collect();
        assert_eq!(rains, vec![2.0, 3.0, 4.0]);
        assert_eq!(state.latest_reading().map(|r| r.rain), Some(4.0));
    }

    #[test]
    fn test_refresh_forecast_updates_and_stays_stale_on_failure() {
        let state = state();
        let t0 = Local::now();

        assert!(matches!(state.refresh_forecast(t0, &Fixed), Refresh::Updated));
        assert_eq!(state.rain_over(3), 9.0);
        assert_eq!(state.forecast().pressure, 1004.0);

        let later = t0 + Duration::seconds(120);
        assert!(matches!(state.refresh_forecast(later, &Failing), Refresh::Stale(_)));
        assert_eq!(state.rain_over(3), 9.0, "stale data is still served");
        assert_eq!(state.forecast().latest_forecast_time(), Some("11:00"));
    }

    #[test]
    fn test_concurrent_readers_see_consistent_snapshots() {
        let state = Arc::new(MonitorState::with_capacities(
            FALLBACK_COORDINATES,
            Duration::seconds(60),
            50,
            50,
        ));

        let writer = {
            let state = Arc::clone(&state);
            thread::spawn(move || {
                for i in 0..2_000 {
                    state.push_reading(reading(i as f64));
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let state = Arc::clone(&state);
                thread::spawn(move || {
                    for _ in 0..500 {
                        let snapshot = state.readings();
                        assert!(snapshot.len() <= 50);
                        // Consecutive values: no eviction happened mid-copy
                        for pair in snapshot.windows(2) {
                            assert_eq!(pair[1].rain - pair[0].rain, 1.0);
                        }
                    }
                })
            })
            .collect();

        writer.join().expect("writer panicked");
        for reader in readers {
            reader.join().expect("reader panicked");
        }
    }
}
