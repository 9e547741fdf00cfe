//! Buffer-wide averages and short-term trend indicators.
//!
//! Trends compare the last `window` readings against the `window` readings
//! just before them. Too few readings is not an error: every metric is
//! reported flat until the buffer holds two full windows.

use serde::Serialize;

use crate::ingest::forecast::round1;
use crate::model::Reading;

/// Readings per trend sub-window.
pub const TREND_WINDOW: usize = 6;

/// Mean difference beyond which a metric counts as moving.
pub const TREND_THRESHOLD: f64 = 0.3;

// ---------------------------------------------------------------------------
// Averages
// ---------------------------------------------------------------------------

/// Buffer-wide conditions. `rain` is a total, not a mean.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Averages {
    pub temperature: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub rain: f64,
}

/// Mean temperature, humidity and pressure plus total rain, one decimal.
/// An empty buffer averages to all zeros.
pub fn averages(readings: &[Reading]) -> Averages {
    if readings.is_empty() {
        return Averages { temperature: 0.0, humidity: 0.0, pressure: 0.0, rain: 0.0 };
    }

    Averages {
        temperature: round1(mean(readings.iter().map(|r| r.temperature))),
        humidity: round1(mean(readings.iter().map(|r| r.humidity))),
        pressure: round1(mean(readings.iter().map(|r| r.pressure))),
        rain: round1(readings.iter().map(|r| r.rain).sum()),
    }
}

pub(crate) fn mean(values: impl ExactSizeIterator<Item = f64>) -> f64 {
    let n = values.len();
    if n == 0 {
        return 0.0;
    }
    values.sum::<f64>() / n as f64
}

// ---------------------------------------------------------------------------
// Trends
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Rising,
    Falling,
    Flat,
}

impl TrendDirection {
    /// Arrow shown on the dashboard.
    pub fn symbol(self) -> &'static str {
        match self {
            TrendDirection::Rising => "↑",
            TrendDirection::Falling => "↓",
            TrendDirection::Flat => "→",
        }
    }

    fn classify(diff: f64) -> Self {
        if diff > TREND_THRESHOLD {
            TrendDirection::Rising
        } else if diff < -TREND_THRESHOLD {
            TrendDirection::Falling
        } else {
            TrendDirection::Flat
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Trends {
    pub temperature: TrendDirection,
    pub humidity: TrendDirection,
    pub pressure: TrendDirection,
}

impl Trends {
    pub const FLAT: Trends = Trends {
        temperature: TrendDirection::Flat,
        humidity: TrendDirection::Flat,
        pressure: TrendDirection::Flat,
    };
}

/// Direction of each metric over the last `window` readings compared with
/// the `window` before them.
pub fn trend(readings: &[Reading], window: usize) -> Trends {
    if window == 0 || readings.len() < window * 2 {
        return Trends::FLAT;
    }

    let recent = &readings[readings.len() - window..];
    let previous = &readings[readings.len() - 2 * window..readings.len() - window];

    Trends {
        temperature: direction(recent, previous, |r| r.temperature),
        humidity: direction(recent, previous, |r| r.humidity),
        pressure: direction(recent, previous, |r| r.pressure),
    }
}

fn direction(recent: &[Reading], previous: &[Reading], metric: fn(&Reading) -> f64) -> TrendDirection {
    let diff = mean(recent.iter().map(metric)) - mean(previous.iter().map(metric));
    TrendDirection::classify(diff)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
