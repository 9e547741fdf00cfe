//! Landslide and weather risk estimators.
//!
//! Four independent estimates share the same readings:
//!
//! - **averaged risk**: threshold breaches over the whole live buffer
//! - **instantaneous risk**: threshold breaches over the last few readings
//! - **landslide probability**: weighted rain/humidity/pressure model with
//!   exponential smoothing against the previous cycle's estimate
//! - **rain outlook**: an external precipitation probability nudged by local
//!   conditions (advisory only, not part of the landslide model)
//!
//! All functions are pure. The landslide model's only carried state is the
//! previous smoothed probability, which the caller passes in.

use serde::Serialize;

use crate::analysis::trend::{Averages, averages, mean};
use crate::model::{Reading, RiskClass};

// ---------------------------------------------------------------------------
// Thresholds
// ---------------------------------------------------------------------------

/// Comfortable temperature band, °C. Outside it counts as a breach.
pub const TEMPERATURE_BAND: (f64, f64) = (19.0, 26.0);
pub const HUMIDITY_LIMIT: f64 = 75.0;
/// Total rain over the live buffer, mm.
pub const AVERAGED_RAIN_LIMIT: f64 = 10.0;
/// Summed rain over the instantaneous window, mm.
pub const INSTANT_RAIN_LIMIT: f64 = 3.0;
/// Readings considered by the instantaneous estimate.
pub const INSTANT_WINDOW: usize = 4;

/// Weight of the previous estimate in the smoothed landslide probability.
pub const SMOOTHING_WEIGHT: f64 = 0.7;

// ---------------------------------------------------------------------------
// Threshold-count risk
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskAssessment {
    pub class: RiskClass,
    /// Number of thresholds breached (0–3).
    pub score: u8,
    pub explanation: String,
}

fn temperature_out_of_band(temperature: f64) -> bool {
    temperature < TEMPERATURE_BAND.0 || temperature > TEMPERATURE_BAND.1
}

/// Risk class from buffer-wide averages: 0 breaches LOW, 1–2 MEDIUM, 3 HIGH.
pub fn classify_averages(avg: &Averages) -> RiskAssessment {
    let score = [
        temperature_out_of_band(avg.temperature),
        avg.humidity > HUMIDITY_LIMIT,
        avg.rain > AVERAGED_RAIN_LIMIT,
    ]
    .iter()
    .filter(|&&breach| breach)
    .count() as u8;

    let (class, explanation) = match score {
        0 => (RiskClass::Low, "Temperature in range, low humidity and little rain."),
        1 | 2 => (
            RiskClass::Medium,
            "Slightly critical conditions: one or two variables out of range.",
        ),
        _ => (
            RiskClass::High,
            "Critical conditions: several variables out of range, high risk.",
        ),
    };

    RiskAssessment {
        class,
        score,
        explanation: explanation.to_string(),
    }
}

/// Averaged risk over the whole live buffer. An empty buffer is LOW with an
/// explanation rather than a score of its all-zero averages.
pub fn averaged_risk(readings: &[Reading]) -> RiskAssessment {
    if readings.is_empty() {
        return RiskAssessment {
            class: RiskClass::Low,
            score: 0,
            explanation: "Insufficient data: no readings received yet.".to_string(),
        };
    }

    classify_averages(&averages(readings))
}

/// Risk over the trailing [`INSTANT_WINDOW`] readings: 0 breaches LOW,
/// 1 MEDIUM, 2 or more HIGH. Rain is summed over the window.
///
/// Fewer than two readings in the buffer yields LOW with an explanation
/// instead of an error.
pub fn instantaneous_risk(readings: &[Reading]) -> RiskAssessment {
    if readings.len() < 2 {
        return RiskAssessment {
            class: RiskClass::Low,
            score: 0,
            explanation: "Insufficient data for a reliable instantaneous assessment.".to_string(),
        };
    }

    let window = &readings[readings.len().saturating_sub(INSTANT_WINDOW)..];
    let temperature = mean(window.iter().map(|r| r.temperature));
    let humidity = mean(window.iter().map(|r| r.humidity));
    let rain: f64 = window.iter().map(|r| r.rain).sum();

    let score = [
        temperature_out_of_band(temperature),
        humidity > HUMIDITY_LIMIT,
        rain > INSTANT_RAIN_LIMIT,
    ]
    .iter()
    .filter(|&&breach| breach)
    .count() as u8;

    let class = match score {
        0 => RiskClass::Low,
        1 => RiskClass::Medium,
        _ => RiskClass::High,
    };

    let explanation = format!(
        "Instantaneous risk is {} based on the last {} readings: mean temperature {:.1} °C, \
         mean humidity {:.1} % and accumulated rain {:.1} mm. \
         This reflects recent local conditions and can change quickly.",
        class,
        window.len(),
        temperature,
        humidity,
        rain
    );

    RiskAssessment { class, score, explanation }
}

// ---------------------------------------------------------------------------
// Landslide probability model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LandslideEstimate {
    /// Smoothed probability, 0–100.
    pub probability: f64,
    pub class: RiskClass,
    /// Unsmoothed weighted score of this reading alone, 0–1.
    pub raw: f64,
}

impl LandslideEstimate {
    /// Probability as the 0–1 fraction fed back as the next `previous`.
    pub fn fraction(&self) -> f64 {
        self.probability / 100.0
    }
}

/// Weighted rain/humidity/pressure score of a single reading, 0–1 before
/// clamping.
pub fn raw_landslide_score(reading: &Reading) -> f64 {
    let p_rain = (reading.rain / 100.0).min(1.0);
    let p_humidity = ((reading.humidity - 60.0) / 40.0).max(0.0);
    let p_pressure = ((1015.0 - reading.pressure) / 20.0).max(0.0);

    0.5 * p_rain + 0.3 * p_humidity + 0.2 * p_pressure
}

/// Landslide probability for `reading`, smoothed against `previous` (0–1).
///
/// With no previous estimate the raw score is used as-is. The result is
/// clamped to [0, 1] and reported as a percentage: below 33 LOW, below 66
/// MEDIUM, otherwise HIGH. Feeding the same reading repeatedly converges
/// towards its raw score rather than jumping to it.
pub fn landslide_probability(reading: &Reading, previous: Option<f64>) -> LandslideEstimate {
    let raw = raw_landslide_score(reading);

    let smoothed = match previous {
        Some(prev) => SMOOTHING_WEIGHT * prev + (1.0 - SMOOTHING_WEIGHT) * raw,
        None => raw,
    };

    let probability = smoothed.clamp(0.0, 1.0) * 100.0;

    let class = if probability < 33.0 {
        RiskClass::Low
    } else if probability < 66.0 {
        RiskClass::Medium
    } else {
        RiskClass::High
    };

    LandslideEstimate { probability, class, raw }
}

// ---------------------------------------------------------------------------
// Rain outlook
// ---------------------------------------------------------------------------

/// Source of the external daily precipitation probability, percent.
pub trait ExternalForecastProbability {
    fn probability(&self) -> u32;
}

/// Stand-in for a real precipitation-probability feed: uniform 20–80 %.
pub struct RandomForecastProbability;

impl ExternalForecastProbability for RandomForecastProbability {
    fn probability(&self) -> u32 {
        use rand::Rng;
        rand::thread_rng().gen_range(20..=80)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RainOutlook {
    /// Final probability of rain today, percent, at most 100.
    pub probability: u32,
    /// The external probability before local adjustments.
    pub external: u32,
    pub explanation: String,
}

/// Combines the external probability with local boosts: +10 humid air,
/// +10 low pressure, +15 recent rain.
pub fn rain_outlook(avg: &Averages, source: &dyn ExternalForecastProbability) -> RainOutlook {
    let external = source.probability();

    let mut local = 0;
    if avg.humidity > HUMIDITY_LIMIT {
        local += 10;
    }
    if avg.pressure < 1010.0 {
        local += 10;
    }
    if avg.rain > 2.0 {
        local += 15;
    }

    let probability = (external + local).min(100);

    let explanation = format!(
        "Estimated probability of rain today is {}%. It combines the external forecast \
         ({}%) with local conditions measured by the station.",
        probability, external
    );

    RainOutlook { probability, external, explanation }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
