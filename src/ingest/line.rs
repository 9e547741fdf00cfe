//! Sensor line protocol parser.
//!
//! The station microcontroller writes one ASCII line per sample:
//!
//! ```text
//! TEMP=21.5;HUM=60.2;RAIN=480
//! ```
//!
//! Fields are separated by `;` and split on the first `=`. Unknown keys are
//! ignored so firmware can add fields without breaking the daemon.

use std::collections::HashMap;

use crate::model::LineError;

pub const KEY_TEMPERATURE: &str = "TEMP";
pub const KEY_HUMIDITY: &str = "HUM";
pub const KEY_RAIN: &str = "RAIN";

/// Raw rain-sensor value below which rain is considered present.
/// The resistive sensor reads lower as the plate gets wet.
pub const RAIN_PRESENCE_THRESHOLD: f64 = 500.0;

/// The typed content of one sensor line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorLine {
    pub temperature: f64,
    pub humidity: f64,
    /// Raw rain-sensor reading (unitless ADC value, not millimetres).
    pub rain_raw: f64,
}

impl SensorLine {
    /// Whether the rain sensor reports precipitation right now.
    pub fn is_raining(&self, threshold: f64) -> bool {
        self.rain_raw < threshold
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Splits a line into its `KEY=value` fields. Parts without `=` are skipped;
/// later duplicates win.
pub fn parse_fields(line: &str) -> HashMap<String, String> {
    line.split(';')
        .filter_map(|part| part.split_once('='))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect()
}

/// Parses a sensor line into typed values.
///
/// Fails on blank lines and when any of `TEMP`, `HUM`, `RAIN` is missing or
/// not a finite number.
pub fn parse_line(line: &str) -> Result<SensorLine, LineError> {
    if line.trim().is_empty() {
        return Err(LineError::Empty);
    }

    let fields = parse_fields(line);

    Ok(SensorLine {
        temperature: numeric_field(&fields, KEY_TEMPERATURE)?,
        humidity: numeric_field(&fields, KEY_HUMIDITY)?,
        rain_raw: numeric_field(&fields, KEY_RAIN)?,
    })
}

fn numeric_field(fields: &HashMap<String, String>, key: &'static str) -> Result<f64, LineError> {
    let raw = fields.get(key).ok_or(LineError::MissingField(key))?;

    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(LineError::InvalidNumber {
            key,
            value: raw.clone(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
