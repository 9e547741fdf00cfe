//! Append-only CSV history of every ingestion cycle.
//!
//! File layout (header written once, when the file is created):
//!
//! ```text
//! timestamp,temperature,humidity,pressure,pioggia_3h,pioggia_presente
//! 2026-02-19T14:03:11.402+01:00,21.5,60.2,1008.4,3.6,PRESENTE
//! ```
//!
//! The column names match the log written by earlier versions of the
//! station so existing files keep appending cleanly.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::model::{HistoryLogError, Reading};

pub const HISTORY_HEADER: [&str; 6] = [
    "timestamp",
    "temperature",
    "humidity",
    "pressure",
    "pioggia_3h",
    "pioggia_presente",
];

pub const RAIN_PRESENT: &str = "PRESENTE";
pub const RAIN_ABSENT: &str = "ASSENTE";

/// One row of the history log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub timestamp: String,
    pub temperature: f64,
    pub humidity: f64,
    pub pressure: f64,
    #[serde(rename = "pioggia_3h")]
    pub rain_3h: f64,
    #[serde(rename = "pioggia_presente")]
    pub rain_presence: String,
}

impl HistoryRecord {
    pub fn from_reading(reading: &Reading, rain_3h: f64, rain_present: bool) -> Self {
        Self {
            timestamp: reading.timestamp.to_rfc3339(),
            temperature: reading.temperature,
            humidity: reading.humidity,
            pressure: reading.pressure,
            rain_3h,
            rain_presence: if rain_present { RAIN_PRESENT } else { RAIN_ABSENT }.to_string(),
        }
    }
}

/// Handle on the history file.
#[derive(Debug, Clone)]
pub struct HistoryLog {
    path: PathBuf,
}

impl HistoryLog {
    /// Opens the log, creating it with the header row if it does not exist.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, HistoryLogError> {
        let path = path.into();
        write_header_if_missing(&path)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one row. The file is reopened per row, and recreated with its
    /// header if it was rotated or deleted since the last append.
    pub fn append(&self, record: &HistoryRecord) -> Result<(), HistoryLogError> {
        write_header_if_missing(&self.path)?;

        let file = OpenOptions::new().append(true).create(true).open(&self.path)?;
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        writer.serialize(record)?;
        writer.flush()?;
        Ok(())
    }
}

fn write_header_if_missing(path: &Path) -> Result<(), HistoryLogError> {
    if path.exists() {
        return Ok(());
    }

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(HISTORY_HEADER)?;
    writer.flush()?;
    Ok(())
}

/// Reads every row of the history log. A missing file is an empty history.
pub fn read_history(path: &Path) -> Result<Vec<HistoryRecord>, HistoryLogError> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let mut reader = csv::Reader::from_path(path)?;
    let mut records = Vec::new();
    for row in reader.deserialize() {
        records.push(row?);
    }
    Ok(records)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};

    fn scratch_path(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "landmon_{}_{}_{}.csv",
            name,
            std::process::id(),
            Local::now().timestamp_nanos_opt().unwrap_or_default()
        ));
        let _ = std::fs::remove_file(&path);
        path
    }

    fn sample_reading() -> Reading {
        Reading {
            timestamp: Local.with_ymd_and_hms(2026, 2, 19, 14, 3, 11).unwrap(),
            temperature: 21.5,
            humidity: 60.2,
            pressure: 1008.4,
            rain: 3.6,
        }
    }

    #[test]
    fn test_open_writes_header_once() {
        let path = scratch_path("header");

        HistoryLog::open(&path).unwrap();
        HistoryLog::open(&path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "timestamp,temperature,humidity,pressure,pioggia_3h,pioggia_presente\n");
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_append_and_read_back() {
        let path = scratch_path("append");
        let log = HistoryLog::open(&path).unwrap();

        let wet = HistoryRecord::from_reading(&sample_reading(), 3.6, true);
        let dry = HistoryRecord::from_reading(&sample_reading(), 0.0, false);
        log.append(&wet).unwrap();
        log.append(&dry).unwrap();

        let rows = read_history(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], wet);
        assert_eq!(rows[0].rain_presence, "PRESENTE");
        assert_eq!(rows[1].rain_presence, "ASSENTE");
        assert!(rows[0].timestamp.starts_with("2026-02-19T14:03:11"));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_missing_file_reads_as_empty() {
        let path = scratch_path("missing");
        assert!(read_history(&path).unwrap().is_empty());
    }

    #[test]
    fn test_append_recreates_rotated_file() {
        let path = scratch_path("rotate");
        let rotated = path.with_extension("csv.1");
        let log = HistoryLog::open(&path).unwrap();
        let record = HistoryRecord::from_reading(&sample_reading(), 1.2, true);

        log.append(&record).unwrap();
        std::fs::rename(&path, &rotated).unwrap();

        for _ in 0..3 {
            log.append(&record).unwrap();
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("timestamp,temperature,humidity,pressure,pioggia_3h,pioggia_presente\n"));
        assert_eq!(read_history(&path).unwrap().len(), 3);
        assert_eq!(read_history(&rotated).unwrap().len(), 1, "rotated file is left alone");

        let _ = std::fs::remove_file(&path);
        let _ = std::fs::remove_file(&rotated);
    }

    #[test]
    fn test_append_to_unwritable_location_fails() {
        let log = HistoryLog {
            path: std::env::temp_dir().join("landmon_no_such_dir").join("log.csv"),
        };
        let record = HistoryRecord::from_reading(&sample_reading(), 0.0, false);
        assert!(log.append(&record).is_err());
    }
}
