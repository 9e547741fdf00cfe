/// landmon_service: landslide-risk monitoring for a serial weather station.
///
/// # Module structure
///
/// ```text
/// landmon_service
/// ├── model       - shared data types (Reading, RiskPoint, RiskClass, error enums)
/// ├── config      - station configuration loader (station.toml)
/// ├── logging     - tracing subscriber setup
/// ├── daemon      - ingestion loop (parse, refresh, build, score, persist)
/// ├── endpoint    - read-only JSON API over the live state
/// ├── history_log - append-only CSV history of every cycle
/// ├── ingest
/// │   ├── line        - sensor line protocol (TEMP=..;HUM=..;RAIN=..)
/// │   ├── serial      - serial/stdin line source that survives timeouts
/// │   ├── forecast    - Open-Meteo client + cached hourly forecast
/// │   ├── geolocation - station coordinates by IP lookup
/// │   └── fixtures (test only) - representative API response payloads
/// ├── monitor     - shared buffers and forecast cache (one writer, many readers)
/// └── analysis
///     ├── buffer  - bounded FIFO ring buffer
///     ├── trend   - averages and rising/falling/flat trends
///     └── risk    - averaged, instantaneous and landslide risk, rain outlook
/// ```

/// Public modules
pub mod analysis;
pub mod config;
pub mod daemon;
pub mod endpoint;
pub mod history_log;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod monitor;
