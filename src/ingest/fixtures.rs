//! Test fixtures: representative JSON payloads from the external services.
//!
//! Open-Meteo hourly forecast shape:
//!   hourly.time[]          - hour labels, "YYYY-MM-DDTHH:MM", local to the station
//!   hourly.pressure_msl[]  - hPa, may contain null for hours not yet modelled
//!   hourly.precipitation[] - mm over the preceding hour, may contain null
//!
//! ip-api.com shape: a flat object with `status`, `lat`, `lon` and a lot of
//! fields the service ignores.

/// Six hours of forecast ending at 05:00 with a light shower around 03:00.
#[cfg(test)]
pub(crate) fn fixture_open_meteo_json() -> &'static str {
    r#"{
      "latitude": 41.9,
      "longitude": 12.5,
      "generationtime_ms": 0.04,
      "utc_offset_seconds": 0,
      "timezone": "GMT",
      "elevation": 21.0,
      "hourly_units": { "time": "iso8601", "pressure_msl": "hPa", "precipitation": "mm" },
      "hourly": {
        "time": [
          "2026-02-19T00:00", "2026-02-19T01:00", "2026-02-19T02:00",
          "2026-02-19T03:00", "2026-02-19T04:00", "2026-02-19T05:00"
        ],
        "pressure_msl": [1012.1, 1011.6, 1010.9, 1009.8, 1009.0, 1008.4],
        "precipitation": [0.0, 0.4, 1.2, 2.5, 0.8, 0.3]
      }
    }"#
}

/// Trailing hours not yet modelled come back as null.
#[cfg(test)]
pub(crate) fn fixture_open_meteo_with_nulls_json() -> &'static str {
    r#"{
      "hourly": {
        "time": ["2026-02-19T00:00", "2026-02-19T01:00", "2026-02-19T02:00"],
        "pressure_msl": [1010.0, 1012.0, null],
        "precipitation": [0.2, null, 1.0]
      }
    }"#
}

/// Successful ip-api.com lookup.
#[cfg(test)]
pub(crate) fn fixture_ip_api_json() -> &'static str {
    r#"{
      "status": "success",
      "country": "Italy",
      "countryCode": "IT",
      "regionName": "Campania",
      "city": "Salerno",
      "lat": 40.6824,
      "lon": 14.7681,
      "timezone": "Europe/Rome",
      "query": "203.0.113.7"
    }"#
}

/// Rate-limited or private-address lookup: no coordinates.
#[cfg(test)]
pub(crate) fn fixture_ip_api_failure_json() -> &'static str {
    r#"{ "status": "fail", "message": "private range", "query": "10.0.0.4" }"#
}
