//! Station coordinates from IP geolocation.
//!
//! Looked up once at startup unless `station.toml` pins the coordinates.
//! Any failure falls back to central Italy (41.9, 12.5) so the forecast
//! client always has something to ask for.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::model::GeoError;

pub const IP_API_URL: &str = "http://ip-api.com/json";

/// Coordinates used when the lookup fails.
pub const FALLBACK_COORDINATES: Coordinates = Coordinates {
    latitude: 41.9,
    longitude: 12.5,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Deserialize)]
struct IpApiResponse {
    lat: Option<f64>,
    lon: Option<f64>,
}

/// Parses an ip-api.com body into coordinates.
pub fn parse_ip_api_response(body: &str) -> Result<Coordinates, GeoError> {
    let response: IpApiResponse =
        serde_json::from_str(body).map_err(|_| GeoError::MissingCoordinates)?;

    match (response.lat, response.lon) {
        (Some(latitude), Some(longitude)) => Ok(Coordinates { latitude, longitude }),
        _ => Err(GeoError::MissingCoordinates),
    }
}

/// Queries the geolocation service for the public IP of this host.
pub fn fetch_coordinates(
    client: &reqwest::blocking::Client,
    url: &str,
) -> Result<Coordinates, GeoError> {
    let body = client.get(url).send()?.error_for_status()?.text()?;
    parse_ip_api_response(&body)
}

/// Resolves the station coordinates, never failing.
///
/// Pinned coordinates win; otherwise the geolocation service is asked and
/// [`FALLBACK_COORDINATES`] is used when it cannot answer.
pub fn resolve_coordinates(
    pinned: Option<Coordinates>,
    url: &str,
    timeout: std::time::Duration,
) -> Coordinates {
    if let Some(coords) = pinned {
        info!(latitude = coords.latitude, longitude = coords.longitude, "using configured coordinates");
        return coords;
    }

    let lookup = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(GeoError::from)
        .and_then(|client| fetch_coordinates(&client, url));

    match lookup {
        Ok(coords) => {
            info!(latitude = coords.latitude, longitude = coords.longitude, "station located by IP");
            coords
        }
        Err(e) => {
            warn!(error = %e, "geolocation failed, using fallback coordinates");
            FALLBACK_COORDINATES
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
