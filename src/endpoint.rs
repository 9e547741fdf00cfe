/// HTTP endpoint for querying the station state
///
/// Read-only JSON API over the shared monitor state, for dashboards and
/// external analysis tools. Every handler works on snapshot copies, so a
/// request never blocks the ingestion loop for longer than a buffer copy.
///
/// Endpoints:
/// - GET /health - Service health check
/// - GET /api/latest - Most recent reading
/// - GET /api/averages - Buffer-wide averages
/// - GET /api/risk - Averaged risk
/// - GET /api/risk/instant - Instantaneous risk
/// - GET /api/risk/landslide - Latest smoothed landslide point and raw estimate
/// - GET /api/risk/history - Landslide risk history
/// - GET /api/trend - Trend per metric
/// - GET /api/charts - Parallel series for plotting
/// - GET /api/rain/{hours} - Forecast rain over the trailing hours
/// - GET /api/rain/outlook - Probability of rain today
/// - GET /api/forecast/hour - Time of the latest forecast hour
/// - GET /api/history - Rows of the CSV history log
/// - GET /api/summary - Everything the home view shows

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use crate::analysis::risk::{
    ExternalForecastProbability, LandslideEstimate, RainOutlook, RiskAssessment, averaged_risk,
    instantaneous_risk, landslide_probability, rain_outlook,
};
use crate::analysis::trend::{Averages, TREND_WINDOW, TrendDirection, Trends, averages, trend};
use crate::history_log::read_history;
use crate::ingest::geolocation::Coordinates;
use crate::model::{Reading, RiskPoint};
use crate::monitor::MonitorState;

pub const ENDPOINTS: [&str; 14] = [
    "/health",
    "/api/latest",
    "/api/averages",
    "/api/risk",
    "/api/risk/instant",
    "/api/risk/landslide",
    "/api/risk/history",
    "/api/trend",
    "/api/charts",
    "/api/rain/{hours}",
    "/api/rain/outlook",
    "/api/forecast/hour",
    "/api/history",
    "/api/summary",
];

/// Hours of rain shown on the summary view.
const SUMMARY_RAIN_HOURS: usize = 3;

// ---------------------------------------------------------------------------
// Query Context
// ---------------------------------------------------------------------------

/// Everything the handlers read from.
pub struct QueryContext {
    pub state: Arc<MonitorState>,
    pub history_path: PathBuf,
    pub outlook: Box<dyn ExternalForecastProbability + Send + Sync>,
}

// ---------------------------------------------------------------------------
// Response Types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct TrendEntry {
    pub direction: TrendDirection,
    pub symbol: &'static str,
}

impl From<TrendDirection> for TrendEntry {
    fn from(direction: TrendDirection) -> Self {
        Self {
            direction,
            symbol: direction.symbol(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TrendResponse {
    pub temperature: TrendEntry,
    pub humidity: TrendEntry,
    pub pressure: TrendEntry,
}

impl From<Trends> for TrendResponse {
    fn from(trends: Trends) -> Self {
        Self {
            temperature: trends.temperature.into(),
            humidity: trends.humidity.into(),
            pressure: trends.pressure.into(),
        }
    }
}

/// Parallel arrays, one entry per buffered reading or risk point.
#[derive(Debug, Default, Serialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub temperature: Vec<f64>,
    pub humidity: Vec<f64>,
    pub pressure: Vec<f64>,
    pub rain: Vec<f64>,
    pub risk_labels: Vec<String>,
    pub risk_probability: Vec<f64>,
}

impl ChartSeries {
    pub fn build(readings: &[Reading], history: &[RiskPoint]) -> Self {
        let mut series = ChartSeries::default();

        for reading in readings {
            series.labels.push(reading.timestamp.format("%H:%M:%S").to_string());
            series.temperature.push(reading.temperature);
            series.humidity.push(reading.humidity);
            series.pressure.push(reading.pressure);
            series.rain.push(reading.rain);
        }

        for point in history {
            series.risk_labels.push(point.timestamp.clone());
            series.risk_probability.push(point.probability);
        }

        series
    }
}

#[derive(Debug, Serialize)]
pub struct LandslideResponse {
    /// Last smoothed point from the history.
    pub latest: Option<RiskPoint>,
    /// The latest reading scored on its own, without smoothing.
    pub unsmoothed: Option<LandslideEstimate>,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub coordinates: Coordinates,
    pub reading_count: usize,
    pub latest: Option<Reading>,
    pub averages: Averages,
    pub risk: RiskAssessment,
    pub instant_risk: RiskAssessment,
    pub landslide: Option<RiskPoint>,
    pub trend: TrendResponse,
    pub outlook: RainOutlook,
    pub rain_3h: f64,
    pub rain_present: bool,
    pub forecast_hour: Option<String>,
}

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

/// Maps a request URL to a status code and JSON body.
pub fn route(url: &str, ctx: &QueryContext) -> (u16, serde_json::Value) {
    let path = url.split('?').next().unwrap_or(url).trim_end_matches('/');
    let state = &ctx.state;

    match path {
        "/health" => (
            200,
            json!({
                "status": "ok",
                "service": "landmon_service",
                "version": env!("CARGO_PKG_VERSION"),
                "readings": state.readings().len(),
            }),
        ),
        "/api/latest" => to_json(&state.latest_reading()),
        "/api/averages" => to_json(&averages(&state.readings())),
        "/api/risk" => to_json(&averaged_risk(&state.readings())),
        "/api/risk/instant" => to_json(&instantaneous_risk(&state.readings())),
        "/api/risk/landslide" => to_json(&LandslideResponse {
            latest: state.latest_risk(),
            unsmoothed: state.latest_reading().map(|r| landslide_probability(&r, None)),
        }),
        "/api/risk/history" => to_json(&state.risk_history()),
        "/api/trend" => to_json(&TrendResponse::from(trend(&state.readings(), TREND_WINDOW))),
        "/api/charts" => to_json(&ChartSeries::build(&state.readings(), &state.risk_history())),
        "/api/rain/outlook" => {
            to_json(&rain_outlook(&averages(&state.readings()), ctx.outlook.as_ref()))
        }
        "/api/forecast/hour" => {
            let forecast = state.forecast();
            (200, json!({ "hour": forecast.latest_forecast_time() }))
        }
        "/api/history" => match read_history(&ctx.history_path) {
            Ok(rows) => to_json(&rows),
            Err(e) => {
                warn!(path = %ctx.history_path.display(), error = %e, "history log unreadable");
                (500, json!({ "error": e.to_string() }))
            }
        },
        "/api/summary" => to_json(&summary(ctx)),
        _ => match path.strip_prefix("/api/rain/") {
            Some(hours) => rain_over(state, hours),
            None => (
                404,
                json!({
                    "error": "Not found",
                    "available_endpoints": ENDPOINTS,
                }),
            ),
        },
    }
}

fn rain_over(state: &MonitorState, hours: &str) -> (u16, serde_json::Value) {
    match hours.parse::<usize>() {
        Ok(hours) => (200, json!({ "hours": hours, "rain_mm": state.rain_over(hours) })),
        Err(_) => (
            400,
            json!({
                "error": "hours must be a non-negative integer",
                "hours": hours,
            }),
        ),
    }
}

fn summary(ctx: &QueryContext) -> SummaryResponse {
    let state = &ctx.state;
    let readings = state.readings();
    let avg = averages(&readings);
    let forecast = state.forecast();

    SummaryResponse {
        coordinates: state.coordinates(),
        reading_count: readings.len(),
        latest: readings.last().cloned(),
        averages: avg,
        risk: averaged_risk(&readings),
        instant_risk: instantaneous_risk(&readings),
        landslide: state.latest_risk(),
        trend: trend(&readings, TREND_WINDOW).into(),
        outlook: rain_outlook(&avg, ctx.outlook.as_ref()),
        rain_3h: forecast.cumulative_rain(SUMMARY_RAIN_HOURS),
        rain_present: state.rain_present(),
        forecast_hour: forecast.latest_forecast_time().map(str::to_string),
    }
}

fn to_json<T: Serialize>(value: &T) -> (u16, serde_json::Value) {
    match serde_json::to_value(value) {
        Ok(body) => (200, body),
        Err(e) => (500, json!({ "error": e.to_string() })),
    }
}

// ---------------------------------------------------------------------------
// HTTP Server
// ---------------------------------------------------------------------------

/// Start HTTP endpoint server on the specified port. Blocks serving requests.
pub fn start_endpoint_server(port: u16, ctx: QueryContext) -> Result<(), String> {
    let server = tiny_http::Server::http(format!("0.0.0.0:{}", port))
        .map_err(|e| format!("Failed to start HTTP server: {}", e))?;

    info!(port, "HTTP endpoint listening on http://0.0.0.0:{}", port);

    for request in server.incoming_requests() {
        let (status, body) = route(request.url(), &ctx);
        let response = create_response(status, &body);

        if let Err(e) = request.respond(response) {
            warn!(error = %e, "failed to send response");
        }
    }

    Ok(())
}

/// Create HTTP response with JSON body
fn create_response(status_code: u16, json: &serde_json::Value) -> tiny_http::Response<std::io::Cursor<Vec<u8>>> {
    let body = serde_json::to_string_pretty(json).unwrap_or_else(|_| "{}".to_string());

    let response = tiny_http::Response::from_data(body.into_bytes())
        .with_status_code(tiny_http::StatusCode::from(status_code));

    match tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]) {
        Ok(header) => response.with_header(header),
        Err(()) => response,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::geolocation::FALLBACK_COORDINATES;
    use crate::model::RiskClass;
    use chrono::Local;

    struct Fixed(u32);

    impl ExternalForecastProbability for Fixed {
        fn probability(&self) -> u32 {
            self.0
        }
    }

    fn context() -> QueryContext {
        QueryContext {
            state: Arc::new(MonitorState::new(FALLBACK_COORDINATES, chrono::Duration::seconds(60))),
            history_path: std::env::temp_dir().join("landmon_endpoint_absent.csv"),
            outlook: Box::new(Fixed(40)),
        }
    }

    #[test]
    fn test_health() {
        let (status, body) = route("/health", &context());
        assert_eq!(status, 200);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["readings"], 0);
    }

    #[test]
    fn test_unknown_path_lists_endpoints() {
        let (status, body) = route("/site/05568500", &context());
        assert_eq!(status, 404);
        assert_eq!(body["available_endpoints"].as_array().map(Vec::len), Some(ENDPOINTS.len()));
    }

    #[test]
    fn test_query_string_and_trailing_slash_are_ignored() {
        let (status, _) = route("/api/averages/?fresh=1", &context());
        assert_eq!(status, 200);
    }

    #[test]
    fn test_rain_hours_validation() {
        let ctx = context();
        let (status, body) = route("/api/rain/6", &ctx);
        assert_eq!(status, 200);
        assert_eq!(body["hours"], 6);
        assert_eq!(body["rain_mm"], 0.0);

        let (status, _) = route("/api/rain/-1", &ctx);
        assert_eq!(status, 400);
    }

    #[test]
    fn test_empty_state_is_neutral() {
        let ctx = context();

        assert_eq!(route("/api/latest", &ctx).1, serde_json::Value::Null);
        assert_eq!(route("/api/risk", &ctx).1["class"], "LOW");
        assert_eq!(route("/api/trend", &ctx).1["pressure"]["symbol"], "→");
        assert_eq!(route("/api/forecast/hour", &ctx).1["hour"], serde_json::Value::Null);

        let (status, body) = route("/api/history", &ctx);
        assert_eq!(status, 200);
        assert_eq!(body, json!([]));
    }

    #[test]
    fn test_landslide_reports_smoothed_and_unsmoothed() {
        let ctx = context();
        let reading = Reading {
            timestamp: Local::now(),
            temperature: 20.0,
            humidity: 60.0,
            pressure: 1015.0,
            rain: 100.0,
        };
        ctx.state.push_reading(reading);
        ctx.state.push_risk(RiskPoint {
            timestamp: "12:00:00".into(),
            probability: 20.0,
            class: RiskClass::Low,
        });

        let (_, body) = route("/api/risk/landslide", &ctx);
        assert_eq!(body["latest"]["probability"], 20.0);
        assert_eq!(body["unsmoothed"]["probability"], 50.0);
        assert_eq!(body["unsmoothed"]["class"], "MEDIUM");
    }

    #[test]
    fn test_chart_series_are_parallel() {
        let readings: Vec<Reading> = (0..3)
            .map(|i| Reading {
                timestamp: Local::now(),
                temperature: 20.0 + i as f64,
                humidity: 60.0,
                pressure: 1013.0,
                rain: 0.0,
            })
            .collect();

        let series = ChartSeries::build(&readings, &[]);
        assert_eq!(series.labels.len(), 3);
        assert_eq!(series.temperature, vec![20.0, 21.0, 22.0]);
        assert!(series.risk_probability.is_empty());
    }
}
