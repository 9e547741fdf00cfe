//! Landslide Monitoring Station - Main Daemon
//!
//! A daemon attached to the station's sensor board that continuously:
//! 1. Reads TEMP/HUM/RAIN lines from the serial port
//! 2. Enriches them with forecast pressure and rain from Open-Meteo
//! 3. Keeps a rolling buffer of readings and a landslide risk history
//! 4. Appends every cycle to a CSV history log
//! 5. Optionally serves the live state as JSON over HTTP
//!
//! Usage:
//!   cargo run --release                         # Read the configured serial port
//!   cargo run --release -- --endpoint 8080      # Also serve JSON on port 8080
//!   cargo run --bin simulate_station | cargo run --release -- --stdin
//!
//! Environment:
//!   LANDMON_SERIAL_PORT - serial device, overrides station.toml
//!   RUST_LOG            - log filter (default landmon_service=info)

use std::env;
use std::io::{self, BufReader};
use std::sync::Arc;

use landmon_service::analysis::risk::RandomForecastProbability;
use landmon_service::config::{self, DEFAULT_CONFIG_PATH};
use landmon_service::daemon::{Daemon, DaemonConfig};
use landmon_service::endpoint::{self, QueryContext};
use landmon_service::history_log::HistoryLog;
use landmon_service::ingest::forecast::OpenMeteoClient;
use landmon_service::ingest::geolocation::resolve_coordinates;
use landmon_service::ingest::serial::{LineReader, open_serial};
use landmon_service::logging;
use landmon_service::monitor::MonitorState;
use tracing::{error, info, warn};

fn main() {
    println!("⛰️  Landslide Monitoring Station");
    println!("===============================\n");

    dotenv::dotenv().ok();
    logging::init();

    // Parse command-line arguments
    let args: Vec<String> = env::args().collect();
    let mut config_path = DEFAULT_CONFIG_PATH.to_string();
    let mut endpoint_port: Option<u16> = None;
    let mut use_stdin = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                if i + 1 < args.len() {
                    config_path = args[i + 1].clone();
                    i += 2;
                } else {
                    eprintln!("Error: --config requires a path");
                    std::process::exit(1);
                }
            }
            "--endpoint" => {
                if i + 1 < args.len() {
                    endpoint_port = args[i + 1].parse().ok();
                    i += 2;
                } else {
                    eprintln!("Error: --endpoint requires a port number");
                    std::process::exit(1);
                }
            }
            "--stdin" => {
                use_stdin = true;
                i += 1;
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                eprintln!("Usage: {} [--config PATH] [--endpoint PORT] [--stdin]", args[0]);
                std::process::exit(1);
            }
        }
    }

    let mut config = match config::load_config(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("\n❌ Configuration error: {}\n", e);
            std::process::exit(1);
        }
    };
    config.apply_env_overrides();

    // Locate the station and set up the shared state
    let coordinates = resolve_coordinates(
        config.station.pinned_coordinates(),
        &config.station.geolocation_url,
        config.geolocation_timeout(),
    );
    let state = Arc::new(MonitorState::new(coordinates, config.forecast_interval()));

    let fetcher = match OpenMeteoClient::new(&config.forecast.base_url, config.forecast_timeout()) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("\n❌ Failed to build forecast client: {}\n", e);
            std::process::exit(1);
        }
    };

    let mut daemon = Daemon::new(DaemonConfig::from(&config), Arc::clone(&state), Box::new(fetcher));

    match HistoryLog::open(&config.storage.history_csv) {
        Ok(log) => {
            info!(path = %log.path().display(), "history log ready");
            daemon = daemon.with_history_log(log);
        }
        Err(e) => warn!(
            path = %config.storage.history_csv.display(),
            error = %e,
            "history log unavailable, continuing without it"
        ),
    }

    // Start HTTP endpoint if requested (in background thread)
    if let Some(port) = endpoint_port.or(config.endpoint.port) {
        let ctx = QueryContext {
            state: Arc::clone(&state),
            history_path: config.storage.history_csv.clone(),
            outlook: Box::new(RandomForecastProbability),
        };
        std::thread::spawn(move || {
            if let Err(e) = endpoint::start_endpoint_server(port, ctx) {
                error!(error = %e, "endpoint server stopped");
            }
        });
        println!("🚀 Endpoint running on http://0.0.0.0:{}\n", port);
    }

    println!("🔄 Starting ingestion loop...");
    println!(
        "   Station at {:.4}, {:.4}",
        coordinates.latitude, coordinates.longitude
    );
    println!("   Cycle delay: {} s", config.ingest.cycle_delay_secs);
    println!("   Press Ctrl+C to stop\n");

    if use_stdin {
        info!("reading sensor lines from stdin");
        daemon.run(LineReader::new(io::stdin().lock()));
        return;
    }

    let port = match open_serial(&config.serial.port, config.serial.baud_rate, config.read_timeout()) {
        Ok(port) => port,
        Err(e) => {
            eprintln!("\n❌ {}\n", e);
            eprintln!("Set LANDMON_SERIAL_PORT or [serial] port in {}\n", config_path);
            std::process::exit(1);
        }
    };
    info!(port = %config.serial.port, baud = config.serial.baud_rate, "serial port open");

    daemon.run(LineReader::new(BufReader::new(port)));
}
