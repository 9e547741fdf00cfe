//! Station Simulator
//!
//! Prints sensor lines in the station's serial protocol so the daemon can be
//! run without hardware:
//!
//!   TEMP=21.4;HUM=63.0;RAIN=812
//!
//! Temperature and humidity drift as a bounded random walk. The raw rain
//! sensor value reads high when dry and drops below 500 during simulated
//! showers.
//!
//! Usage:
//!   cargo run --bin simulate_station -- [--interval SECS] [--count N] [--wet]
//!   cargo run --bin simulate_station | cargo run --release -- --stdin

use std::env;
use std::io::{self, Write};
use std::thread;
use std::time::Duration;

use rand::Rng;

struct Walk {
    temperature: f64,
    humidity: f64,
    raining: bool,
}

impl Walk {
    fn step(&mut self, rng: &mut impl Rng, wet: bool) -> String {
        self.temperature = (self.temperature + rng.gen_range(-0.4..=0.4)).clamp(5.0, 35.0);
        self.humidity = (self.humidity + rng.gen_range(-1.5..=1.5)).clamp(20.0, 100.0);

        // Showers start and stop now and then; --wet keeps them going
        let flip_odds = if wet { 0.02 } else { 0.05 };
        if rng.gen_range(0.0..1.0) < flip_odds {
            self.raining = !self.raining;
        }
        if wet {
            self.raining = true;
        }

        let rain_raw: u32 = if self.raining {
            rng.gen_range(150..=480)
        } else {
            rng.gen_range(600..=1023)
        };

        format!(
            "TEMP={:.1};HUM={:.1};RAIN={}",
            self.temperature, self.humidity, rain_raw
        )
    }
}

/// Longest accepted pause between lines, one day.
const MAX_INTERVAL_SECS: f64 = 86_400.0;

fn parse_interval(arg: &str) -> Option<f64> {
    arg.parse::<f64>()
        .ok()
        .filter(|secs| secs.is_finite() && (0.0..=MAX_INTERVAL_SECS).contains(secs))
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let mut interval_secs: f64 = 2.0;
    let mut count: Option<u64> = None;
    let mut wet = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--interval" if i + 1 < args.len() => {
                interval_secs = parse_interval(&args[i + 1]).unwrap_or_else(|| {
                    eprintln!(
                        "Error: --interval requires a number of seconds between 0 and {}",
                        MAX_INTERVAL_SECS
                    );
                    std::process::exit(1);
                });
                i += 2;
            }
            "--count" if i + 1 < args.len() => {
                count = args[i + 1].parse().ok();
                i += 2;
            }
            "--wet" => {
                wet = true;
                i += 1;
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                eprintln!("Usage: {} [--interval SECS] [--count N] [--wet]", args[0]);
                std::process::exit(1);
            }
        }
    }

    let mut rng = rand::thread_rng();
    let mut walk = Walk {
        temperature: rng.gen_range(18.0..=24.0),
        humidity: rng.gen_range(55.0..=70.0),
        raining: wet,
    };

    let delay = Duration::from_secs_f64(interval_secs);
    let stdout = io::stdout();
    let mut sent = 0u64;

    while count.is_none_or(|limit| sent < limit) {
        let line = walk.step(&mut rng, wet);
        let mut out = stdout.lock();
        // A closed pipe means the daemon went away
        if writeln!(out, "{}", line).and_then(|_| out.flush()).is_err() {
            break;
        }
        drop(out);

        sent += 1;
        thread::sleep(delay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_accepts_plain_seconds() {
        assert_eq!(parse_interval("2"), Some(2.0));
        assert_eq!(parse_interval("0.5"), Some(0.5));
        assert_eq!(parse_interval("0"), Some(0.0));
    }

    #[test]
    fn test_interval_rejects_values_that_cannot_be_slept() {
        for bad in ["inf", "-inf", "NaN", "-1", "1e300", "86401", "soon"] {
            assert_eq!(parse_interval(bad), None, "{} should be rejected", bad);
        }
    }

    #[test]
    fn test_walk_emits_protocol_lines() {
        let mut rng = rand::thread_rng();
        let mut walk = Walk { temperature: 20.0, humidity: 60.0, raining: true };

        let line = walk.step(&mut rng, true);
        let parsed = landmon_service::ingest::line::parse_line(&line).expect("simulated line should parse");
        assert!(parsed.is_raining(500.0));
    }
}
