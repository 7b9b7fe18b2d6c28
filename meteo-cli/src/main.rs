//! Binary crate for the `meteo` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive configuration
//! - Human-friendly and JSON output formatting

use clap::Parser;
use meteo_core::{ErrorKind, WeatherError};
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod configure;
mod output;

fn log_filter_from_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn init_logging(verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_filter_from_verbosity(verbose)));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Exit status per error class: 2 bad arguments, 3 not found, 4 upstream failure.
fn exit_status(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<WeatherError>().map(WeatherError::kind) {
        Some(ErrorKind::ClientError) => 2,
        Some(ErrorKind::NotFound) => 3,
        Some(ErrorKind::ServerError) => 4,
        None => 1,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cmd = cli::Cli::parse();
    init_logging(cmd.verbose);

    match cmd.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(exit_status(&err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_raises_log_level() {
        assert_eq!(log_filter_from_verbosity(0), "warn");
        assert_eq!(log_filter_from_verbosity(1), "info");
        assert_eq!(log_filter_from_verbosity(2), "debug");
        assert_eq!(log_filter_from_verbosity(9), "trace");
    }

    #[test]
    fn exit_status_follows_error_kind() {
        let invalid = anyhow::Error::from(WeatherError::invalid("n", "n must be at least 1"));
        assert_eq!(exit_status(&invalid), 2);

        let missing = anyhow::Error::from(WeatherError::NoData { city: "Atlantis".into() })
            .context("forecast lookup");
        assert_eq!(exit_status(&missing), 3);

        let upstream = anyhow::Error::from(WeatherError::Fetch("timed out".into()));
        assert_eq!(exit_status(&upstream), 4);

        let other = anyhow::anyhow!("config broken");
        assert_eq!(exit_status(&other), 1);
    }
}
