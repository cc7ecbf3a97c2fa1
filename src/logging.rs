// src/logging.rs

//! Logging setup using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the filter:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `SITEPIPE_LOG` environment variable, any `EnvFilter` directive
//!    (e.g. "debug", "sitepipe::engine=trace")
//! 3. default to `info`
//!
//! Logs go to STDERR; stdout carries only dry-run output.

use anyhow::{Result, anyhow};
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::LogLevel;

pub const LOG_ENV: &str = "SITEPIPE_LOG";

/// Initialise the global subscriber. Call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let filter = match cli_level {
        Some(level) => EnvFilter::new(directive(level)),
        None => EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info")),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow!("failed to initialise logging: {err}"))
}

fn directive(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}
