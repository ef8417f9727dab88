//! Logging system setup and configuration.
//!
//! This module handles the initialization of the tracing-based logging
//! system used throughout the server.

use anyhow::Result;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{Args, LoggingSettings};

/// Initialize the logging system.
///
/// Sets up structured logging using the tracing crate with configurable
/// output format and filtering levels. Precedence for the level filter:
/// the `RUST_LOG` environment variable, then the `--debug` flag, then the
/// level from the configuration file, then "info". The configuration
/// file's `json_format` flag selects JSON output for log aggregation
/// systems.
///
/// # Errors
/// The global subscriber can only be installed once per process; a second
/// call returns an error.
pub fn setup_logging(args: &Args, settings: Option<&LoggingSettings>) -> Result<()> {
    let level = if args.debug {
        "debug"
    } else {
        settings.map(|s| s.level.as_str()).unwrap_or("info")
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let json_format = settings.map(|s| s.json_format).unwrap_or(false);

    if json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(false))
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false))
            .try_init()?;
    }

    Ok(())
}
