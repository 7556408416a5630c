//! Logging initialization for pandoc-probe.
//!
//! Logs always go to stderr so stdout stays clean for the probe result.

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pandoc_probe::config::Config;

/// Level filter to use: `--debug` wins over the configured level.
/// `RUST_LOG`, when set, overrides both.
fn log_level(config: &Config, debug_override: bool) -> String {
    if debug_override {
        "debug".to_string()
    } else {
        config.logging.level.clone()
    }
}

/// Initialize the global subscriber.
pub fn init_logging(config: &Config, debug_override: bool) -> Result<()> {
    let log_level = log_level(config, debug_override);
    let filter = tracing_subscriber::EnvFilter::new(std::env::var("RUST_LOG").unwrap_or(log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init()
        .context("Failed to initialize logging")
}
