//! Tracing setup driven by the `[logging]` config section.

use sightline_core::config::LoggingConfig;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber.
///
/// Precedence for the level is `RUST_LOG`, then `--verbose`, then the
/// configured level string (which may carry full filter directives, e.g.
/// `info,sightline_core::cache=debug`). Output goes to stderr so stdout
/// stays clean for command results.
pub fn init(config: &LoggingConfig, verbose: bool, json_logs: bool) {
    let directives = if verbose {
        "debug"
    } else {
        config.level.as_str()
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives));

    let registry = tracing_subscriber::registry().with(filter);
    if json_logs || config.format == "json" {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}
