//! Sightline CLI - development harness for the capture-and-cache pipeline.
//!
//! Drives the pipeline against a file-backed camera device so capture,
//! processing, and cache behavior can be exercised off-device.
//!
//! # Usage
//!
//! ```bash
//! # Run a capture from an image file
//! sightline capture --input shot.jpg
//!
//! # Capture and persist into the cache under record 42
//! sightline capture --input shot.jpg --record-id 42
//!
//! # Inspect the cache
//! sightline cache paths 42
//! sightline cache stats
//!
//! # View configuration
//! sightline config show
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// Sightline - capture-and-cache pipeline harness.
#[derive(Parser, Debug)]
#[command(name = "sightline")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a capture through the pipeline from an image file
    Capture(cli::capture::CaptureArgs),

    /// Inspect and manage the local image cache
    Cache(cli::cache::CacheArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging from config, with CLI verbose override.
    // Note: logging isn't initialized yet, so use eprintln for config warnings.
    let config = match sightline_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `sightline config path`."
            );
            sightline_core::Config::default()
        }
    };
    logging::init(&config.logging, cli.verbose, cli.json_logs);

    tracing::debug!("Sightline v{}", sightline_core::VERSION);

    // Dispatch to the appropriate command handler
    match cli.command {
        Commands::Capture(args) => cli::capture::execute(args, &config).await,
        Commands::Cache(args) => cli::cache::execute(args, &config).await,
        Commands::Config(args) => cli::config::execute(args).await,
    }
}
