//! The `sightline cache` command for cache inspection and maintenance.

use clap::{Args, Subcommand};
use sightline_core::{Config, ImageCacheStore};

/// Arguments for the `cache` command.
#[derive(Args, Debug)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: CacheCommand,
}

/// Subcommands for cache management.
#[derive(Subcommand, Debug)]
pub enum CacheCommand {
    /// Show cached file paths for a record
    Paths {
        /// The record identifier
        record_id: u64,
    },

    /// Show total cache size against the configured budget
    Stats,

    /// Delete all cached files
    Clear,
}

/// Execute the cache command.
pub async fn execute(args: CacheArgs, config: &Config) -> anyhow::Result<()> {
    let store = ImageCacheStore::new(config.cache_root(), config.cache.clone());

    match args.command {
        CacheCommand::Paths { record_id } => {
            let paths = store.get_paths(record_id).await;
            if paths.is_empty() {
                println!("Nothing cached for record {record_id}");
            } else {
                println!("{}", serde_json::to_string_pretty(&paths)?);
            }
        }

        CacheCommand::Stats => {
            let total = store.total_size().await;
            let max = config.cache.max_total_bytes;
            println!(
                "{} / {} bytes used ({:.1}%)",
                total,
                max,
                (total as f64 / max as f64) * 100.0
            );
        }

        CacheCommand::Clear => {
            store.clear().await;
            println!("Cache cleared");
        }
    }

    Ok(())
}
