//! The `sightline config` command.

use clap::{Args, Subcommand};
use sightline_core::Config;

/// Arguments for the `config` command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the active configuration as TOML
    Show,

    /// Print the config file location and whether it exists
    Path,

    /// Write a config file populated with the defaults
    Init {
        /// Replace an existing config file
        #[arg(long)]
        force: bool,
    },
}

/// Execute the config command.
pub async fn execute(args: ConfigArgs) -> anyhow::Result<()> {
    let path = Config::default_path();
    match args.command {
        ConfigCommand::Show => {
            let config = Config::load()?;
            print!("{}", config.to_toml()?);
            // The cache root in the file may be relative or tilde-prefixed;
            // show where it actually lands
            println!("\n# cache root resolves to {}", config.cache_root().display());
        }

        ConfigCommand::Path => {
            if path.exists() {
                println!("{}", path.display());
            } else {
                println!(
                    "{} (not created yet; run `sightline config init`)",
                    path.display()
                );
            }
        }

        ConfigCommand::Init { force } => {
            if path.exists() && !force {
                anyhow::bail!(
                    "{} already exists; pass --force to overwrite it",
                    path.display()
                );
            }
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, Config::default().to_toml()?)?;
            println!(
                "Wrote default [capture], [cache], and [logging] sections to {}",
                path.display()
            );
        }
    }

    Ok(())
}
