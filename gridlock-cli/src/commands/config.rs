use anyhow::Result;
use clap::{Args, Subcommand};

use crate::config::{ConfigLoader, GridlockConfig};

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration (merged)
    Show,
    /// Show configuration file paths
    Path,
}

pub fn run(args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Show => show_config(),
        ConfigCommands::Path => show_paths(),
    }
}

fn show_config() -> Result<()> {
    let config = ConfigLoader::load()?;
    println!("{}", render(&config)?);
    Ok(())
}

fn render(config: &GridlockConfig) -> Result<String> {
    let shown = GridlockConfig {
        storage: config.storage.redacted(),
        ..config.clone()
    };
    Ok(toml::to_string_pretty(&shown)?)
}

fn show_paths() -> Result<()> {
    println!("User config:    {:?}", ConfigLoader::user_config_path());
    println!("Project config: {:?}", ConfigLoader::project_config_path());
    println!(
        "Default database: {:?}",
        ConfigLoader::default_database_path()
    );
    Ok(())
}
