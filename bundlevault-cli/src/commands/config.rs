//! Configuration management CLI commands.

use bundlevault::config::{config_file_path, ConfigFile};
use clap::Subcommand;

use super::common::GlobalArgs;
use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show the configuration file path
    Path,

    /// Print the effective configuration
    Show,

    /// Write a configuration file with default values
    Init,
}

/// Run a config subcommand.
pub fn run(globals: &GlobalArgs, command: ConfigCommands) -> Result<(), CliError> {
    let path = match &globals.config {
        Some(path) => path.clone(),
        None => config_file_path()?,
    };

    match command {
        ConfigCommands::Path => {
            println!("{}", path.display());
        }
        ConfigCommands::Show => {
            print!("{}", globals.load_config()?.to_ini_string()?);
        }
        ConfigCommands::Init => {
            if path.exists() {
                return Err(CliError::Config(format!(
                    "{} already exists",
                    path.display()
                )));
            }
            ConfigFile::default().save_to(&path)?;
            println!("Wrote {}", path.display());
        }
    }
    Ok(())
}
