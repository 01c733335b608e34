//! BundleVault CLI - Command-line interface
//!
//! Lists, audits and downloads the bundles of a storefront account.

mod commands;
mod error;

use std::path::PathBuf;
use std::process;

use bundlevault::config::config_directory;
use bundlevault::logging::{init_logging, LogOptions};
use clap::{Parser, Subcommand};
use console::style;
use tracing::debug;

use commands::check::CheckArgs;
use commands::common::{GlobalArgs, RevealArg};
use commands::config::ConfigCommands;
use commands::download::DownloadArgs;
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "bundlevault")]
#[command(version, about = "Download and audit your purchased bundle catalog", long_about = None)]
struct Cli {
    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use this config file instead of ~/.bundlevault/config.ini
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Login e-mail, overriding the config file
    #[arg(long, global = true)]
    email: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List every purchased bundle
    List,

    /// Show bundles purchased more than once
    Duplicates,

    /// Check every bundle for missing, unreachable or truncated assets
    Check {
        /// Files at or below this size (KiB) are reported as truncated
        #[arg(long, value_name = "N")]
        min_size_kb: Option<u64>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Download all bundles, resuming partial files
    Download {
        /// Destination directory
        #[arg(long, value_name = "PATH")]
        dir: Option<PathBuf>,

        /// When to reveal bundle products before downloading
        #[arg(long, value_enum)]
        reveal: Option<RevealArg>,

        /// Only download files with these labels (flac, mp3, album, game, other)
        #[arg(long, value_name = "LABEL", value_delimiter = ',')]
        only: Vec<String>,

        /// Skip files with these labels
        #[arg(long, value_name = "LABEL", value_delimiter = ',')]
        exclude: Vec<String>,
    },

    /// Configuration file management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();

    let log_options = LogOptions {
        verbose: cli.verbose,
        log_dir: config_directory().ok().map(|dir| dir.join("logs")),
        ansi: console::colors_enabled_stderr(),
    };
    // Keep the guard alive until exit so the log file is flushed.
    let _guard = match init_logging(log_options) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("{} {}", style("warning:").yellow(), e);
            None
        }
    };

    if let Err(e) = run(cli) {
        eprintln!("{} {}", style("error:").red().bold(), e);
        if e.is_auth_failure() {
            eprintln!("Check the e-mail address and the {} variable.", commands::common::PASSWORD_ENV);
        }
        process::exit(e.exit_code());
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let globals = GlobalArgs {
        config: cli.config,
        email: cli.email,
    };
    debug!(command = ?cli.command, "Starting");

    match cli.command {
        Commands::List => commands::list::run(&globals),
        Commands::Duplicates => commands::duplicates::run(&globals),
        Commands::Check { min_size_kb, json } => {
            commands::check::run(&globals, CheckArgs { min_size_kb, json })
        }
        Commands::Download {
            dir,
            reveal,
            only,
            exclude,
        } => commands::download::run(
            &globals,
            DownloadArgs {
                dir,
                reveal: reveal.map(Into::into),
                only,
                exclude,
            },
        ),
        Commands::Config { command } => commands::config::run(&globals, command),
    }
}
