//! Common types and utilities shared across CLI commands.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use bundlevault::auth::Credentials;
use bundlevault::config::{ConfigFile, VaultSettings};
use bundlevault::sync::{RevealPolicy, SharedProgress, Vault};
use clap::ValueEnum;
use dialoguer::{Input, Password};
use indicatif::{ProgressBar, ProgressStyle};

use crate::error::CliError;

/// Environment variable holding the account password.
pub const PASSWORD_ENV: &str = "BUNDLEVAULT_PASSWORD";

/// Options shared by every command.
#[derive(Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Explicit config file path.
    pub config: Option<PathBuf>,
    /// Login identifier overriding the config file.
    pub email: Option<String>,
}

impl GlobalArgs {
    /// Load the config file from the explicit path or the default location.
    pub fn load_config(&self) -> Result<ConfigFile, CliError> {
        let config = match &self.config {
            Some(path) => ConfigFile::load_from(path)?,
            None => ConfigFile::load()?,
        };
        Ok(config)
    }
}

/// Reveal policy selection for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum RevealArg {
    /// Reveal every bundle before downloading
    Always,
    /// Skip revealing bundles bought more than once
    SkipDuplicates,
    /// Never reveal
    Never,
}

impl From<RevealArg> for RevealPolicy {
    fn from(arg: RevealArg) -> Self {
        match arg {
            RevealArg::Always => RevealPolicy::Always,
            RevealArg::SkipDuplicates => RevealPolicy::SkipDuplicates,
            RevealArg::Never => RevealPolicy::Never,
        }
    }
}

/// Resolve login credentials.
///
/// The identifier comes from `--email`, then the config file, then a
/// prompt. The password comes from the environment or a hidden prompt.
pub fn resolve_credentials(
    email: Option<&str>,
    config: &ConfigFile,
) -> Result<Credentials, CliError> {
    let identifier = match email.or(config.account.identifier.as_deref()) {
        Some(identifier) => identifier.to_string(),
        None => Input::<String>::new()
            .with_prompt("Email")
            .interact_text()
            .map_err(|e| CliError::Prompt(e.to_string()))?,
    };

    let secret = match std::env::var(PASSWORD_ENV) {
        Ok(secret) if !secret.is_empty() => secret,
        _ => Password::new()
            .with_prompt(format!("Password for {}", identifier))
            .interact()
            .map_err(|e| CliError::Prompt(e.to_string()))?,
    };

    Ok(Credentials::new(identifier, secret))
}

/// Log in and return a ready vault.
pub fn connect(
    globals: &GlobalArgs,
    config: &ConfigFile,
    settings: VaultSettings,
) -> Result<Vault, CliError> {
    let credentials = resolve_credentials(globals.email.as_deref(), config)?;

    let spinner = spinner("Logging in...");
    let result = Vault::connect(settings, &credentials);
    spinner.finish_and_clear();
    Ok(result?)
}

/// Fetch the catalog behind a spinner.
pub fn fetch_catalog(vault: &Vault) -> Result<bundlevault::catalog::Catalog, CliError> {
    let spinner = spinner("Fetching catalog...");
    let result = vault.fetch_catalog();
    spinner.finish_and_clear();
    Ok(result?)
}

/// Create a ticking spinner with a message.
pub fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Byte progress bar and the sink that drives it.
pub fn download_progress() -> (ProgressBar, SharedProgress) {
    let bar = ProgressBar::new(0);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("[{bar:40.cyan/blue}] {bytes}/{total_bytes} {bytes_per_sec} {msg}")
    {
        bar.set_style(style.progress_chars("#>-"));
    }

    let sink = bar.clone();
    let progress: SharedProgress = Arc::new(move |done, total| {
        match total {
            Some(total) => sink.set_length(total),
            None => sink.set_length(done),
        }
        sink.set_position(done);
    });
    (bar, progress)
}

/// Display a path relative to the working directory when possible.
pub fn display_path(path: &Path) -> String {
    std::env::current_dir()
        .ok()
        .and_then(|cwd| path.strip_prefix(cwd).ok().map(Path::to_path_buf))
        .unwrap_or_else(|| path.to_path_buf())
        .display()
        .to_string()
}
