//! CLI error type.

use bundlevault::config::ConfigError;
use bundlevault::VaultError;
use thiserror::Error;

/// Errors surfaced to the user by the CLI.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Config(String),

    #[error(transparent)]
    ConfigFile(#[from] ConfigError),

    #[error(transparent)]
    Vault(#[from] VaultError),

    #[error("prompt failed: {0}")]
    Prompt(String),

    #[error("failed to render output: {0}")]
    Output(String),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        1
    }

    /// Whether the error is a rejected login.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Vault(VaultError::AuthenticationFailed))
    }
}
