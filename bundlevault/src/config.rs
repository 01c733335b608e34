//! Configuration file handling.
//!
//! Settings live in `~/.bundlevault/config.ini`:
//!
//! ```ini
//! [account]
//! identifier = me@example.com
//!
//! [storefront]
//! base_url = https://groupees.com
//! storage_host = storage.groupees.com
//! user_agent = Mozilla/5.0 ...
//! key_pattern = data-key="([^"]+)"
//!
//! [download]
//! directory = ./downloads
//! min_plausible_kb = 180
//! reveal = skip_duplicates
//! unknown_size = resume
//! timeout_secs = 300
//! connect_timeout_secs = 30
//! only = flac, game
//! exclude = mp3
//! ```
//!
//! A missing file yields the defaults. Every key is optional.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::Ini;
use thiserror::Error;

use crate::audit::DEFAULT_MIN_PLAUSIBLE_BYTES;
use crate::download::{LabelFilter, UnknownSizePolicy};
use crate::links::DEFAULT_STORAGE_HOST;
use crate::session::{DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT};
use crate::storefront::DEFAULT_BASE_URL;
use crate::sync::RevealPolicy;

/// Name of the per-user configuration directory under the home directory.
const CONFIG_DIR_NAME: &str = ".bundlevault";

/// Name of the configuration file.
const CONFIG_FILE_NAME: &str = "config.ini";

/// Default download directory, relative to the working directory.
const DEFAULT_DOWNLOAD_DIR: &str = "./downloads";

/// Errors from reading or writing the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine home directory")]
    NoHomeDirectory,

    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write config {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("failed to render config: {0}")]
    Render(#[source] std::io::Error),

    #[error("invalid value '{value}' for {section}.{key}: {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

/// Directory holding the configuration file (`~/.bundlevault`).
pub fn config_directory() -> Result<PathBuf, ConfigError> {
    dirs::home_dir()
        .map(|home| home.join(CONFIG_DIR_NAME))
        .ok_or(ConfigError::NoHomeDirectory)
}

/// Full path of the configuration file.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_directory()?.join(CONFIG_FILE_NAME))
}

/// `[account]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountSection {
    /// Login identifier (e-mail address).
    pub identifier: Option<String>,
}

/// `[storefront]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorefrontSection {
    pub base_url: String,
    pub storage_host: String,
    pub user_agent: String,
    /// Override for the license key pattern.
    pub key_pattern: Option<String>,
}

impl Default for StorefrontSection {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            storage_host: DEFAULT_STORAGE_HOST.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            key_pattern: None,
        }
    }
}

/// `[download]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadSection {
    pub directory: PathBuf,
    pub min_plausible_kb: u64,
    pub reveal: RevealPolicy,
    pub unknown_size: UnknownSizePolicy,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// Labels to restrict downloads to; empty means all.
    pub only: Vec<String>,
    /// Labels never downloaded.
    pub exclude: Vec<String>,
}

impl Default for DownloadSection {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(DEFAULT_DOWNLOAD_DIR),
            min_plausible_kb: DEFAULT_MIN_PLAUSIBLE_BYTES / 1024,
            reveal: RevealPolicy::default(),
            unknown_size: UnknownSizePolicy::default(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            only: Vec::new(),
            exclude: Vec::new(),
        }
    }
}

/// Parsed configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub account: AccountSection,
    pub storefront: StorefrontSection,
    pub download: DownloadSection,
}

impl ConfigFile {
    /// Load from the default location, falling back to defaults when the
    /// file does not exist.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path()?)
    }

    /// Load from a specific path, falling back to defaults when the file
    /// does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Parse INI text.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        let mut config = Self::default();

        if let Some(section) = ini.section(Some("account")) {
            if let Some(v) = non_empty(section.get("identifier")) {
                config.account.identifier = Some(v.to_string());
            }
        }

        if let Some(section) = ini.section(Some("storefront")) {
            let storefront = &mut config.storefront;
            if let Some(v) = non_empty(section.get("base_url")) {
                storefront.base_url = v.to_string();
            }
            if let Some(v) = non_empty(section.get("storage_host")) {
                storefront.storage_host = v.to_string();
            }
            if let Some(v) = non_empty(section.get("user_agent")) {
                storefront.user_agent = v.to_string();
            }
            if let Some(v) = non_empty(section.get("key_pattern")) {
                storefront.key_pattern = Some(v.to_string());
            }
        }

        if let Some(section) = ini.section(Some("download")) {
            let download = &mut config.download;
            if let Some(v) = non_empty(section.get("directory")) {
                download.directory = PathBuf::from(v);
            }
            if let Some(v) = non_empty(section.get("min_plausible_kb")) {
                download.min_plausible_kb = parse_value("download", "min_plausible_kb", v)?;
            }
            if let Some(v) = non_empty(section.get("reveal")) {
                download.reveal = parse_value("download", "reveal", v)?;
            }
            if let Some(v) = non_empty(section.get("unknown_size")) {
                download.unknown_size = parse_value("download", "unknown_size", v)?;
            }
            if let Some(v) = non_empty(section.get("timeout_secs")) {
                download.timeout_secs = parse_value("download", "timeout_secs", v)?;
            }
            if let Some(v) = non_empty(section.get("connect_timeout_secs")) {
                download.connect_timeout_secs =
                    parse_value("download", "connect_timeout_secs", v)?;
            }
            if let Some(v) = non_empty(section.get("only")) {
                download.only = LabelFilter::parse_list(v);
            }
            if let Some(v) = non_empty(section.get("exclude")) {
                download.exclude = LabelFilter::parse_list(v);
            }
        }

        Ok(config)
    }

    /// Render as INI text.
    pub fn to_ini_string(&self) -> Result<String, ConfigError> {
        let mut ini = Ini::new();

        if let Some(identifier) = &self.account.identifier {
            ini.with_section(Some("account"))
                .set("identifier", identifier.as_str());
        }

        ini.with_section(Some("storefront"))
            .set("base_url", self.storefront.base_url.as_str())
            .set("storage_host", self.storefront.storage_host.as_str())
            .set("user_agent", self.storefront.user_agent.as_str());
        if let Some(pattern) = &self.storefront.key_pattern {
            ini.with_section(Some("storefront"))
                .set("key_pattern", pattern.as_str());
        }

        let download = &self.download;
        ini.with_section(Some("download"))
            .set("directory", download.directory.display().to_string())
            .set("min_plausible_kb", download.min_plausible_kb.to_string())
            .set("reveal", download.reveal.to_string())
            .set("unknown_size", download.unknown_size.to_string())
            .set("timeout_secs", download.timeout_secs.to_string())
            .set(
                "connect_timeout_secs",
                download.connect_timeout_secs.to_string(),
            );
        if !download.only.is_empty() {
            ini.with_section(Some("download"))
                .set("only", download.only.join(", "));
        }
        if !download.exclude.is_empty() {
            ini.with_section(Some("download"))
                .set("exclude", download.exclude.join(", "));
        }

        let mut buffer = Vec::new();
        ini.write_to(&mut buffer).map_err(ConfigError::Render)?;
        String::from_utf8(buffer).map_err(|e| {
            ConfigError::Render(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })
    }

    /// Write the configuration, creating the parent directory if needed.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let text = self.to_ini_string()?;
        fs::write(path, text).map_err(write_err)
    }

    /// Typed library settings derived from this file.
    pub fn settings(&self) -> VaultSettings {
        VaultSettings {
            base_url: self.storefront.base_url.clone(),
            storage_host: self.storefront.storage_host.clone(),
            user_agent: self.storefront.user_agent.clone(),
            key_pattern: self.storefront.key_pattern.clone(),
            download_dir: self.download.directory.clone(),
            min_plausible_bytes: self.download.min_plausible_kb * 1024,
            reveal: self.download.reveal,
            unknown_size: self.download.unknown_size,
            timeout: Duration::from_secs(self.download.timeout_secs),
            connect_timeout: Duration::from_secs(self.download.connect_timeout_secs),
            labels: LabelFilter::new()
                .with_only(&self.download.only)
                .with_exclude(&self.download.exclude),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_value<T>(section: &str, key: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: e.to_string(),
    })
}

/// Settings for one run of the library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultSettings {
    pub base_url: String,
    /// Host serving downloadable files.
    pub storage_host: String,
    pub user_agent: String,
    /// License key pattern override.
    pub key_pattern: Option<String>,
    pub download_dir: PathBuf,
    /// Assets at or below this size are reported as truncated.
    pub min_plausible_bytes: u64,
    pub reveal: RevealPolicy,
    pub unknown_size: UnknownSizePolicy,
    /// Whole-request timeout.
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// Which asset labels a download run fetches.
    pub labels: LabelFilter,
}

impl Default for VaultSettings {
    fn default() -> Self {
        ConfigFile::default().settings()
    }
}

impl VaultSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_storage_host(mut self, host: impl Into<String>) -> Self {
        self.storage_host = host.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_key_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.key_pattern = Some(pattern.into());
        self
    }

    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = dir.into();
        self
    }

    pub fn with_min_plausible_bytes(mut self, bytes: u64) -> Self {
        self.min_plausible_bytes = bytes;
        self
    }

    pub fn with_reveal(mut self, policy: RevealPolicy) -> Self {
        self.reveal = policy;
        self
    }

    pub fn with_unknown_size(mut self, policy: UnknownSizePolicy) -> Self {
        self.unknown_size = policy;
        self
    }

    pub fn with_timeouts(mut self, timeout: Duration, connect_timeout: Duration) -> Self {
        self.timeout = timeout;
        self.connect_timeout = connect_timeout;
        self
    }

    pub fn with_labels(mut self, labels: LabelFilter) -> Self {
        self.labels = labels;
        self
    }
}
