//! Download request and outcome types.

use std::path::{Path, PathBuf};

/// One file to retrieve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadJob {
    /// Source URL.
    pub url: String,
    /// Folder the file is written into. It must already exist.
    pub destination: PathBuf,
    /// Explicit filename; when absent the server's hint is used.
    pub filename: Option<String>,
}

impl DownloadJob {
    pub fn new(url: impl Into<String>, destination: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            destination: destination.into(),
            filename: None,
        }
    }

    /// Set an explicit destination filename.
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }
}

/// A probed download whose local file name is settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedDownload {
    pub url: String,
    pub destination: PathBuf,
    pub filename: String,
    /// Size reported by the server, if any.
    pub remote_size: Option<u64>,
}

impl PreparedDownload {
    /// Local file the transfer appends to.
    pub fn path(&self) -> PathBuf {
        self.destination.join(&self.filename)
    }

    /// Write to a different file name in the same folder.
    pub fn renamed(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }
}

/// What a download call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// The local file was already complete; nothing was transferred.
    AlreadyComplete { path: PathBuf, bytes: u64 },
    /// Bytes were appended to the local file.
    Transferred {
        path: PathBuf,
        /// Local size before the transfer started.
        resumed_from: u64,
        /// Bytes appended by this call.
        written: u64,
        /// Remote size, when the server reported one.
        total: Option<u64>,
    },
}

impl DownloadOutcome {
    pub fn path(&self) -> &Path {
        match self {
            Self::AlreadyComplete { path, .. } | Self::Transferred { path, .. } => path,
        }
    }

    /// Bytes moved over the network by this call.
    pub fn bytes_transferred(&self) -> u64 {
        match self {
            Self::AlreadyComplete { .. } => 0,
            Self::Transferred { written, .. } => *written,
        }
    }
}

/// How to treat a local file when the server does not report a size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnknownSizePolicy {
    /// Request the remaining bytes from the local offset. A
    /// range-not-satisfiable reply means the file is complete.
    #[default]
    Resume,
    /// Treat any non-empty local file as complete.
    SkipExisting,
}

impl std::str::FromStr for UnknownSizePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "resume" => Ok(Self::Resume),
            "skip_existing" | "skip-existing" => Ok(Self::SkipExisting),
            other => Err(format!(
                "unknown size policy '{}', expected resume or skip_existing",
                other
            )),
        }
    }
}

impl std::fmt::Display for UnknownSizePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Resume => write!(f, "resume"),
            Self::SkipExisting => write!(f, "skip_existing"),
        }
    }
}
