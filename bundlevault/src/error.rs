//! Error types for catalog retrieval and download.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::audit::Defect;
use crate::catalog::BundleId;

/// Result type for library operations.
pub type VaultResult<T> = Result<T, VaultError>;

/// Errors that can occur while talking to the storefront or writing files.
#[derive(Debug, Error)]
pub enum VaultError {
    /// Credentials were rejected or the login reply carried no account id.
    #[error("authentication failed: credentials rejected or account id not found")]
    AuthenticationFailed,

    /// Network-layer failure (DNS, refused connection, broken stream).
    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    /// The server answered with a non-success status.
    #[error("request to {url} returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    /// The server ignored a byte-range request and sent the whole body.
    #[error("server ignored range request for {url} at offset {offset}")]
    RangeNotHonoured { url: String, offset: u64 },

    /// Local filesystem failure.
    #[error("storage error at {}: {source}", path.display())]
    Storage { path: PathBuf, source: io::Error },

    /// No explicit filename was given and the server offered none.
    #[error("no filename available for {url}")]
    NoFilenameAvailable { url: String },

    /// The detail page of a bundle contained no asset links or keys.
    #[error("no asset links found for bundle {bundle_id}")]
    NoAssetLinks { bundle_id: BundleId },

    /// A listing page or catalog record could not be decoded.
    #[error("failed to decode response from {url}: {reason}")]
    Decode { url: String, reason: String },

    /// A single validation defect.
    #[error(transparent)]
    Defect(Defect),

    /// Several validation defects for one entry, in detection order.
    #[error("{}", format_defects(.0))]
    MultipleDefects(Vec<Defect>),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl VaultError {
    /// Create a storage error for the given path.
    pub fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }

    /// Whether this error originated in the network layer.
    ///
    /// Non-success statuses and refused range requests count as transport
    /// failures for every retry or reachability decision.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::HttpStatus { .. } | Self::RangeNotHonoured { .. }
        )
    }

    /// The URL the failure relates to, if any.
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Transport { url, .. }
            | Self::HttpStatus { url, .. }
            | Self::RangeNotHonoured { url, .. }
            | Self::NoFilenameAvailable { url }
            | Self::Decode { url, .. } => Some(url),
            _ => None,
        }
    }
}

fn format_defects(defects: &[Defect]) -> String {
    defects
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_classification() {
        let err = VaultError::HttpStatus {
            url: "https://example.com/a".to_string(),
            status: 404,
        };
        assert!(err.is_transport());
        assert_eq!(err.url(), Some("https://example.com/a"));

        assert!(!VaultError::AuthenticationFailed.is_transport());
        assert!(!VaultError::NoAssetLinks {
            bundle_id: BundleId(3)
        }
        .is_transport());
    }

    #[test]
    fn test_multiple_defects_lists_every_reason() {
        let err = VaultError::MultipleDefects(vec![
            Defect::LinkNotReachable {
                url: "https://a".to_string(),
            },
            Defect::TooSmallFile {
                url: "https://b".to_string(),
                size: 100,
            },
        ]);
        let text = err.to_string();
        assert!(text.contains("https://a"));
        assert!(text.contains("https://b"));
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn test_storage_display_includes_path() {
        let err = VaultError::storage(
            "/tmp/nowhere/file.zip",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().contains("/tmp/nowhere/file.zip"));
        assert!(err.to_string().contains("denied"));
    }
}
