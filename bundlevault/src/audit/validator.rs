//! Completeness checks for catalog entries.

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::catalog::{AssetReference, ProductEntry};
use crate::error::{VaultError, VaultResult};
use crate::links::LinkResolver;
use crate::session::RequestHeaders;

/// Default size at or below which an asset is considered truncated.
///
/// Files this small come from broken publisher records, not genuinely
/// tiny releases.
pub const DEFAULT_MIN_PLAUSIBLE_BYTES: u64 = 180 * 1024;

/// One reason an entry is considered defective.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Defect {
    #[error("neither a license key nor a download link")]
    NeitherKeyNorLink,

    #[error("link not reachable: {url}")]
    LinkNotReachable { url: String },

    #[error("file too small ({size} bytes): {url}")]
    TooSmallFile { url: String, size: u64 },
}

/// Validation outcome for one entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reasons", rename_all = "snake_case")]
pub enum Verdict {
    Ok,
    /// Never empty; reasons are in detection order.
    Defective(Vec<Defect>),
}

impl Verdict {
    fn from_defects(defects: Vec<Defect>) -> Self {
        if defects.is_empty() {
            Self::Ok
        } else {
            Self::Defective(defects)
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }

    pub fn reasons(&self) -> &[Defect] {
        match self {
            Self::Ok => &[],
            Self::Defective(defects) => defects,
        }
    }

    /// Convert into a result, keeping a lone reason as a single error and
    /// several reasons as one aggregate error.
    pub fn into_result(self) -> VaultResult<()> {
        match self {
            Self::Ok => Ok(()),
            Self::Defective(mut defects) if defects.len() == 1 => {
                Err(VaultError::Defect(defects.remove(0)))
            }
            Self::Defective(defects) => Err(VaultError::MultipleDefects(defects)),
        }
    }
}

/// Checks that entries have assets and that their files look intact.
#[derive(Debug, Clone, Copy)]
pub struct IntegrityValidator {
    min_plausible_bytes: u64,
}

impl Default for IntegrityValidator {
    fn default() -> Self {
        Self {
            min_plausible_bytes: DEFAULT_MIN_PLAUSIBLE_BYTES,
        }
    }
}

impl IntegrityValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the size threshold in bytes.
    pub fn with_min_plausible_bytes(mut self, bytes: u64) -> Self {
        self.min_plausible_bytes = bytes;
        self
    }

    pub fn min_plausible_bytes(&self) -> u64 {
        self.min_plausible_bytes
    }

    /// Validate one entry.
    ///
    /// Resolves the entry's assets if needed, then probes every URL. An
    /// entry with no key and no link is defective without further checks.
    /// Only a failure to fetch the detail page is returned as an error;
    /// probe failures become [`Defect::LinkNotReachable`].
    pub fn validate(&self, entry: &ProductEntry, resolver: &LinkResolver<'_>) -> VaultResult<Verdict> {
        let assets: &[AssetReference] = match resolver.resolve(entry) {
            Ok(assets) => assets,
            Err(VaultError::NoAssetLinks { .. }) => &[],
            Err(e) => return Err(e),
        };

        if assets.is_empty() {
            return Ok(Verdict::Defective(vec![Defect::NeitherKeyNorLink]));
        }

        let headers = RequestHeaders::accept_any();
        let mut defects = Vec::new();
        for asset in assets.iter().filter(|a| a.is_url()) {
            let url = asset.value.as_str();
            match resolver.session().probe_metadata(url, &headers) {
                Err(e) => {
                    debug!(url, error = %e, "Asset probe failed");
                    defects.push(Defect::LinkNotReachable {
                        url: url.to_string(),
                    });
                }
                Ok(meta) => {
                    if let Some(size) = meta.size.filter(|&s| s <= self.min_plausible_bytes) {
                        defects.push(Defect::TooSmallFile {
                            url: url.to_string(),
                            size,
                        });
                    }
                }
            }
        }

        debug!(
            bundle_id = %entry.id(),
            defects = defects.len(),
            "Validated entry"
        );
        Ok(Verdict::from_defects(defects))
    }
}
