//! Catalog data types.

use std::fmt;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// Storefront id of one purchased bundle.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct BundleId(pub u64);

impl fmt::Display for BundleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Storefront id of a user account.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct AccountId(pub u64);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What an asset reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    /// A downloadable URL.
    Url,
    /// A license key value.
    LicenseKey,
}

/// One downloadable artifact or license key of a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct AssetReference {
    pub kind: AssetKind,
    pub value: String,
    /// Platform or category label (e.g. `flac`, `game`, `key`).
    pub label: Option<String>,
}

impl AssetReference {
    pub fn url(value: impl Into<String>, label: Option<&str>) -> Self {
        Self {
            kind: AssetKind::Url,
            value: value.into(),
            label: label.map(str::to_string),
        }
    }

    pub fn license_key(value: impl Into<String>, label: Option<&str>) -> Self {
        Self {
            kind: AssetKind::LicenseKey,
            value: value.into(),
            label: label.map(str::to_string),
        }
    }

    pub fn is_url(&self) -> bool {
        self.kind == AssetKind::Url
    }

    pub fn is_license_key(&self) -> bool {
        self.kind == AssetKind::LicenseKey
    }
}

/// Stored outcome of asset resolution.
#[derive(Debug, Clone)]
enum Resolution {
    Assets(Vec<AssetReference>),
    Empty,
}

/// Observable asset resolution state of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetState<'a> {
    /// Resolution has not been attempted, or failed at the transport level.
    Unresolved,
    /// Resolution found at least one asset or key.
    Resolved(&'a [AssetReference]),
    /// Resolution completed and found nothing.
    Empty,
}

/// One purchased bundle.
///
/// Everything except the asset set is fixed at decode time. The asset
/// set is written at most once.
#[derive(Debug, Clone)]
pub struct ProductEntry {
    id: BundleId,
    name: String,
    owner: AccountId,
    assets: OnceLock<Resolution>,
}

impl ProductEntry {
    pub fn new(id: BundleId, name: impl Into<String>, owner: AccountId) -> Self {
        Self {
            id,
            name: name.into(),
            owner,
            assets: OnceLock::new(),
        }
    }

    pub fn id(&self) -> BundleId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Account that can access the bundle (the gift recipient for gifts).
    pub fn owner(&self) -> AccountId {
        self.owner
    }

    pub fn asset_state(&self) -> AssetState<'_> {
        match self.assets.get() {
            None => AssetState::Unresolved,
            Some(Resolution::Assets(assets)) => AssetState::Resolved(assets),
            Some(Resolution::Empty) => AssetState::Empty,
        }
    }

    /// Store the resolved asset set.
    ///
    /// The first call wins; later calls return the already stored state.
    pub(crate) fn record_assets(&self, assets: Vec<AssetReference>) -> AssetState<'_> {
        let _ = self.assets.get_or_init(|| {
            if assets.is_empty() {
                Resolution::Empty
            } else {
                Resolution::Assets(assets)
            }
        });
        self.asset_state()
    }

    /// Resolved downloadable URLs; empty unless resolved.
    pub fn asset_urls(&self) -> impl Iterator<Item = &AssetReference> {
        self.resolved().iter().filter(|a| a.is_url())
    }

    /// Resolved license keys; empty unless resolved.
    pub fn license_keys(&self) -> impl Iterator<Item = &AssetReference> {
        self.resolved().iter().filter(|a| a.is_license_key())
    }

    fn resolved(&self) -> &[AssetReference] {
        match self.asset_state() {
            AssetState::Resolved(assets) => assets,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> ProductEntry {
        ProductEntry::new(BundleId(1), "Bundle A", AccountId(9))
    }

    #[test]
    fn test_new_entry_is_unresolved() {
        let entry = entry();
        assert_eq!(entry.asset_state(), AssetState::Unresolved);
        assert_eq!(entry.asset_urls().count(), 0);
    }

    #[test]
    fn test_record_assets_once() {
        let entry = entry();
        let first = vec![AssetReference::url("https://cdn/1", Some("flac"))];

        assert!(matches!(entry.record_assets(first), AssetState::Resolved(a) if a.len() == 1));

        // A second write is ignored
        let state = entry.record_assets(Vec::new());
        assert!(matches!(state, AssetState::Resolved(a) if a[0].value == "https://cdn/1"));
    }

    #[test]
    fn test_record_empty_assets() {
        let entry = entry();
        assert_eq!(entry.record_assets(Vec::new()), AssetState::Empty);
        assert_eq!(entry.asset_state(), AssetState::Empty);
    }

    #[test]
    fn test_urls_and_keys_are_split() {
        let entry = entry();
        entry.record_assets(vec![
            AssetReference::url("https://cdn/1", Some("mp3")),
            AssetReference::license_key("AAAA-BBBB", Some("key")),
            AssetReference::url("https://cdn/2", None),
        ]);
        assert_eq!(entry.asset_urls().count(), 2);
        assert_eq!(entry.license_keys().count(), 1);
    }
}
