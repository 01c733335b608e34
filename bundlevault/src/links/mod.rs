//! Per-bundle asset resolution.
//!
//! The resolver fetches a bundle's detail page once, hands the body to a
//! [`LinkDiscovery`] implementation, and stores the outcome on the entry.
//! Later calls answer from the entry without touching the network.

mod discovery;

use tracing::{debug, info, warn};

pub use discovery::{LinkDiscovery, StorefrontPatterns, DEFAULT_KEY_PATTERN, DEFAULT_STORAGE_HOST};

use crate::auth::AuthenticatedSession;
use crate::catalog::{AssetReference, AssetState, ProductEntry};
use crate::error::{VaultError, VaultResult};
use crate::session::{FormParams, RequestHeaders, Session};

/// Resolves and caches the asset set of catalog entries.
pub struct LinkResolver<'a> {
    auth: &'a AuthenticatedSession,
    discovery: &'a dyn LinkDiscovery,
}

impl<'a> LinkResolver<'a> {
    pub fn new(auth: &'a AuthenticatedSession, discovery: &'a dyn LinkDiscovery) -> Self {
        Self { auth, discovery }
    }

    /// The session used for detail and reveal requests.
    pub fn session(&self) -> &'a Session {
        self.auth.session()
    }

    /// Return the entry's assets, fetching the detail page on first use.
    ///
    /// An entry whose page held nothing fails with
    /// [`VaultError::NoAssetLinks`] on this and every later call. A
    /// transport failure leaves the entry unresolved.
    pub fn resolve<'e>(&self, entry: &'e ProductEntry) -> VaultResult<&'e [AssetReference]> {
        let state = match entry.asset_state() {
            AssetState::Unresolved => {
                let assets = self.fetch_assets(entry)?;
                entry.record_assets(assets)
            }
            known => known,
        };

        match state {
            AssetState::Resolved(assets) => Ok(assets),
            _ => Err(VaultError::NoAssetLinks {
                bundle_id: entry.id(),
            }),
        }
    }

    fn fetch_assets(&self, entry: &ProductEntry) -> VaultResult<Vec<AssetReference>> {
        let url = self.auth.endpoints().detail_url(entry.id(), entry.owner());
        debug!(bundle_id = %entry.id(), url, "Fetching bundle detail page");

        let page = self
            .auth
            .session()
            .request(&url, None, &RequestHeaders::accept_any())?;
        let assets = self.discovery.discover(&page);

        info!(
            bundle_id = %entry.id(),
            name = entry.name(),
            assets = assets.len(),
            "Resolved bundle assets"
        );
        Ok(assets)
    }

    /// Ask the storefront to reveal all products of a bundle.
    ///
    /// Best effort: failures are logged and reported as `false`, never
    /// propagated.
    pub fn reveal(&self, entry: &ProductEntry) -> bool {
        let url = self.auth.endpoints().reveal_url(entry.id());
        let form = FormParams::new().field("v", "0");

        match self
            .auth
            .session()
            .request(&url, Some(&form), &RequestHeaders::accept_any())
        {
            Ok(_) => {
                debug!(bundle_id = %entry.id(), "Revealed bundle");
                true
            }
            Err(e) => {
                warn!(bundle_id = %entry.id(), error = %e, "Reveal request failed");
                false
            }
        }
    }
}
