//! Paginated catalog retrieval.

use tracing::{debug, info};

use super::decode::decode_page;
use super::Catalog;
use crate::auth::AuthenticatedSession;
use crate::error::VaultResult;
use crate::session::RequestHeaders;

/// Fetch the complete purchase catalog of the authenticated account.
///
/// Pages are requested in order starting at 0 until one decodes to an
/// empty list. A failing page aborts the fetch; the catalog is never
/// silently truncated.
pub fn fetch_catalog(auth: &AuthenticatedSession) -> VaultResult<Catalog> {
    let account = auth.account_id();
    let mut catalog = Catalog::new();
    let mut page = 0u32;

    loop {
        let url = auth.endpoints().listing_url(account, page);
        let body = auth
            .session()
            .request(&url, None, &RequestHeaders::new())?;
        let entries = decode_page(&url, &body, account)?;

        if entries.is_empty() {
            debug!(page, "Empty listing page, catalog complete");
            break;
        }

        info!(page, entries = entries.len(), "Fetched catalog page");
        for entry in entries {
            let id = entry.id();
            if catalog.insert(entry).is_some() {
                debug!(bundle_id = %id, page, "Bundle listed twice, keeping latest record");
            }
        }
        page += 1;
    }

    info!(bundles = catalog.len(), pages = page, "Catalog fetched");
    Ok(catalog)
}
