//! Storefront endpoint templates.

use crate::catalog::{AccountId, BundleId};

/// Default storefront base URL.
pub const DEFAULT_BASE_URL: &str = "https://groupees.com";

/// URL templates for the storefront endpoints.
///
/// Templates use `{user_id}`, `{page}` and `{bundle_id}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Credential submission (form fields `identifier`, `password`).
    pub login: String,
    /// Paginated purchase listing.
    pub listing: String,
    /// Bundle detail page scanned for asset links.
    pub detail: String,
    /// Reveal-all-products action.
    pub reveal: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::for_base(DEFAULT_BASE_URL)
    }
}

impl Endpoints {
    /// Derive all endpoints from a base URL.
    pub fn for_base(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            login: format!("{}/auth/email_password", base),
            listing: format!("{}/users/{{user_id}}/more_entries?page={{page}}&kind=bundles", base),
            detail: format!("{}/orders/{{bundle_id}}?user_id={{user_id}}", base),
            reveal: format!("{}/orders/{{bundle_id}}/reveal_all_products", base),
        }
    }

    pub fn login_url(&self) -> &str {
        &self.login
    }

    pub fn listing_url(&self, account: AccountId, page: u32) -> String {
        self.listing
            .replace("{user_id}", &account.to_string())
            .replace("{page}", &page.to_string())
    }

    pub fn detail_url(&self, bundle: BundleId, account: AccountId) -> String {
        self.detail
            .replace("{bundle_id}", &bundle.to_string())
            .replace("{user_id}", &account.to_string())
    }

    pub fn reveal_url(&self, bundle: BundleId) -> String {
        self.reveal.replace("{bundle_id}", &bundle.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_endpoints() {
        let endpoints = Endpoints::default();
        assert_eq!(endpoints.login_url(), "https://groupees.com/auth/email_password");
        assert_eq!(
            endpoints.listing_url(AccountId(12), 3),
            "https://groupees.com/users/12/more_entries?page=3&kind=bundles"
        );
        assert_eq!(
            endpoints.detail_url(BundleId(99), AccountId(12)),
            "https://groupees.com/orders/99?user_id=12"
        );
        assert_eq!(
            endpoints.reveal_url(BundleId(99)),
            "https://groupees.com/orders/99/reveal_all_products"
        );
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let endpoints = Endpoints::for_base("http://localhost:8080/");
        assert_eq!(endpoints.login_url(), "http://localhost:8080/auth/email_password");
    }
}
