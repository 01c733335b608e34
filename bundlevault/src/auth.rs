//! Login flow producing an authenticated session.
//!
//! Authentication is all-or-nothing: either the login reply names the
//! account id and an [`AuthenticatedSession`] is returned, or the whole
//! flow fails with [`VaultError::AuthenticationFailed`].

use std::sync::OnceLock;

use regex::Regex;
use tracing::{info, warn};

use crate::catalog::AccountId;
use crate::error::{VaultError, VaultResult};
use crate::session::{FormParams, RequestHeaders, Session};
use crate::storefront::Endpoints;

/// Login identifier and secret.
#[derive(Clone)]
pub struct Credentials {
    identifier: String,
    secret: String,
}

impl Credentials {
    pub fn new(identifier: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            secret: secret.into(),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    fn form(&self) -> FormParams {
        FormParams::new()
            .field("identifier", &self.identifier)
            .field("password", &self.secret)
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("identifier", &self.identifier)
            .field("secret", &"***")
            .finish()
    }
}

/// A session bound to one account.
///
/// The account id is fixed for the lifetime of the value; the cookie
/// store inside the session keeps accumulating state.
#[derive(Debug)]
pub struct AuthenticatedSession {
    session: Session,
    account_id: AccountId,
    endpoints: Endpoints,
}

impl AuthenticatedSession {
    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn account_id(&self) -> AccountId {
        self.account_id
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }
}

/// Marker pattern: the account id sits in the profile-wall edit link.
fn account_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"user_walls/(\d+)/edit").expect("account id pattern is valid")
    })
}

/// Extract the account id from a login reply body.
pub fn extract_account_id(body: &str) -> Option<AccountId> {
    account_id_pattern()
        .captures(body)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u64>().ok())
        .map(AccountId)
}

/// Submit credentials and bind the session to the account they unlock.
///
/// A 401/403 reply or a body without the account marker is an
/// authentication failure. Other transport failures propagate unchanged.
pub fn authenticate(
    session: Session,
    endpoints: Endpoints,
    credentials: &Credentials,
) -> VaultResult<AuthenticatedSession> {
    let body = session
        .request(
            endpoints.login_url(),
            Some(&credentials.form()),
            &RequestHeaders::new(),
        )
        .map_err(|e| match e {
            VaultError::HttpStatus {
                status: 401 | 403, ..
            } => VaultError::AuthenticationFailed,
            other => other,
        })?;

    let Some(account_id) = extract_account_id(&body) else {
        warn!(identifier = credentials.identifier(), "Login reply carried no account id");
        return Err(VaultError::AuthenticationFailed);
    };

    info!(%account_id, "Authenticated");
    Ok(AuthenticatedSession {
        session,
        account_id,
        endpoints,
    })
}
