//! Cookie-carrying session over an HTTP transport.

use std::io::Read;

use tracing::{debug, trace};

use super::headers::{FormParams, RequestHeaders};
use super::http::{HttpRequest, HttpResponse, HttpTransport, Method};
use super::metadata::RemoteMetadata;
use crate::error::{VaultError, VaultResult};

/// Identity string sent with every request.
///
/// The storefront refuses logins from clients without a browser-like
/// user agent.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:128.0) Gecko/20100101 Firefox/128.0";

/// An HTTP session sharing one cookie store across all requests.
///
/// The identity headers are fixed at construction. Per-call headers are
/// passed explicitly and only apply to that call.
pub struct Session {
    transport: Box<dyn HttpTransport>,
    identity: RequestHeaders,
}

impl Session {
    /// Create a session with an explicit identity header set.
    pub fn new(transport: impl HttpTransport + 'static, identity: RequestHeaders) -> Self {
        Self {
            transport: Box::new(transport),
            identity,
        }
    }

    /// Create a session identifying itself with the given user agent.
    pub fn with_user_agent(transport: impl HttpTransport + 'static, user_agent: &str) -> Self {
        Self::new(
            transport,
            RequestHeaders::new().with("user-agent", user_agent),
        )
    }

    /// The identity headers sent with every request.
    pub fn identity(&self) -> &RequestHeaders {
        &self.identity
    }

    /// Fetch a page body as text.
    ///
    /// Issues a GET when `form` is absent or empty, otherwise a POST with
    /// URL-encoded form fields. Any non-success status is an error.
    pub fn request(
        &self,
        url: &str,
        form: Option<&FormParams>,
        headers: &RequestHeaders,
    ) -> VaultResult<String> {
        let form = form.filter(|f| !f.is_empty());
        let method = if form.is_some() {
            Method::Post
        } else {
            Method::Get
        };

        let response = self.send(method, url, form, None, headers)?;
        let response = ensure_success(url, response)?;

        let mut body = Vec::new();
        let mut reader = response.body;
        reader
            .read_to_end(&mut body)
            .map_err(|e| VaultError::Transport {
                url: url.to_string(),
                reason: format!("read error: {}", e),
            })?;

        trace!(url, bytes = body.len(), "Read response body");
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    /// Probe filename and size of a remote file without fetching its body.
    pub fn probe_metadata(&self, url: &str, headers: &RequestHeaders) -> VaultResult<RemoteMetadata> {
        let response = self.send(Method::Head, url, None, None, headers)?;
        let response = ensure_success(url, response)?;

        let meta = RemoteMetadata::from_headers(
            response.header("content-disposition"),
            response.header("content-length"),
        );
        debug!(url, filename = ?meta.filename, size = ?meta.size, "Probed remote metadata");
        Ok(meta)
    }

    /// Open a streaming GET for the bytes from `offset` to end of file.
    ///
    /// The response is returned whatever its status; callers decide how to
    /// treat partial-content, full-content and range-not-satisfiable replies.
    pub fn open_range(
        &self,
        url: &str,
        offset: u64,
        headers: &RequestHeaders,
    ) -> VaultResult<HttpResponse> {
        self.send(Method::Get, url, None, Some(offset), headers)
    }

    fn send(
        &self,
        method: Method,
        url: &str,
        form: Option<&FormParams>,
        range_start: Option<u64>,
        headers: &RequestHeaders,
    ) -> VaultResult<HttpResponse> {
        let merged = self.identity.merged(headers);
        let request = HttpRequest {
            method,
            url,
            headers: &merged,
            form,
            range_start,
        };

        debug!(?method, url, range_start, "Sending request");
        self.transport
            .execute(&request)
            .map_err(|e| VaultError::Transport {
                url: url.to_string(),
                reason: e.0,
            })
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

fn ensure_success(url: &str, response: HttpResponse) -> VaultResult<HttpResponse> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(VaultError::HttpStatus {
            url: url.to_string(),
            status: response.status,
        })
    }
}
