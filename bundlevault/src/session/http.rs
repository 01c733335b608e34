//! HTTP transport abstraction for testability.
//!
//! The session never talks to reqwest directly. It drives an
//! [`HttpTransport`], which lets tests script storefront replies and
//! inspect the exact requests (including range offsets) that were issued.

use std::io::Read;
use std::sync::Arc;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::cookie::Jar;
use thiserror::Error;

use super::headers::{FormParams, RequestHeaders};

/// Default timeout for a whole request or a single body read, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300; // 5 minutes

/// Default timeout for establishing a connection, in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// HTTP method used for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    /// Metadata only, no body.
    Head,
}

/// A single request handed to the transport.
#[derive(Debug, Clone, Copy)]
pub struct HttpRequest<'a> {
    pub method: Method,
    pub url: &'a str,
    /// Fully merged headers for this request.
    pub headers: &'a RequestHeaders,
    /// Form body, only meaningful for [`Method::Post`].
    pub form: Option<&'a FormParams>,
    /// Request bytes from this offset to the end (`Range: bytes=<n>-`).
    pub range_start: Option<u64>,
}

/// A response with a lazily read body.
pub struct HttpResponse {
    pub status: u16,
    /// Header names are lower-case.
    pub headers: Vec<(String, String)>,
    pub body: Box<dyn Read + Send>,
}

impl HttpResponse {
    /// Look up a header by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl std::fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// A network-layer failure reported by a transport.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct TransportFailure(pub String);

/// Trait for HTTP transport operations.
///
/// Implementations carry their own cookie store; every request issued
/// through the same transport shares it.
pub trait HttpTransport: Send + Sync {
    /// Perform one request. Non-success statuses are returned as responses,
    /// not failures.
    fn execute(&self, request: &HttpRequest<'_>) -> Result<HttpResponse, TransportFailure>;
}

/// Real transport using a blocking reqwest client with a cookie jar.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Create a transport with default timeouts.
    pub fn new() -> Result<Self, TransportFailure> {
        Self::with_timeouts(
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        )
    }

    /// Create a transport with custom timeouts.
    pub fn with_timeouts(
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self, TransportFailure> {
        let client = Client::builder()
            .cookie_provider(Arc::new(Jar::default()))
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| TransportFailure(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

impl HttpTransport for ReqwestTransport {
    fn execute(&self, request: &HttpRequest<'_>) -> Result<HttpResponse, TransportFailure> {
        let mut builder = match request.method {
            Method::Get => self.client.get(request.url),
            Method::Post => self.client.post(request.url),
            Method::Head => self.client.head(request.url),
        };

        for (name, value) in request.headers.iter() {
            builder = builder.header(name, value);
        }
        if let Some(offset) = request.range_start {
            builder = builder.header("range", format!("bytes={}-", offset));
        }
        if let Some(form) = request.form {
            builder = builder.form(form.fields());
        }

        let response = builder.send().map_err(|e| {
            if e.is_timeout() {
                TransportFailure(format!("timed out: {}", e))
            } else {
                TransportFailure(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();

        Ok(HttpResponse {
            status,
            headers,
            body: Box::new(response),
        })
    }
}
