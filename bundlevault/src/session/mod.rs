//! Authenticated HTTP session plumbing.
//!
//! This module provides:
//! - The transport abstraction and its reqwest implementation (`http`)
//! - Immutable per-request headers and form payloads (`headers`)
//! - The cookie-carrying [`Session`] used by every other component (`client`)
//! - HEAD-probe metadata parsing (`metadata`)
//!
//! # Architecture
//!
//! ```text
//! Session ── identity headers (fixed)
//!    │
//!    └── HttpTransport (trait)
//!            ├── ReqwestTransport (cookie jar, timeouts)
//!            └── MockTransport (tests)
//! ```

mod client;
mod headers;
mod http;
mod metadata;

#[cfg(test)]
pub(crate) mod mock;

pub use client::{Session, DEFAULT_USER_AGENT};
pub use headers::{FormParams, RequestHeaders};
pub use http::{
    HttpRequest, HttpResponse, HttpTransport, Method, ReqwestTransport, TransportFailure,
    DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_TIMEOUT_SECS,
};
pub use metadata::{quoted_filename, RemoteMetadata};
