//! BundleVault - purchased bundle retrieval for cookie-authenticated storefronts
//!
//! This library logs into a storefront account, pages through the purchase
//! catalog, discovers each bundle's downloadable files and license keys,
//! and downloads the files with byte-range resume. It also audits the
//! catalog for duplicate purchases and for bundles whose assets are
//! missing, unreachable or truncated.
//!
//! # Flow
//!
//! ```text
//! Credentials ─► authenticate ─► fetch_catalog ─► Catalog
//!                                                   │
//!                  ┌────────────────────────────────┼──────────────────┐
//!                  ▼                                ▼                  ▼
//!           find_duplicates               IntegrityValidator     LinkResolver
//!                                                                      │
//!                                                             ResumableDownloader
//! ```
//!
//! [`sync::Vault`] runs these steps for a whole catalog.

pub mod audit;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod download;
pub mod error;
pub mod links;
pub mod logging;
pub mod report;
pub mod session;
pub mod storefront;
pub mod sync;

pub use error::{VaultError, VaultResult};
