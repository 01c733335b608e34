//! Catalog auditing: duplicate purchases and asset integrity.
//!
//! Duplicate detection is a pure function over a [`Catalog`]. Integrity
//! validation resolves each entry's assets and probes their remote sizes,
//! producing a [`Verdict`] that keeps every defect it found.
//!
//! [`Catalog`]: crate::catalog::Catalog

mod duplicates;
mod validator;

pub use duplicates::{duplicate_groups, find_duplicates, DuplicateGroup};
pub use validator::{Defect, IntegrityValidator, Verdict, DEFAULT_MIN_PLAUSIBLE_BYTES};
