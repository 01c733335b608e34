//! Detection of bundles purchased more than once.
//!
//! Bundles are grouped by display name. Ids are unique per purchase, so
//! the same bundle bought twice (or gifted twice) shows up as two entries
//! sharing one name.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::catalog::{BundleId, Catalog};

/// Count catalog entries per display name.
///
/// Every name in the catalog appears in the result; a count above one
/// marks a duplicate purchase.
pub fn find_duplicates(catalog: &Catalog) -> BTreeMap<String, usize> {
    catalog.iter().fold(BTreeMap::new(), |mut acc, entry| {
        *acc.entry(entry.name().to_string()).or_insert(0) += 1;
        acc
    })
}

/// A name shared by several catalog entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    pub name: String,
    /// Ids of every entry carrying the name, ascending.
    pub ids: Vec<BundleId>,
}

impl DuplicateGroup {
    pub fn count(&self) -> usize {
        self.ids.len()
    }
}

/// Names held by more than one entry, with the ids involved.
pub fn duplicate_groups(catalog: &Catalog) -> Vec<DuplicateGroup> {
    let mut by_name: BTreeMap<&str, Vec<BundleId>> = BTreeMap::new();
    for entry in catalog {
        by_name.entry(entry.name()).or_default().push(entry.id());
    }

    by_name
        .into_iter()
        .filter(|(_, ids)| ids.len() > 1)
        .map(|(name, ids)| DuplicateGroup {
            name: name.to_string(),
            ids,
        })
        .collect()
}
