//! Purchase catalog model and retrieval.
//!
//! A [`Catalog`] is a point-in-time snapshot of every bundle the account
//! owns, keyed by bundle id. It is never refreshed after it was fetched.

mod decode;
mod entry;
mod fetcher;

use std::collections::BTreeMap;

pub use decode::{decode_page, unescape_record, CatalogRecord};
pub use entry::{AccountId, AssetKind, AssetReference, AssetState, BundleId, ProductEntry};
pub use fetcher::fetch_catalog;

/// All bundles of one account, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: BTreeMap<BundleId, ProductEntry>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, replacing and returning any entry with the same id.
    pub fn insert(&mut self, entry: ProductEntry) -> Option<ProductEntry> {
        self.entries.insert(entry.id(), entry)
    }

    pub fn get(&self, id: BundleId) -> Option<&ProductEntry> {
        self.entries.get(&id)
    }

    /// Iterate over entries in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &ProductEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<ProductEntry> for Catalog {
    fn from_iter<I: IntoIterator<Item = ProductEntry>>(iter: I) -> Self {
        let mut catalog = Catalog::new();
        for entry in iter {
            catalog.insert(entry);
        }
        catalog
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a ProductEntry;
    type IntoIter = std::collections::btree_map::Values<'a, BundleId, ProductEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_replaces_same_id() {
        let mut catalog = Catalog::new();
        assert!(catalog
            .insert(ProductEntry::new(BundleId(1), "First", AccountId(1)))
            .is_none());
        let replaced = catalog.insert(ProductEntry::new(BundleId(1), "Second", AccountId(1)));

        assert_eq!(replaced.unwrap().name(), "First");
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get(BundleId(1)).unwrap().name(), "Second");
    }

    #[test]
    fn test_from_iterator() {
        let catalog: Catalog = (1..=3)
            .map(|i| ProductEntry::new(BundleId(i), format!("B{}", i), AccountId(1)))
            .collect();
        assert_eq!(catalog.len(), 3);
        assert_eq!(
            catalog.iter().map(|e| e.id().0).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }
}
