//! Asset link and license key discovery in bundle detail pages.

use std::collections::HashSet;

use regex::Regex;

use crate::catalog::AssetReference;

/// Host serving the storefront's downloadable files.
pub const DEFAULT_STORAGE_HOST: &str = "storage.groupees.com";

/// Default license key pattern; group 1 captures the key.
pub const DEFAULT_KEY_PATTERN: &str = r#"data-key="([^"]+)""#;

/// Trait for extracting asset references from a detail page body.
///
/// The markup a storefront uses to expose links is opaque to the rest of
/// the crate; only implementations of this trait know about it.
pub trait LinkDiscovery: Send + Sync {
    /// Return every asset reference found, without duplicates, in page order.
    fn discover(&self, page: &str) -> Vec<AssetReference>;
}

/// Regex-based discovery for the known storefront link shapes.
///
/// Recognises media downloads (`/albums/<n>/[flac|mp3/]download[/<n>]`,
/// `/games/<n>/download`), other products keyed by a `file_id` query
/// parameter, and license keys matched by a configurable pattern.
#[derive(Debug, Clone)]
pub struct StorefrontPatterns {
    media: Regex,
    other: Regex,
    key: Regex,
}

impl Default for StorefrontPatterns {
    fn default() -> Self {
        Self::for_storage_host(DEFAULT_STORAGE_HOST)
    }
}

impl StorefrontPatterns {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the link patterns for a given storage host.
    pub fn for_storage_host(host: &str) -> Self {
        let host = regex::escape(host);
        // The host is escaped and the rest of each pattern is fixed.
        let media = Regex::new(&format!(
            r"https://{}/(albums|games)/[0-9]+/(?:(flac|mp3)/)?download(?:/[0-9]+)?",
            host
        ))
        .expect("media link pattern is valid");
        let other = Regex::new(&format!(
            r"https://{}/other_products/[0-9]+/download\?file_id=[0-9]+",
            host
        ))
        .expect("other product link pattern is valid");
        let key = Regex::new(DEFAULT_KEY_PATTERN).expect("default key pattern is valid");

        Self { media, other, key }
    }

    /// Replace the license key pattern.
    ///
    /// The pattern's first capture group is taken as the key; without a
    /// group the whole match is used.
    pub fn with_key_pattern(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.key = Regex::new(pattern)?;
        Ok(self)
    }
}

impl LinkDiscovery for StorefrontPatterns {
    fn discover(&self, page: &str) -> Vec<AssetReference> {
        let mut seen = HashSet::new();
        let mut found = Vec::new();

        for caps in self.media.captures_iter(page) {
            let url = &caps[0];
            let label = match (caps.get(2), &caps[1]) {
                (Some(format), _) => format.as_str(),
                (None, "albums") => "album",
                (None, _) => "game",
            };
            if seen.insert(url.to_string()) {
                found.push(AssetReference::url(url, Some(label)));
            }
        }

        for m in self.other.find_iter(page) {
            if seen.insert(m.as_str().to_string()) {
                found.push(AssetReference::url(m.as_str(), Some("other")));
            }
        }

        for caps in self.key.captures_iter(page) {
            let key = caps.get(1).map_or(&caps[0], |m| m.as_str()).trim();
            if !key.is_empty() && seen.insert(format!("key:{}", key)) {
                found.push(AssetReference::license_key(key, Some("key")));
            }
        }

        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::AssetKind;

    const PAGE: &str = r#"
        <a href="https://storage.groupees.com/albums/123/flac/download">FLAC</a>
        <a href="https://storage.groupees.com/albums/123/mp3/download/4">MP3</a>
        <a href="https://storage.groupees.com/games/77/download">Game</a>
        <a href="https://storage.groupees.com/albums/123/flac/download">FLAC again</a>
        <a href="https://storage.groupees.com/other_products/9/download?file_id=31">Comic</a>
        <span class="code" data-key="ABCD-EFGH-IJKL">Steam</span>
        <a href="https://elsewhere.example.com/games/1/download">Mirror</a>
    "#;

    #[test]
    fn test_discovers_known_shapes_in_order() {
        let found = StorefrontPatterns::new().discover(PAGE);
        let values: Vec<&str> = found.iter().map(|a| a.value.as_str()).collect();

        assert_eq!(
            values,
            vec![
                "https://storage.groupees.com/albums/123/flac/download",
                "https://storage.groupees.com/albums/123/mp3/download/4",
                "https://storage.groupees.com/games/77/download",
                "https://storage.groupees.com/other_products/9/download?file_id=31",
                "ABCD-EFGH-IJKL",
            ]
        );
    }

    #[test]
    fn test_labels() {
        let found = StorefrontPatterns::new().discover(PAGE);
        let labels: Vec<&str> = found.iter().filter_map(|a| a.label.as_deref()).collect();
        assert_eq!(labels, vec!["flac", "mp3", "game", "other", "key"]);
        assert_eq!(found[4].kind, AssetKind::LicenseKey);
    }

    #[test]
    fn test_album_without_format_is_labelled_album() {
        let found = StorefrontPatterns::new()
            .discover("https://storage.groupees.com/albums/5/download");
        assert_eq!(found[0].label.as_deref(), Some("album"));
    }

    #[test]
    fn test_nothing_found() {
        assert!(StorefrontPatterns::new().discover("<html></html>").is_empty());
    }

    #[test]
    fn test_custom_host_and_key_pattern() {
        let patterns = StorefrontPatterns::for_storage_host("files.local")
            .with_key_pattern(r"KEY:([A-Z0-9]+)")
            .unwrap();
        let found = patterns.discover("https://files.local/games/1/download KEY:XYZ123");
        assert_eq!(found.len(), 2);
        assert_eq!(found[1].value, "XYZ123");
    }

    #[test]
    fn test_invalid_key_pattern() {
        assert!(StorefrontPatterns::new().with_key_pattern("(").is_err());
    }
}
