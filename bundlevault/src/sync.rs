//! One retrieval run over an authenticated account.
//!
//! [`Vault`] wires the session, link discovery, downloader and validator
//! together. Entries are processed one at a time in catalog order, and a
//! failing entry is recorded in its report without stopping the run.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::audit::{find_duplicates, IntegrityValidator, Verdict};
use crate::auth::{authenticate, AuthenticatedSession, Credentials};
use crate::catalog::{fetch_catalog, BundleId, Catalog, ProductEntry};
use crate::config::VaultSettings;
use crate::download::{download_entry, AssetDownload, ResumableDownloader};
use crate::error::{VaultError, VaultResult};
use crate::links::{LinkResolver, StorefrontPatterns};
use crate::session::{HttpTransport, ReqwestTransport, Session};
use crate::storefront::Endpoints;

/// When to ask the storefront to reveal a bundle's products.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RevealPolicy {
    /// Reveal every bundle before resolving it.
    Always,
    /// Reveal only bundles whose name occurs once in the catalog.
    #[default]
    SkipDuplicates,
    /// Never reveal.
    Never,
}

impl std::str::FromStr for RevealPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "always" => Ok(Self::Always),
            "skip_duplicates" | "skip-duplicates" => Ok(Self::SkipDuplicates),
            "never" => Ok(Self::Never),
            other => Err(format!(
                "unknown reveal policy '{}', expected always, skip_duplicates or never",
                other
            )),
        }
    }
}

impl std::fmt::Display for RevealPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Always => write!(f, "always"),
            Self::SkipDuplicates => write!(f, "skip_duplicates"),
            Self::Never => write!(f, "never"),
        }
    }
}

/// What happened to the reveal step of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealOutcome {
    Revealed,
    /// The request failed; the run carried on regardless.
    Failed,
    Skipped,
}

/// Per-entry result of a download run.
#[derive(Debug)]
pub struct EntryReport {
    pub id: BundleId,
    pub name: String,
    pub reveal: RevealOutcome,
    /// Per-asset results, or the error that stopped the entry before any
    /// asset was attempted.
    pub assets: VaultResult<Vec<AssetDownload>>,
}

impl EntryReport {
    /// Whether the entry and all its assets succeeded.
    pub fn is_complete(&self) -> bool {
        match &self.assets {
            Ok(assets) => assets.iter().all(|a| a.result.is_ok()),
            Err(_) => false,
        }
    }
}

/// Per-entry result of an audit.
#[derive(Debug)]
pub struct AuditRow {
    pub id: BundleId,
    pub name: String,
    pub outcome: VaultResult<Verdict>,
}

/// Shared progress sink, invoked with `(bytes on disk, remote size)`.
pub type SharedProgress = Arc<dyn Fn(u64, Option<u64>) + Send + Sync>;

/// An authenticated account plus everything needed to process its catalog.
pub struct Vault {
    auth: AuthenticatedSession,
    patterns: StorefrontPatterns,
    settings: VaultSettings,
    progress: Option<SharedProgress>,
}

impl Vault {
    /// Log in over a reqwest transport built from the settings.
    pub fn connect(settings: VaultSettings, credentials: &Credentials) -> VaultResult<Self> {
        let transport = ReqwestTransport::with_timeouts(settings.timeout, settings.connect_timeout)
            .map_err(|e| VaultError::Config(e.to_string()))?;
        Self::login(transport, settings, credentials)
    }

    /// Log in over the given transport.
    pub fn login(
        transport: impl HttpTransport + 'static,
        settings: VaultSettings,
        credentials: &Credentials,
    ) -> VaultResult<Self> {
        let mut patterns = StorefrontPatterns::for_storage_host(&settings.storage_host);
        if let Some(pattern) = &settings.key_pattern {
            patterns = patterns
                .with_key_pattern(pattern)
                .map_err(|e| VaultError::Config(format!("invalid key pattern: {}", e)))?;
        }

        let session = Session::with_user_agent(transport, &settings.user_agent);
        let endpoints = Endpoints::for_base(&settings.base_url);
        let auth = authenticate(session, endpoints, credentials)?;

        Ok(Self {
            auth,
            patterns,
            settings,
            progress: None,
        })
    }

    /// Report download progress to the given sink.
    pub fn with_progress(mut self, progress: SharedProgress) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn auth(&self) -> &AuthenticatedSession {
        &self.auth
    }

    pub fn settings(&self) -> &VaultSettings {
        &self.settings
    }

    pub fn resolver(&self) -> LinkResolver<'_> {
        LinkResolver::new(&self.auth, &self.patterns)
    }

    pub fn fetch_catalog(&self) -> VaultResult<Catalog> {
        fetch_catalog(&self.auth)
    }

    /// Validate every entry of the catalog.
    pub fn audit(&self, catalog: &Catalog) -> Vec<AuditRow> {
        let resolver = self.resolver();
        let validator =
            IntegrityValidator::new().with_min_plausible_bytes(self.settings.min_plausible_bytes);

        catalog
            .iter()
            .map(|entry| {
                let outcome = validator.validate(entry, &resolver);
                if let Err(e) = &outcome {
                    warn!(bundle_id = %entry.id(), error = %e, "Could not check entry");
                }
                AuditRow {
                    id: entry.id(),
                    name: entry.name().to_string(),
                    outcome,
                }
            })
            .collect()
    }

    /// Reveal, resolve and download every entry of the catalog into `root`.
    ///
    /// Only assets admitted by the configured label filter are fetched.
    pub fn reveal_and_download(
        &self,
        catalog: &Catalog,
        root: &Path,
        policy: RevealPolicy,
    ) -> Vec<EntryReport> {
        let resolver = self.resolver();
        let counts = find_duplicates(catalog);
        let downloader = self.downloader();

        let reports: Vec<EntryReport> = catalog
            .iter()
            .map(|entry| {
                let duplicated = counts.get(entry.name()).is_some_and(|&n| n > 1);
                let reveal = reveal_step(&resolver, entry, policy, duplicated);
                let assets = resolver
                    .resolve(entry)
                    .and_then(|assets| {
                        download_entry(&downloader, entry, assets, &self.settings.labels, root)
                    });

                if let Err(e) = &assets {
                    warn!(bundle_id = %entry.id(), name = entry.name(), error = %e, "Entry failed");
                }
                EntryReport {
                    id: entry.id(),
                    name: entry.name().to_string(),
                    reveal,
                    assets,
                }
            })
            .collect();

        info!(
            entries = reports.len(),
            labels = %self.settings.labels,
            complete = reports.iter().filter(|r| r.is_complete()).count(),
            "Download run finished"
        );
        reports
    }

    fn downloader(&self) -> ResumableDownloader<'_> {
        let downloader = ResumableDownloader::new(self.auth.session())
            .with_unknown_size_policy(self.settings.unknown_size);
        match &self.progress {
            Some(progress) => {
                let progress = Arc::clone(progress);
                downloader.with_progress(Box::new(move |done, total| progress(done, total)))
            }
            None => downloader,
        }
    }
}

impl std::fmt::Debug for Vault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vault")
            .field("auth", &self.auth)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

fn reveal_step(
    resolver: &LinkResolver<'_>,
    entry: &ProductEntry,
    policy: RevealPolicy,
    duplicated: bool,
) -> RevealOutcome {
    let wanted = match policy {
        RevealPolicy::Always => true,
        RevealPolicy::SkipDuplicates => !duplicated,
        RevealPolicy::Never => false,
    };

    if !wanted {
        return RevealOutcome::Skipped;
    }
    if resolver.reveal(entry) {
        RevealOutcome::Revealed
    } else {
        RevealOutcome::Failed
    }
}
