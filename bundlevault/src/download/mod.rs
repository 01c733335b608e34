//! Resumable file retrieval.
//!
//! Every asset of a bundle lands in `<root>/<bundle folder>/<filename>`.
//! Partial and complete files share the same path; whether a transfer is
//! needed is decided by comparing the local length with the remote size.
//!
//! # Example
//!
//! ```ignore
//! use bundlevault::download::{DownloadJob, ResumableDownloader};
//!
//! let downloader = ResumableDownloader::new(auth.session());
//! let outcome = downloader.download(&DownloadJob::new(url, "downloads/My Bundle"))?;
//! println!("{} bytes", outcome.bytes_transferred());
//! ```

mod filter;
mod job;
mod layout;
mod resumable;

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

pub use filter::LabelFilter;
pub use job::{DownloadJob, DownloadOutcome, PreparedDownload, UnknownSizePolicy};
pub use layout::{entry_folder_name, numbered_filename};
pub use resumable::{ProgressCallback, ResumableDownloader};

use crate::catalog::{AssetReference, ProductEntry};
use crate::error::{VaultError, VaultResult};

/// Result of retrieving one asset of an entry.
#[derive(Debug)]
pub struct AssetDownload {
    pub url: String,
    pub result: VaultResult<DownloadOutcome>,
}

/// Folder an entry's assets are written into.
pub fn entry_folder(root: &Path, entry: &ProductEntry) -> PathBuf {
    root.join(entry_folder_name(entry.name()))
}

/// Download every URL asset of an entry that passes `filter`, one after
/// another.
///
/// Creates the entry folder first. A failing asset is recorded and the
/// remaining assets are still attempted; only a failure to create the
/// folder aborts the entry. Filtered-out assets issue no request.
///
/// When two assets of the pass resolve to the same file name, the later
/// one is written as `name (2).ext`, `name (3).ext` and so on. Asset
/// order is stable, so a re-run maps each asset to the same file.
pub fn download_entry(
    downloader: &ResumableDownloader<'_>,
    entry: &ProductEntry,
    assets: &[AssetReference],
    filter: &LabelFilter,
    root: &Path,
) -> VaultResult<Vec<AssetDownload>> {
    let folder = entry_folder(root, entry);
    fs::create_dir_all(&folder).map_err(|e| VaultError::storage(&folder, e))?;

    let mut claimed = HashSet::new();
    let mut results = Vec::new();
    let mut skipped = 0usize;
    for asset in assets.iter().filter(|a| a.is_url()) {
        if !filter.allows(asset) {
            debug!(bundle_id = %entry.id(), url = %asset.value, label = ?asset.label, "Asset filtered out");
            skipped += 1;
            continue;
        }

        let job = DownloadJob::new(asset.value.as_str(), &folder);
        let result = downloader
            .prepare(&job)
            .map(|prepared| claim_filename(prepared, &mut claimed))
            .and_then(|prepared| downloader.transfer(&prepared));
        if let Err(e) = &result {
            warn!(bundle_id = %entry.id(), url = %asset.value, error = %e, "Asset download failed");
        }
        results.push(AssetDownload {
            url: asset.value.clone(),
            result,
        });
    }

    info!(
        bundle_id = %entry.id(),
        folder = %folder.display(),
        assets = results.len(),
        skipped,
        failed = results.iter().filter(|r| r.result.is_err()).count(),
        "Entry download pass finished"
    );
    Ok(results)
}

/// Reserve the prepared file name for this pass, numbering it when an
/// earlier asset already took it.
fn claim_filename(prepared: PreparedDownload, claimed: &mut HashSet<String>) -> PreparedDownload {
    if claimed.insert(prepared.filename.clone()) {
        return prepared;
    }

    let mut n = 2;
    let mut candidate = numbered_filename(&prepared.filename, n);
    while !claimed.insert(candidate.clone()) {
        n += 1;
        candidate = numbered_filename(&prepared.filename, n);
    }
    warn!(
        url = %prepared.url,
        filename = %prepared.filename,
        renamed = %candidate,
        "File name already used by another asset of this bundle"
    );
    prepared.renamed(candidate)
}
