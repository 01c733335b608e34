//! Human-readable and JSON rendering of run results.

use serde::Serialize;

use crate::audit::{DuplicateGroup, Verdict};
use crate::catalog::{BundleId, Catalog};
use crate::download::DownloadOutcome;
use crate::sync::{AuditRow, EntryReport, RevealOutcome};

/// Render the catalog as one line per bundle.
pub fn catalog_text(catalog: &Catalog) -> String {
    let mut lines: Vec<String> = catalog
        .iter()
        .map(|entry| format!("{:>10}  {}", entry.id().0, entry.name()))
        .collect();
    lines.push(String::new());
    lines.push(format!("{} bundles", catalog.len()));
    lines.join("\n")
}

/// Render the names bought more than once.
pub fn duplicates_text(groups: &[DuplicateGroup]) -> String {
    if groups.is_empty() {
        return "No duplicate purchases.".to_string();
    }

    let mut lines = vec![
        "Duplicate Purchases".to_string(),
        "===================".to_string(),
    ];
    for group in groups {
        let ids: Vec<String> = group.ids.iter().map(BundleId::to_string).collect();
        lines.push(format!(
            "{:>3} x  {}  (ids: {})",
            group.count(),
            group.name,
            ids.join(", ")
        ));
    }
    lines.join("\n")
}

/// Render an audit: every defective entry with one reason per line, then
/// entries that could not be checked, then totals.
pub fn audit_text(rows: &[AuditRow]) -> String {
    let mut lines = vec!["Catalog Audit".to_string(), "=============".to_string()];
    let mut defective = 0usize;
    let mut errored = 0usize;

    for row in rows {
        match &row.outcome {
            Ok(Verdict::Ok) => {}
            Ok(verdict) => {
                defective += 1;
                lines.push(format!("{} [{}]", row.name, row.id));
                for reason in verdict.reasons() {
                    lines.push(format!("  - {}", reason));
                }
            }
            Err(_) => errored += 1,
        }
    }

    if errored > 0 {
        lines.push(String::new());
        lines.push("Not checked".to_string());
        lines.push("-----------".to_string());
        for row in rows {
            if let Err(e) = &row.outcome {
                lines.push(format!("{} [{}]: {}", row.name, row.id, e));
            }
        }
    }

    lines.push(String::new());
    lines.push(format!(
        "{} checked, {} ok, {} defective, {} not checked",
        rows.len(),
        rows.len() - defective - errored,
        defective,
        errored
    ));
    lines.join("\n")
}

#[derive(Debug, Serialize)]
struct AuditRecord<'a> {
    id: BundleId,
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    verdict: Option<&'a Verdict>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Render an audit as a JSON array, one object per entry.
pub fn audit_json(rows: &[AuditRow]) -> Result<String, serde_json::Error> {
    let records: Vec<AuditRecord<'_>> = rows
        .iter()
        .map(|row| AuditRecord {
            id: row.id,
            name: &row.name,
            verdict: row.outcome.as_ref().ok(),
            error: row.outcome.as_ref().err().map(ToString::to_string),
        })
        .collect();
    serde_json::to_string_pretty(&records)
}

/// Render a download run: failures in detail, then totals.
pub fn downloads_text(reports: &[EntryReport]) -> String {
    let mut lines = Vec::new();
    let mut transferred = 0u64;
    let mut files_new = 0usize;
    let mut files_done = 0usize;
    let mut failures = 0usize;

    for report in reports {
        let reveal = match report.reveal {
            RevealOutcome::Revealed => "",
            RevealOutcome::Skipped => " (not revealed)",
            RevealOutcome::Failed => " (reveal failed)",
        };

        match &report.assets {
            Err(e) => {
                failures += 1;
                lines.push(format!("FAILED  {} [{}]{}: {}", report.name, report.id, reveal, e));
            }
            Ok(assets) => {
                for asset in assets {
                    match &asset.result {
                        Ok(outcome @ DownloadOutcome::Transferred { .. }) => {
                            files_new += 1;
                            transferred += outcome.bytes_transferred();
                        }
                        Ok(DownloadOutcome::AlreadyComplete { .. }) => files_done += 1,
                        Err(e) => {
                            failures += 1;
                            lines.push(format!(
                                "FAILED  {} [{}]{}: {}",
                                report.name, report.id, reveal, e
                            ));
                        }
                    }
                }
            }
        }
    }

    lines.push(format!(
        "{} bundles, {} files downloaded ({} bytes), {} already complete, {} failures",
        reports.len(),
        files_new,
        transferred,
        files_done,
        failures
    ));
    lines.join("\n")
}
