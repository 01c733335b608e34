//! `download` command: reveal, resolve and download the whole catalog.

use std::path::PathBuf;

use bundlevault::download::LabelFilter;
use bundlevault::report::downloads_text;
use bundlevault::sync::RevealPolicy;
use console::style;

use super::common::{self, GlobalArgs};
use crate::error::CliError;

/// Arguments for the download command.
#[derive(Debug, Clone, Default)]
pub struct DownloadArgs {
    /// Destination root overriding the config file.
    pub dir: Option<PathBuf>,
    /// Reveal policy overriding the config file.
    pub reveal: Option<RevealPolicy>,
    /// Labels to restrict downloads to; replaces the config list when set.
    pub only: Vec<String>,
    /// Labels to skip; replaces the config list when set.
    pub exclude: Vec<String>,
}

impl DownloadArgs {
    /// Merge the label flags over the configured filter.
    pub fn labels(&self, configured: &LabelFilter) -> LabelFilter {
        let only = if self.only.is_empty() {
            configured.only()
        } else {
            self.only.as_slice()
        };
        let exclude = if self.exclude.is_empty() {
            configured.exclude()
        } else {
            self.exclude.as_slice()
        };
        LabelFilter::new().with_only(only).with_exclude(exclude)
    }
}

/// Run the download command.
pub fn run(globals: &GlobalArgs, args: DownloadArgs) -> Result<(), CliError> {
    let config = globals.load_config()?;
    let mut settings = config.settings();
    if let Some(dir) = &args.dir {
        settings = settings.with_download_dir(dir);
    }
    if let Some(policy) = args.reveal {
        settings = settings.with_reveal(policy);
    }
    let labels = args.labels(&settings.labels);
    settings = settings.with_labels(labels);
    let root = settings.download_dir.clone();
    let policy = settings.reveal;

    let (bar, progress) = common::download_progress();
    let vault = common::connect(globals, &config, settings)?.with_progress(progress);
    let catalog = common::fetch_catalog(&vault)?;

    println!(
        "Downloading {} bundles to {} (reveal: {}, files: {})",
        catalog.len(),
        style(common::display_path(&root)).bold(),
        policy,
        vault.settings().labels
    );
    let reports = vault.reveal_and_download(&catalog, &root, policy);
    bar.finish_and_clear();

    println!("{}", downloads_text(&reports));
    if reports.iter().all(|r| r.is_complete()) {
        println!("{}", style("All bundles complete.").green());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_flags_replace_config_lists() {
        let configured = LabelFilter::new().with_only(["flac"]).with_exclude(["other"]);

        let args = DownloadArgs {
            exclude: vec!["mp3".to_string()],
            ..Default::default()
        };
        let labels = args.labels(&configured);
        assert_eq!(labels.only(), ["flac"]);
        assert_eq!(labels.exclude(), ["mp3"]);

        assert_eq!(DownloadArgs::default().labels(&configured), configured);
    }
}
