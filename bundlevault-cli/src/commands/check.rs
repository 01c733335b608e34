//! `check` command: audit every bundle for missing or broken assets.

use bundlevault::report::{audit_json, audit_text};

use super::common::{self, GlobalArgs};
use crate::error::CliError;

/// Arguments for the check command.
#[derive(Debug, Clone, Default)]
pub struct CheckArgs {
    /// Size threshold in KiB overriding the config file.
    pub min_size_kb: Option<u64>,
    /// Print the report as JSON.
    pub json: bool,
}

/// Run the check command.
pub fn run(globals: &GlobalArgs, args: CheckArgs) -> Result<(), CliError> {
    let config = globals.load_config()?;
    let mut settings = config.settings();
    if let Some(kb) = args.min_size_kb {
        settings = settings.with_min_plausible_bytes(kb * 1024);
    }

    let vault = common::connect(globals, &config, settings)?;
    let catalog = common::fetch_catalog(&vault)?;

    let spinner = common::spinner(&format!("Checking {} bundles...", catalog.len()));
    let rows = vault.audit(&catalog);
    spinner.finish_and_clear();

    if args.json {
        let json = audit_json(&rows).map_err(|e| CliError::Output(e.to_string()))?;
        println!("{}", json);
    } else {
        println!("{}", audit_text(&rows));
    }
    Ok(())
}
