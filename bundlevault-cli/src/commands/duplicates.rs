//! `duplicates` command: show bundles bought more than once.

use bundlevault::audit::duplicate_groups;
use bundlevault::report::duplicates_text;

use super::common::{self, GlobalArgs};
use crate::error::CliError;

/// Run the duplicates command.
pub fn run(globals: &GlobalArgs) -> Result<(), CliError> {
    let config = globals.load_config()?;
    let vault = common::connect(globals, &config, config.settings())?;
    let catalog = common::fetch_catalog(&vault)?;

    println!("{}", duplicates_text(&duplicate_groups(&catalog)));
    Ok(())
}
