//! `list` command: print the purchase catalog.

use bundlevault::report::catalog_text;

use super::common::{self, GlobalArgs};
use crate::error::CliError;

/// Run the list command.
pub fn run(globals: &GlobalArgs) -> Result<(), CliError> {
    let config = globals.load_config()?;
    let vault = common::connect(globals, &config, config.settings())?;
    let catalog = common::fetch_catalog(&vault)?;

    println!("{}", catalog_text(&catalog));
    Ok(())
}
