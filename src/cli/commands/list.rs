//! `notevault list`: list or search records.

use crate::cli::output;
use crate::cli::{data_dir, unlock_vault, Cli};
use crate::config::Settings;
use crate::errors::Result;

/// Execute the `list` command.
pub fn execute(cli: &Cli, query: Option<&str>) -> Result<()> {
    let settings = Settings::load(&data_dir(cli)?)?;
    let store = unlock_vault(cli, &settings)?;

    let records = store.search(query.unwrap_or_default())?;
    output::print_records_table(&records);

    Ok(())
}
