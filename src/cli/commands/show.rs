//! `notevault show`: print one record.

use crate::cli::output;
use crate::cli::{data_dir, unlock_vault, Cli};
use crate::config::Settings;
use crate::errors::{NoteVaultError, Result};

/// Execute the `show` command.
pub fn execute(cli: &Cli, id: &str, reveal: bool) -> Result<()> {
    let settings = Settings::load(&data_dir(cli)?)?;
    let store = unlock_vault(cli, &settings)?;

    let record = store
        .get_record(id)?
        .ok_or_else(|| NoteVaultError::RecordNotFound(id.to_string()))?;
    output::print_record(record, reveal);

    if !reveal {
        output::tip("Pass --reveal to show secret fields.");
    }
    Ok(())
}
