//! `notevault delete`: remove a record.

use std::sync::Arc;

use dialoguer::Confirm;
use parking_lot::RwLock;

use crate::cli::output;
use crate::cli::{auto_sync, data_dir, unlock_vault, Cli};
use crate::config::Settings;
use crate::errors::{NoteVaultError, Result};

/// Execute the `delete` command.
pub fn execute(cli: &Cli, id: &str, force: bool) -> Result<()> {
    let settings = Settings::load(&data_dir(cli)?)?;
    let mut store = unlock_vault(cli, &settings)?;

    let title = store
        .get_record(id)?
        .map(|r| r.title.clone())
        .ok_or_else(|| NoteVaultError::RecordNotFound(id.to_string()))?;

    // Unless --force is set, ask for confirmation before deleting.
    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete '{title}'?"))
            .default(false)
            .interact()
            .map_err(|e| NoteVaultError::CommandFailed(format!("confirm prompt: {e}")))?;

        if !confirmed {
            output::info("Cancelled.");
            return Ok(());
        }
    }

    store.delete_record(id)?;
    output::success(&format!("Deleted '{title}'"));

    auto_sync(cli, &settings, Arc::new(RwLock::new(store)))
}
