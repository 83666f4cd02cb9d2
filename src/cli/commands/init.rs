//! `notevault init`: create a new vault and set its PIN.

use std::fs;

use crate::cli::output;
use crate::cli::{data_dir, prompt_new_pin, vault_store, Cli};
use crate::config::Settings;
use crate::errors::{NoteVaultError, Result};

/// Execute the `init` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let dir = data_dir(cli)?;

    // 1. Create the data directory if it doesn't exist.
    if !dir.exists() {
        fs::create_dir_all(&dir)?;
        output::info(&format!("Created data directory: {}", dir.display()));
    }

    // 2. Refuse to re-initialize an existing vault.
    let settings = Settings::load(&dir)?;
    let mut store = vault_store(cli, &settings)?;
    if store.has_pin()? {
        output::tip("Use `notevault add` to add records to the existing vault.");
        return Err(NoteVaultError::PinAlreadyConfigured);
    }

    // 3. Choose the PIN and write the empty vault.
    let pin = prompt_new_pin()?;
    store.setup_pin(&pin)?;
    store.logout();

    output::success(&format!("Vault created at {}", dir.display()));
    output::tip("Run `notevault add <TITLE>` to add a record.");
    output::tip("Run `notevault list` to see all records.");

    Ok(())
}
