//! `notevault add`: create a record.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::cli::output;
use crate::cli::{auto_sync, data_dir, unlock_vault, Cli, RecordFields};
use crate::config::Settings;
use crate::errors::{NoteVaultError, Result};
use crate::vault::{Category, RecordDraft};

/// Execute the `add` command.
pub fn execute(cli: &Cli, title: &str, mut fields: RecordFields) -> Result<()> {
    let settings = Settings::load(&data_dir(cli)?)?;

    if fields.category == Some(Category::Credential) && fields.secret.is_none() {
        fields.secret = Some(prompt_secret(title)?);
    } else if fields.secret.is_some() {
        output::warning("Secret provided on command line — it may appear in shell history.");
    }

    let draft = fields.apply_to(RecordDraft::new(title));
    let mut store = unlock_vault(cli, &settings)?;
    let record = store.add_or_update_record(draft)?;
    output::success(&format!(
        "Added '{}' ({}) with id {}",
        record.title,
        record.category(),
        record.id
    ));

    auto_sync(cli, &settings, Arc::new(RwLock::new(store)))
}

fn prompt_secret(title: &str) -> Result<String> {
    dialoguer::Password::new()
        .with_prompt(format!("Secret for {title}"))
        .allow_empty_password(true)
        .interact()
        .map_err(|e| NoteVaultError::CommandFailed(format!("input prompt: {e}")))
}
