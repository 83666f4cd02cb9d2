//! `notevault edit`: change fields of a record.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::cli::output;
use crate::cli::{auto_sync, data_dir, unlock_vault, Cli, RecordFields};
use crate::config::Settings;
use crate::errors::Result;
use crate::vault::RecordDraft;

/// Execute the `edit` command.  Only the given fields change.
pub fn execute(cli: &Cli, id: &str, title: Option<&str>, fields: RecordFields) -> Result<()> {
    let settings = Settings::load(&data_dir(cli)?)?;

    let mut draft = RecordDraft::update(id);
    if let Some(title) = title {
        draft = draft.title(title);
    }
    let draft = fields.apply_to(draft);

    let mut store = unlock_vault(cli, &settings)?;
    let record = store.add_or_update_record(draft)?;
    output::success(&format!("Updated '{}'", record.title));

    auto_sync(cli, &settings, Arc::new(RwLock::new(store)))
}
