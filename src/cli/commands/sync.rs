//! `notevault sync`: connect to the remote store, push, pull, status.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::cli::output;
use crate::cli::{
    block_on, data_dir, sync_coordinator, unlock_vault, vault_store, Cli, SyncAction, Toggle,
};
use crate::config::Settings;
use crate::errors::Result;

/// Execute a `sync` subcommand.
pub fn execute(cli: &Cli, action: &SyncAction) -> Result<()> {
    let settings = Settings::load(&data_dir(cli)?)?;

    // Only push and pull need the vault unlocked.
    let store = match action {
        SyncAction::Push | SyncAction::Pull => unlock_vault(cli, &settings)?,
        _ => vault_store(cli, &settings)?,
    };
    let coordinator = sync_coordinator(cli, &settings, Arc::new(RwLock::new(store)))?;

    match action {
        SyncAction::Connect => {
            let config = block_on(coordinator.enable_sync())??;
            output::success(&format!("Sync enabled for {}", config.account_identity));
            output::tip("Run `notevault sync push` to upload your vault.");
        }
        SyncAction::Disconnect => {
            block_on(coordinator.disable_sync())??;
            output::success("Sync disabled.");
        }
        SyncAction::Push => {
            let at = block_on(coordinator.push())??;
            output::success(&format!(
                "Vault uploaded at {}",
                at.format("%Y-%m-%d %H:%M:%S")
            ));
        }
        SyncAction::Pull => {
            let outcome = block_on(coordinator.pull())??;
            output::success(&format!(
                "Restored {} records from remote backup",
                outcome.record_count
            ));
        }
        SyncAction::Status => {
            let auto = coordinator.config().is_some_and(|c| c.auto_sync);
            output::print_sync_status(&coordinator.status(), auto);
        }
        SyncAction::Auto { state } => {
            let config = coordinator.configure(*state == Toggle::On)?;
            let word = if config.auto_sync { "on" } else { "off" };
            output::success(&format!("Auto-sync turned {word}."));
        }
    }

    Ok(())
}
