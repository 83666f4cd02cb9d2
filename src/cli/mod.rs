//! CLI module: clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use parking_lot::RwLock;
use zeroize::Zeroizing;

use crate::config::Settings;
use crate::crypto::Pin;
use crate::errors::{NoteVaultError, Result};
use crate::sync::{FolderRemote, SyncConfigFile, SyncCoordinator};
use crate::vault::{Category, FileStorage, RecordDraft, VaultStore};

/// Environment variable checked for the PIN before prompting.
pub const PIN_ENV: &str = "NOTEVAULT_PIN";

/// NoteVault CLI: PIN-protected personal vault with remote backup.
#[derive(Parser)]
#[command(
    name = "notevault",
    about = "PIN-protected vault for notes, logins and cards",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Data directory (default: .notevault)
    #[arg(long, default_value = ".notevault", global = true)]
    pub data_dir: String,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Create a new vault and choose its PIN
    Init,

    /// Add a record
    Add {
        /// Record title
        title: String,

        #[command(flatten)]
        fields: RecordFields,
    },

    /// Change fields of an existing record
    Edit {
        /// Record id (see `notevault list`)
        id: String,

        /// New title
        #[arg(long)]
        title: Option<String>,

        #[command(flatten)]
        fields: RecordFields,
    },

    /// List records, optionally filtered by a search query
    List {
        /// Case-insensitive match on title, username, url and content
        query: Option<String>,
    },

    /// Show one record
    Show {
        /// Record id
        id: String,

        /// Print secret fields in clear text
        #[arg(long)]
        reveal: bool,
    },

    /// Delete a record
    Delete {
        /// Record id
        id: String,

        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Back up and restore through the remote store
    Sync {
        #[command(subcommand)]
        action: SyncAction,
    },
}

/// Record fields shared by `add` and `edit`.  Anything left out is kept.
#[derive(clap::Args, Clone, Default)]
pub struct RecordFields {
    /// credential, card, document or other
    #[arg(short, long)]
    pub category: Option<Category>,

    /// Free-form notes
    #[arg(long)]
    pub content: Option<String>,

    #[arg(long)]
    pub username: Option<String>,

    /// Password or other secret (omit to be prompted, credentials only)
    #[arg(long)]
    pub secret: Option<String>,

    #[arg(long)]
    pub url: Option<String>,

    #[arg(long)]
    pub card_number: Option<String>,

    /// Card expiry, e.g. 09/27
    #[arg(long)]
    pub expiry: Option<String>,

    #[arg(long)]
    pub cvv: Option<String>,

    /// Name on the card
    #[arg(long)]
    pub holder: Option<String>,
}

impl RecordFields {
    /// Copy the given fields onto `draft`.
    pub fn apply_to(self, mut draft: RecordDraft) -> RecordDraft {
        draft.category = self.category.or(draft.category);
        draft.content = self.content.or(draft.content);
        draft.username = self.username.or(draft.username);
        draft.secret = self.secret.or(draft.secret);
        draft.url = self.url.or(draft.url);
        draft.card_number = self.card_number.or(draft.card_number);
        draft.expiry = self.expiry.or(draft.expiry);
        draft.cvv = self.cvv.or(draft.cvv);
        draft.holder = self.holder.or(draft.holder);
        draft
    }
}

/// Sync subcommands.
#[derive(clap::Subcommand)]
pub enum SyncAction {
    /// Sign in to the remote store and enable sync
    Connect,

    /// Sign out and forget the sync configuration
    Disconnect,

    /// Upload the vault, overwriting the remote backup
    Push,

    /// Replace the local vault with the remote backup
    Pull,

    /// Show sync state
    Status,

    /// Turn automatic push after every change on or off
    Auto {
        #[arg(value_enum)]
        state: Toggle,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Get the PIN, trying `NOTEVAULT_PIN` first and then an interactive prompt.
///
/// Returns `Zeroizing<String>` so the PIN is wiped from memory on drop.
pub fn prompt_pin() -> Result<Zeroizing<String>> {
    if let Some(pin) = pin_from_env() {
        return Ok(pin);
    }

    let pin = dialoguer::Password::new()
        .with_prompt("Enter PIN")
        .interact()
        .map_err(|e| NoteVaultError::CommandFailed(format!("PIN prompt: {e}")))?;
    Ok(Zeroizing::new(pin))
}

/// Prompt for a new PIN twice (used during `init`).
///
/// Also respects `NOTEVAULT_PIN` for scripted usage.  The format is
/// checked here so a typo is caught before the slow key derivation.
pub fn prompt_new_pin() -> Result<Zeroizing<String>> {
    if let Some(pin) = pin_from_env() {
        Pin::parse(&pin)?;
        return Ok(pin);
    }

    loop {
        let pin = Zeroizing::new(
            dialoguer::Password::new()
                .with_prompt("Choose a 4-digit PIN")
                .interact()
                .map_err(|e| NoteVaultError::CommandFailed(format!("PIN prompt: {e}")))?,
        );

        if let Err(e) = Pin::parse(&pin) {
            output::warning(&format!("{e}. Try again."));
            continue;
        }

        let confirm = Zeroizing::new(
            dialoguer::Password::new()
                .with_prompt("Confirm PIN")
                .interact()
                .map_err(|e| NoteVaultError::CommandFailed(format!("PIN prompt: {e}")))?,
        );

        if *pin != *confirm {
            return Err(NoteVaultError::PinMismatch);
        }
        return Ok(pin);
    }
}

fn pin_from_env() -> Option<Zeroizing<String>> {
    std::env::var(PIN_ENV)
        .ok()
        .filter(|pin| !pin.is_empty())
        .map(Zeroizing::new)
}

/// Absolute path of the data directory from the CLI arguments.
pub fn data_dir(cli: &Cli) -> Result<PathBuf> {
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(&cli.data_dir))
}

/// A locked `VaultStore` over the data directory.
pub fn vault_store(cli: &Cli, settings: &Settings) -> Result<VaultStore> {
    let storage = FileStorage::new(data_dir(cli)?);
    Ok(VaultStore::new(Arc::new(storage), settings.key_derivation()))
}

/// Prompt for the PIN and return an unlocked store.
///
/// A vault without a PIN is reported up front rather than as a failed
/// unlock, since the CLI can see the data directory anyway.
pub fn unlock_vault(cli: &Cli, settings: &Settings) -> Result<VaultStore> {
    let mut store = vault_store(cli, settings)?;
    if !store.has_pin()? {
        output::tip("Run `notevault init` to create a vault.");
        return Err(NoteVaultError::CommandFailed(format!(
            "no vault found in {}",
            data_dir(cli)?.display()
        )));
    }

    let pin = prompt_pin()?;
    store.authenticate(&pin)?;
    Ok(store)
}

/// Build a coordinator over the configured folder remote.
pub fn sync_coordinator(
    cli: &Cli,
    settings: &Settings,
    vault: Arc<RwLock<VaultStore>>,
) -> Result<SyncCoordinator<FolderRemote>> {
    let dir = data_dir(cli)?;
    let Some(remote_dir) = settings.remote_path(&dir) else {
        return Err(NoteVaultError::ConfigError(format!(
            "no remote_dir set in {}",
            dir.join(Settings::FILE_NAME).display()
        )));
    };

    let remote = FolderRemote::new(remote_dir, settings.remote_account.clone());
    SyncCoordinator::new(
        vault,
        remote,
        SyncConfigFile::in_dir(&dir),
        settings.sync_options(),
    )
}

/// Run a future to completion on a fresh tokio runtime.
pub fn block_on<F: Future>(fut: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    Ok(runtime.block_on(fut))
}

/// Push after a local change when auto-sync is on.
///
/// The change is already saved locally, so a failed push is only a warning.
pub fn auto_sync(cli: &Cli, settings: &Settings, vault: Arc<RwLock<VaultStore>>) -> Result<()> {
    let config = SyncConfigFile::in_dir(&data_dir(cli)?).load()?;
    if !config.is_some_and(|c| c.enabled && c.auto_sync) {
        return Ok(());
    }

    let coordinator = match sync_coordinator(cli, settings, vault) {
        Ok(c) => c,
        Err(e) => {
            output::warning(&format!("Auto-sync skipped: {e}"));
            return Ok(());
        }
    };

    match block_on(coordinator.auto_push())? {
        Ok(Some(_)) => output::info("Backed up to remote."),
        Ok(None) => {}
        Err(e) => output::warning(&format!("Auto-sync failed: {e}")),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_add_with_fields() {
        let cli = Cli::try_parse_from([
            "notevault",
            "add",
            "Bank",
            "--category",
            "credential",
            "--username",
            "alice",
        ])
        .unwrap();

        match cli.command {
            Commands::Add { title, fields } => {
                assert_eq!(title, "Bank");
                assert_eq!(fields.category, Some(Category::Credential));
                assert_eq!(fields.username.as_deref(), Some("alice"));
                assert!(fields.secret.is_none());
            }
            _ => panic!("expected add"),
        }
        assert_eq!(cli.data_dir, ".notevault");
    }

    #[test]
    fn parses_sync_auto() {
        let cli = Cli::try_parse_from(["notevault", "--data-dir", "d", "sync", "auto", "on"])
            .unwrap();
        assert_eq!(cli.data_dir, "d");
        assert!(matches!(
            cli.command,
            Commands::Sync {
                action: SyncAction::Auto { state: Toggle::On }
            }
        ));
    }

    #[test]
    fn rejects_unknown_category() {
        assert!(Cli::try_parse_from(["notevault", "add", "x", "--category", "boat"]).is_err());
    }

    #[test]
    fn fields_fill_only_what_was_given() {
        let fields = RecordFields {
            url: Some("https://bank.example".into()),
            ..Default::default()
        };
        let draft = fields.apply_to(RecordDraft::update("abc").content("keep"));
        assert_eq!(draft.id.as_deref(), Some("abc"));
        assert_eq!(draft.url.as_deref(), Some("https://bank.example"));
        assert_eq!(draft.content.as_deref(), Some("keep"));
        assert!(draft.title.is_none());
    }
}
