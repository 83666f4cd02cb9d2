//! Sync configuration, stored next to the vault as plain JSON.
//!
//! Nothing in here is secret, although `remote_object_id` is worth not
//! publishing.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::remote::{AccountIdentity, ObjectHandle};
use crate::errors::{NoteVaultError, Result};
use crate::vault::persistence::write_atomic;

/// Sync settings for this device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncConfig {
    pub enabled: bool,

    #[serde(default)]
    pub auto_sync: bool,

    pub account_identity: AccountIdentity,

    #[serde(default)]
    pub last_sync: Option<DateTime<Utc>>,

    #[serde(default)]
    pub remote_object_id: Option<ObjectHandle>,
}

impl SyncConfig {
    /// Fresh config right after a successful connect.
    pub fn connected(account_identity: AccountIdentity, auto_sync: bool) -> Self {
        Self {
            enabled: true,
            auto_sync,
            account_identity,
            last_sync: None,
            remote_object_id: None,
        }
    }
}

/// Reads and writes `SyncConfig` at a fixed path.
#[derive(Debug, Clone)]
pub struct SyncConfigFile {
    path: PathBuf,
}

impl SyncConfigFile {
    /// File name used inside the data directory.
    pub const FILE_NAME: &'static str = "sync.json";

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data_dir>/sync.json`
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(Self::FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `None` when sync was never enabled (or was disabled).
    pub fn load(&self) -> Result<Option<SyncConfig>> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&contents).map(Some).map_err(|e| {
            NoteVaultError::ConfigError(format!("Failed to parse {}: {e}", self.path.display()))
        })
    }

    pub fn save(&self, config: &SyncConfig) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(config)
            .map_err(|e| NoteVaultError::SerializationError(format!("sync config: {e}")))?;
        write_atomic(&self.path, &bytes)
    }

    /// Delete the stored config.  Missing file is fine.
    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(NoteVaultError::PersistenceError(format!(
                "remove {}: {e}",
                self.path.display()
            ))),
        }
    }
}
