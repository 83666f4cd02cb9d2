use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::crypto::kdf::{Argon2Params, KeyDerivation};
use crate::errors::{NoteVaultError, Result};
use crate::sync::coordinator::{SyncOptions, DEFAULT_OBJECT_NAME};

/// Vault configuration, loaded from `<data_dir>/notevault.toml`.
///
/// Every field has a sensible default so NoteVault works out-of-the-box
/// without any config file at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Argon2 memory cost in KiB for newly configured PINs (default: 64 MB).
    #[serde(default = "default_argon2_memory_kib")]
    pub argon2_memory_kib: u32,

    /// Argon2 iteration count (default: 3).
    #[serde(default = "default_argon2_iterations")]
    pub argon2_iterations: u32,

    /// Argon2 parallelism degree (default: 4).
    #[serde(default = "default_argon2_parallelism")]
    pub argon2_parallelism: u32,

    /// Directory used as the remote store.  Relative paths are resolved
    /// against the data directory.
    #[serde(default)]
    pub remote_dir: Option<String>,

    /// Account name the folder remote reports (defaults to its path).
    #[serde(default)]
    pub remote_account: Option<String>,

    /// Name of the backup object in the remote store.
    #[serde(default = "default_remote_object_name")]
    pub remote_object_name: String,

    /// Per-call timeout for remote operations, in seconds.
    #[serde(default = "default_remote_timeout_secs")]
    pub remote_timeout_secs: u64,

    /// Whether newly enabled sync pushes after every change.
    #[serde(default)]
    pub auto_sync_default: bool,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_argon2_memory_kib() -> u32 {
    65_536 // 64 MB
}

fn default_argon2_iterations() -> u32 {
    3
}

fn default_argon2_parallelism() -> u32 {
    4
}

fn default_remote_object_name() -> String {
    DEFAULT_OBJECT_NAME.to_string()
}

fn default_remote_timeout_secs() -> u64 {
    30
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            argon2_memory_kib: default_argon2_memory_kib(),
            argon2_iterations: default_argon2_iterations(),
            argon2_parallelism: default_argon2_parallelism(),
            remote_dir: None,
            remote_account: None,
            remote_object_name: default_remote_object_name(),
            remote_timeout_secs: default_remote_timeout_secs(),
            auto_sync_default: false,
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the data directory.
    pub const FILE_NAME: &'static str = "notevault.toml";

    /// Load settings from `<data_dir>/notevault.toml`.
    ///
    /// If the file does not exist, sensible defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let config_path = data_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            NoteVaultError::ConfigError(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        Ok(settings)
    }

    /// Convert the Argon2 settings into crypto-layer params.
    pub fn argon2_params(&self) -> Argon2Params {
        Argon2Params {
            memory_kib: self.argon2_memory_kib,
            iterations: self.argon2_iterations,
            parallelism: self.argon2_parallelism,
        }
    }

    pub fn key_derivation(&self) -> KeyDerivation {
        KeyDerivation::new(self.argon2_params())
    }

    /// Coordinator options derived from these settings.
    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            object_name: self.remote_object_name.clone(),
            timeout: Duration::from_secs(self.remote_timeout_secs.max(1)),
            auto_sync_default: self.auto_sync_default,
        }
    }

    /// Resolved remote directory, if one is configured.
    pub fn remote_path(&self, data_dir: &Path) -> Option<PathBuf> {
        self.remote_dir.as_ref().map(|dir| data_dir.join(dir))
    }
}

// ── Tests ────────────────────────────────────────────────────────────
