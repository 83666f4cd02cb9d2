use thiserror::Error;

/// All errors that can occur in NoteVault.
#[derive(Debug, Error)]
pub enum NoteVaultError {
    // --- PIN / session errors ---
    #[error("Invalid PIN — must be exactly 4 digits")]
    InvalidPinFormat,

    #[error("A PIN is already configured for this vault")]
    PinAlreadyConfigured,

    #[error("Vault is locked — enter your PIN first")]
    NotAuthenticated,

    #[error("Authentication failed — wrong PIN or data encrypted under a different key")]
    AuthenticationFailed,

    #[error("PINs do not match")]
    PinMismatch,

    // --- Crypto errors ---
    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    // --- Vault errors ---
    #[error("Persistence error: {0}")]
    PersistenceError(String),

    #[error("Invalid vault format: {0}")]
    InvalidVaultFormat(String),

    #[error("Record '{0}' not found")]
    RecordNotFound(String),

    // --- Remote sync errors ---
    #[error("Remote authentication failed: {0}")]
    RemoteAuthFailed(String),

    #[error("Remote object not found: {0}")]
    RemoteObjectNotFound(String),

    #[error("Remote I/O error: {0}")]
    RemoteIoError(String),

    #[error("A sync operation is already in progress")]
    SyncAlreadyInProgress,

    #[error("Sync is not enabled — run `notevault sync connect` first")]
    SyncNotEnabled,

    // --- Config errors ---
    #[error("Config file error: {0}")]
    ConfigError(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),
}

impl NoteVaultError {
    /// Returns `true` for failures that originate on the remote side
    /// (connectivity, provider auth, missing object).
    ///
    /// A key mismatch on a downloaded blob is *not* remote: it surfaces as
    /// `AuthenticationFailed` so the UI can tell the two apart.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::RemoteAuthFailed(_) | Self::RemoteObjectNotFound(_) | Self::RemoteIoError(_)
        )
    }
}

/// Convenience type alias for NoteVault results.
pub type Result<T> = std::result::Result<T, NoteVaultError>;
