//! Versioned vault blob envelope and the stored PIN verifier.
//!
//! A vault blob (local file and remote object alike) has this layout:
//!
//! ```text
//! [NVLT: 4 bytes][version: 1 byte][nonce: 12 bytes][AES-256-GCM ciphertext + tag]
//! ```
//!
//! - **Magic** (`NVLT`): identifies the bytes as a NoteVault blob.
//! - **Version**: envelope version (currently `1`).  Anything else is
//!   rejected rather than guessed at, so a future cipher change cannot be
//!   silently misread.
//! - The rest is `seal(JSON(VaultSnapshot), key)`.

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::snapshot::VaultSnapshot;
use crate::crypto::kdf::Argon2Params;
use crate::crypto::keys::{VaultKey, VerificationToken};
use crate::crypto::{open, seal};
use crate::errors::{NoteVaultError, Result};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic bytes at the start of every vault blob.
const MAGIC: &[u8; 4] = b"NVLT";

/// Current envelope version.
pub const CURRENT_VERSION: u8 = 1;

/// Fixed-size prefix: 4 (magic) + 1 (version).
const PREFIX_LEN: usize = 5;

/// Current verifier record version.
pub const VERIFIER_VERSION: u8 = 1;

// ---------------------------------------------------------------------------
// Vault blob
// ---------------------------------------------------------------------------

/// Serialize and seal a snapshot into a versioned blob.
pub fn encode_blob(snapshot: &VaultSnapshot, key: &VaultKey) -> Result<Vec<u8>> {
    let plaintext = Zeroizing::new(
        serde_json::to_vec(snapshot)
            .map_err(|e| NoteVaultError::SerializationError(format!("snapshot: {e}")))?,
    );

    let sealed = seal(&plaintext, key)?;

    let mut buf = Vec::with_capacity(PREFIX_LEN + sealed.len());
    buf.extend_from_slice(MAGIC);
    buf.push(CURRENT_VERSION);
    buf.extend_from_slice(&sealed);
    Ok(buf)
}

/// Check the envelope, open the sealed payload and parse the snapshot.
///
/// A wrong key or any tampering yields `AuthenticationFailed`; a bad
/// envelope yields `InvalidVaultFormat`.
pub fn decode_blob(blob: &[u8], key: &VaultKey) -> Result<VaultSnapshot> {
    let sealed = split_envelope(blob)?;

    let plaintext = Zeroizing::new(open(sealed, key)?);

    serde_json::from_slice(&plaintext)
        .map_err(|e| NoteVaultError::InvalidVaultFormat(format!("snapshot JSON: {e}")))
}

/// Return the sealed part of a blob after validating magic and version.
fn split_envelope(blob: &[u8]) -> Result<&[u8]> {
    if blob.len() < PREFIX_LEN {
        return Err(NoteVaultError::InvalidVaultFormat(
            "blob too small to be a vault".into(),
        ));
    }

    if &blob[0..4] != MAGIC {
        return Err(NoteVaultError::InvalidVaultFormat(
            "missing NVLT magic bytes".into(),
        ));
    }

    let version = blob[4];
    if version != CURRENT_VERSION {
        return Err(NoteVaultError::InvalidVaultFormat(format!(
            "unsupported version {version}, expected {CURRENT_VERSION}"
        )));
    }

    Ok(&blob[PREFIX_LEN..])
}

// ---------------------------------------------------------------------------
// PIN verifier
// ---------------------------------------------------------------------------

/// Argon2 parameters stored with the verifier so the exact same KDF
/// settings are used when authenticating later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredArgon2Params {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl From<Argon2Params> for StoredArgon2Params {
    fn from(p: Argon2Params) -> Self {
        Self {
            memory_kib: p.memory_kib,
            iterations: p.iterations,
            parallelism: p.parallelism,
        }
    }
}

impl From<StoredArgon2Params> for Argon2Params {
    fn from(p: StoredArgon2Params) -> Self {
        Self {
            memory_kib: p.memory_kib,
            iterations: p.iterations,
            parallelism: p.parallelism,
        }
    }
}

/// What is persisted to check a PIN: never the PIN, never the vault key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifierRecord {
    pub version: u8,

    /// KDF cost used when the PIN was set up.
    pub kdf: StoredArgon2Params,

    /// The verification token (base64 in JSON).
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub token: Vec<u8>,
}

impl VerifierRecord {
    pub fn new(token: &VerificationToken, params: Argon2Params) -> Self {
        Self {
            version: VERIFIER_VERSION,
            kdf: params.into(),
            token: token.as_bytes().to_vec(),
        }
    }

    /// Validate the version and rebuild the token.
    pub fn token(&self) -> Result<VerificationToken> {
        if self.version != VERIFIER_VERSION {
            return Err(NoteVaultError::InvalidVaultFormat(format!(
                "unsupported verifier version {}, expected {VERIFIER_VERSION}",
                self.version
            )));
        }
        VerificationToken::from_slice(&self.token)
    }
}

// ---------------------------------------------------------------------------
// Serde helpers for base64-encoded Vec<u8> fields
// ---------------------------------------------------------------------------

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

pub(crate) fn base64_encode<S>(data: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    let encoded = BASE64.encode(data);
    serializer.serialize_str(&encoded)
}

pub(crate) fn base64_decode<'de, D>(deserializer: D) -> std::result::Result<Vec<u8>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    BASE64.decode(&s).map_err(serde::de::Error::custom)
}
