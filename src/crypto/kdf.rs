//! PIN-based key derivation using Argon2id.
//!
//! A 4-digit PIN has only 10 000 values, so no KDF makes it strong on its
//! own.  Argon2id raises the per-guess cost; the fixed application salt
//! keeps derivation deterministic so the same PIN unlocks the same vault
//! blob on every device.

use argon2::{Algorithm, Argon2, Params, Version};
use zeroize::Zeroizing;

use super::keys::{self, VaultKey, VerificationToken, KEY_LEN};
use super::pin::Pin;
use crate::errors::{NoteVaultError, Result};

/// Application-wide salt.  Changing it orphans every existing vault.
pub const SYSTEM_SALT: &[u8] = b"notevault/pin-kdf/2025";

/// Minimum safe memory cost in KiB (8 MB).
const MIN_MEMORY_KIB: u32 = 8_192;

/// Configurable Argon2id parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Argon2Params {
    /// Memory cost in KiB (default: 65 536 = 64 MB).
    pub memory_kib: u32,
    /// Number of iterations (default: 3).
    pub iterations: u32,
    /// Parallelism lanes (default: 4).
    pub parallelism: u32,
}

impl Default for Argon2Params {
    fn default() -> Self {
        Self {
            memory_kib: 65_536,
            iterations: 3,
            parallelism: 4,
        }
    }
}

impl Argon2Params {
    /// Reject dangerously weak settings.
    pub fn validate(&self) -> Result<()> {
        if self.memory_kib < MIN_MEMORY_KIB {
            return Err(NoteVaultError::KeyDerivationFailed(format!(
                "Argon2 memory_kib must be at least {MIN_MEMORY_KIB} (got {})",
                self.memory_kib
            )));
        }
        if self.iterations < 1 {
            return Err(NoteVaultError::KeyDerivationFailed(
                "Argon2 iterations must be at least 1".into(),
            ));
        }
        if self.parallelism < 1 {
            return Err(NoteVaultError::KeyDerivationFailed(
                "Argon2 parallelism must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Turns a PIN into the vault key and the stored verification token.
#[derive(Debug, Clone)]
pub struct KeyDerivation {
    salt: Vec<u8>,
    params: Argon2Params,
}

impl Default for KeyDerivation {
    fn default() -> Self {
        Self::new(Argon2Params::default())
    }
}

impl KeyDerivation {
    /// Derivation with the fixed application salt.
    pub fn new(params: Argon2Params) -> Self {
        Self {
            salt: SYSTEM_SALT.to_vec(),
            params,
        }
    }

    /// Same salt, different cost parameters.
    pub fn with_params(&self, params: Argon2Params) -> Self {
        Self {
            salt: self.salt.clone(),
            params,
        }
    }

    pub fn params(&self) -> Argon2Params {
        self.params
    }

    /// Derive the 32-byte vault encryption key.
    pub fn derive_key(&self, pin: &Pin) -> Result<VaultKey> {
        let root = self.derive_root(pin)?;
        keys::derive_vault_key(&root[..])
    }

    /// Derive the one-way token that is persisted to check the PIN later.
    pub fn derive_verification_token(&self, pin: &Pin) -> Result<VerificationToken> {
        let root = self.derive_root(pin)?;
        keys::derive_verification_token(&root[..])
    }

    /// Both outputs from a single Argon2id run.
    pub fn derive_credentials(&self, pin: &Pin) -> Result<(VaultKey, VerificationToken)> {
        let root = self.derive_root(pin)?;
        let key = keys::derive_vault_key(&root[..])?;
        let token = keys::derive_verification_token(&root[..])?;
        Ok((key, token))
    }

    fn derive_root(&self, pin: &Pin) -> Result<Zeroizing<[u8; KEY_LEN]>> {
        self.params.validate()?;

        let params = Params::new(
            self.params.memory_kib,
            self.params.iterations,
            self.params.parallelism,
            Some(KEY_LEN),
        )
        .map_err(|e| NoteVaultError::KeyDerivationFailed(format!("invalid Argon2 params: {e}")))?;

        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let mut root = Zeroizing::new([0u8; KEY_LEN]);
        argon2
            .hash_password_into(pin.as_bytes(), &self.salt, &mut root[..])
            .map_err(|e| {
                NoteVaultError::KeyDerivationFailed(format!("Argon2id hashing failed: {e}"))
            })?;

        Ok(root)
    }
}
