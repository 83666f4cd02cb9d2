//! Key material derived from a PIN, and the HKDF-SHA256 step that splits it.
//!
//! One Argon2id root key is expanded twice under different `info` labels:
//! - the **vault key** that seals the snapshot, and
//! - the **verification token** stored at rest to check the PIN.
//!
//! HKDF outputs under distinct labels are independent, so the token that
//! sits on disk does not let anyone compute the vault key.

use hkdf::Hkdf;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::errors::{NoteVaultError, Result};

/// Length of derived keys and tokens (256 bits).
pub const KEY_LEN: usize = 32;

const VAULT_KEY_INFO: &[u8] = b"notevault-vault-key:v1";
const VERIFIER_INFO: &[u8] = b"notevault-pin-verifier:v1";

/// Expand the vault encryption key from the Argon2id root.
pub fn derive_vault_key(root: &[u8]) -> Result<VaultKey> {
    let mut okm = hkdf_derive(root, VAULT_KEY_INFO)?;
    let key = VaultKey::new(okm);
    okm.zeroize();
    Ok(key)
}

/// Expand the at-rest verification token from the Argon2id root.
pub fn derive_verification_token(root: &[u8]) -> Result<VerificationToken> {
    hkdf_derive(root, VERIFIER_INFO).map(VerificationToken)
}

/// The root already came out of Argon2id, so it is used directly as IKM
/// with an all-zero HKDF salt.
fn hkdf_derive(ikm: &[u8], info: &[u8]) -> Result<[u8; KEY_LEN]> {
    let hk = Hkdf::<Sha256>::new(None, ikm);

    let mut okm = [0u8; KEY_LEN];
    hk.expand(info, &mut okm)
        .map_err(|e| NoteVaultError::KeyDerivationFailed(format!("HKDF expand failed: {e}")))?;

    Ok(okm)
}

/// The symmetric key that seals the vault snapshot.
///
/// Lives only while the vault is unlocked and zeroes its memory on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct VaultKey {
    bytes: [u8; KEY_LEN],
}

impl VaultKey {
    /// Wrap raw key bytes.
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Access the raw key bytes (to hand to the cipher).
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

impl std::fmt::Debug for VaultKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("VaultKey([REDACTED])")
    }
}

/// One-way PIN check value, safe to persist.
#[derive(Clone)]
pub struct VerificationToken([u8; KEY_LEN]);

impl VerificationToken {
    /// Rebuild a token loaded from storage.  Fails if the length is wrong.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; KEY_LEN] = bytes.try_into().map_err(|_| {
            NoteVaultError::InvalidVaultFormat(format!(
                "verification token must be {KEY_LEN} bytes (got {})",
                bytes.len()
            ))
        })?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    /// Constant-time equality, so a wrong PIN reveals nothing about how
    /// many leading bytes matched.
    pub fn matches(&self, other: &VerificationToken) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl std::fmt::Debug for VerificationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("VerificationToken([REDACTED])")
    }
}
