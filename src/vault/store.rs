//! PIN-gated vault operations.
//!
//! `VaultStore` owns the in-memory snapshot while unlocked and writes the
//! whole snapshot through the cipher to its `VaultPersistence` after every
//! mutation.  Mutations work on a copy and only replace the in-memory
//! snapshot once the write has succeeded, so a failed write never leaves
//! memory and disk disagreeing.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::crypto::kdf::KeyDerivation;
use crate::crypto::keys::{VaultKey, VerificationToken};
use crate::crypto::pin::Pin;
use crate::errors::{NoteVaultError, Result};

use super::format::{self, VerifierRecord};
use super::persistence::VaultPersistence;
use super::record::{Record, RecordDraft};
use super::snapshot::VaultSnapshot;

/// Where the store is in its lock/unlock lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultState {
    LoggedOut,
    /// Verifying a PIN and loading the snapshot.
    Authenticating,
    Authenticated,
}

/// Key and plaintext held only while unlocked.
struct Session {
    key: VaultKey,
    snapshot: VaultSnapshot,
}

impl Drop for Session {
    fn drop(&mut self) {
        self.snapshot.wipe();
    }
}

/// The vault handle.  Construct one per application with the storage
/// and key derivation it should use.
pub struct VaultStore {
    storage: Arc<dyn VaultPersistence>,
    kdf: KeyDerivation,
    state: VaultState,
    session: Option<Session>,
}

impl VaultStore {
    pub fn new(storage: Arc<dyn VaultPersistence>, kdf: KeyDerivation) -> Self {
        Self {
            storage,
            kdf,
            state: VaultState::LoggedOut,
            session: None,
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    pub fn state(&self) -> VaultState {
        self.state
    }

    pub fn is_authenticated(&self) -> bool {
        self.state == VaultState::Authenticated
    }

    /// Whether a PIN has been set up for this vault.
    pub fn has_pin(&self) -> Result<bool> {
        Ok(self.storage.load_verifier()?.is_some())
    }

    /// Configure the PIN of a fresh vault and unlock it with an empty
    /// snapshot.
    pub fn setup_pin(&mut self, pin: &str) -> Result<()> {
        let pin = Pin::parse(pin)?;

        if self.is_authenticated() || self.storage.load_verifier()?.is_some() {
            return Err(NoteVaultError::PinAlreadyConfigured);
        }

        let (key, token) = self.kdf.derive_credentials(&pin)?;
        let snapshot = VaultSnapshot::default();

        // Blob first: if the verifier write fails, setup can simply be
        // retried and overwrites the orphaned blob.
        Self::persist(self.storage.as_ref(), &snapshot, &key)?;
        self.storage
            .store_verifier(&VerifierRecord::new(&token, self.kdf.params()))?;

        self.session = Some(Session { key, snapshot });
        self.state = VaultState::Authenticated;
        info!("vault PIN configured");
        Ok(())
    }

    /// Check the PIN and, on success, load and decrypt the snapshot.
    ///
    /// A wrong PIN and an unconfigured vault both return
    /// `AuthenticationFailed` after the same amount of KDF work.
    pub fn authenticate(&mut self, pin: &str) -> Result<()> {
        let pin = Pin::parse(pin)?;

        // One session at a time: re-authenticating replaces the old one.
        self.session = None;
        self.state = VaultState::Authenticating;

        match self.open_session(&pin) {
            Ok(session) => {
                debug!(records = session.snapshot.records.len(), "snapshot loaded");
                self.session = Some(session);
                self.state = VaultState::Authenticated;
                info!("vault unlocked");
                Ok(())
            }
            Err(e) => {
                self.state = VaultState::LoggedOut;
                warn!(error = %e, "vault unlock failed");
                Err(e)
            }
        }
    }

    fn open_session(&self, pin: &Pin) -> Result<Session> {
        let Some(verifier) = self.storage.load_verifier()? else {
            // Spend the same derivation cost as a real check.
            let (_key, token) = self.kdf.derive_credentials(pin)?;
            let decoy = VerificationToken::from_slice(&[0u8; 32])?;
            let _ = token.matches(&decoy);
            return Err(NoteVaultError::AuthenticationFailed);
        };

        let stored = verifier.token()?;
        let kdf = self.kdf.with_params(verifier.kdf.into());
        let (key, token) = kdf.derive_credentials(pin)?;

        if !token.matches(&stored) {
            return Err(NoteVaultError::AuthenticationFailed);
        }

        let snapshot = match self.storage.load_vault()? {
            None => VaultSnapshot::default(),
            Some(blob) => format::decode_blob(&blob, &key).map_err(|e| match e {
                // The PIN checked out, so a failed open means the blob was
                // damaged or replaced, not that the user typed it wrong.
                NoteVaultError::AuthenticationFailed => NoteVaultError::PersistenceError(
                    "vault data failed its integrity check".into(),
                ),
                other => other,
            })?,
        };

        Ok(Session { key, snapshot })
    }

    /// Drop the key and the plaintext.  Safe to call when already locked.
    pub fn logout(&mut self) {
        if self.session.take().is_some() {
            info!("vault locked");
        }
        self.state = VaultState::LoggedOut;
    }

    // ------------------------------------------------------------------
    // Record operations
    // ------------------------------------------------------------------

    /// Create a record (draft without id) or merge a partial update onto
    /// an existing one.  Returns the stored record.
    ///
    /// The change is durable when this returns `Ok`.
    pub fn add_or_update_record(&mut self, draft: RecordDraft) -> Result<Record> {
        let session = self.session()?;
        let now = Utc::now();
        let mut next = session.snapshot.clone();

        let index = match &draft.id {
            Some(id) => {
                let index = next
                    .position(id)
                    .ok_or_else(|| NoteVaultError::RecordNotFound(id.clone()))?;
                next.records[index].apply(&draft, now);
                index
            }
            None => {
                let id = generate_id(&next);
                next.records.push(Record::from_draft(id, &draft, now));
                next.records.len() - 1
            }
        };
        let stored = next.records[index].clone();

        self.commit(next)?;
        debug!(id = %stored.id, created = draft.id.is_none(), "record saved");
        Ok(stored)
    }

    /// Remove a record.  Returns `false` (and writes nothing) when no
    /// record has that id.
    pub fn delete_record(&mut self, id: &str) -> Result<bool> {
        let session = self.session()?;
        let Some(index) = session.snapshot.position(id) else {
            return Ok(false);
        };

        let mut next = session.snapshot.clone();
        next.records.remove(index);

        self.commit(next)?;
        debug!(id, "record deleted");
        Ok(true)
    }

    /// Case-insensitive search over title, username, url and content.
    pub fn search(&self, query: &str) -> Result<Vec<Record>> {
        let session = self.session()?;
        Ok(session.snapshot.search(query).into_iter().cloned().collect())
    }

    /// All records in stored order.
    pub fn records(&self) -> Result<&[Record]> {
        Ok(&self.session()?.snapshot.records)
    }

    pub fn get_record(&self, id: &str) -> Result<Option<&Record>> {
        Ok(self.session()?.snapshot.get(id))
    }

    /// `lastSync` recorded in the current snapshot.
    pub fn last_sync(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self.session()?.snapshot.last_sync)
    }

    // ------------------------------------------------------------------
    // Sync hooks
    // ------------------------------------------------------------------

    /// Seal a copy of the snapshot stamped with `last_sync = stamp`,
    /// without touching the live one.
    pub(crate) fn seal_for_sync(&self, stamp: DateTime<Utc>) -> Result<Vec<u8>> {
        let session = self.session()?;
        let mut copy = session.snapshot.clone();
        copy.last_sync = Some(stamp);
        format::encode_blob(&copy, &session.key)
    }

    /// Record a completed push.
    pub(crate) fn commit_sync(&mut self, stamp: DateTime<Utc>) -> Result<()> {
        let mut next = self.session()?.snapshot.clone();
        next.last_sync = Some(stamp);
        self.commit(next)
    }

    /// Replace the snapshot wholesale with a downloaded blob.
    ///
    /// A blob sealed under another key fails with `AuthenticationFailed`
    /// and leaves everything untouched.  Returns the new record count.
    pub(crate) fn replace_from_blob(&mut self, blob: &[u8]) -> Result<usize> {
        let session = self.session()?;
        let incoming = format::decode_blob(blob, &session.key)?;

        self.storage.store_vault(blob)?;

        let count = incoming.records.len();
        if let Some(session) = self.session.as_mut() {
            let mut old = std::mem::replace(&mut session.snapshot, incoming);
            old.wipe();
        }
        Ok(count)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn session(&self) -> Result<&Session> {
        match (&self.state, &self.session) {
            (VaultState::Authenticated, Some(session)) => Ok(session),
            _ => Err(NoteVaultError::NotAuthenticated),
        }
    }

    /// Persist `next` and, only if that succeeds, make it the live snapshot.
    fn commit(&mut self, next: VaultSnapshot) -> Result<()> {
        let session = self.session.as_mut().ok_or(NoteVaultError::NotAuthenticated)?;

        Self::persist(self.storage.as_ref(), &next, &session.key)?;

        let mut old = std::mem::replace(&mut session.snapshot, next);
        old.wipe();
        Ok(())
    }

    fn persist(storage: &dyn VaultPersistence, snapshot: &VaultSnapshot, key: &VaultKey) -> Result<()> {
        let blob = format::encode_blob(snapshot, key).map_err(|e| match e {
            NoteVaultError::PersistenceError(_) => e,
            other => NoteVaultError::PersistenceError(other.to_string()),
        })?;
        storage.store_vault(&blob)
    }
}

/// Time-based prefix plus random suffix, both base36, e.g. `lx3k9a1b2c`.
fn generate_id(snapshot: &VaultSnapshot) -> String {
    loop {
        let millis = u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default();
        let suffix: u32 = rand::random::<u32>() % 36u32.pow(5);
        let id = format!("{}{:0>5}", to_base36(millis), to_base36(u64::from(suffix)));
        if snapshot.position(&id).is_none() {
            return id;
        }
    }
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".into();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}
