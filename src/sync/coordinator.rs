//! Push/pull orchestration between a `VaultStore` and a remote store.
//!
//! Conflict policy is last-writer-wins on the whole snapshot: `push`
//! always overwrites the remote object and `pull` always overwrites the
//! local snapshot.  Nothing is merged and nothing is retried; callers that
//! want a merge must diff snapshots themselves using `updated_at`.
//!
//! Only one `push`/`pull` runs at a time per coordinator.  The vault lock
//! is never held across a remote call, so local reads and edits proceed
//! while a sync is waiting on the network.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use super::config::{SyncConfig, SyncConfigFile};
use super::remote::{AccountIdentity, ObjectHandle, RemoteSyncClient};
use crate::errors::{NoteVaultError, Result};
use crate::vault::VaultStore;

/// Default name of the remote object.
pub const DEFAULT_OBJECT_NAME: &str = "notevault_backup.nvlt";

/// Knobs the coordinator takes from `Settings`.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Fixed, application-scoped name of the remote object.
    pub object_name: String,
    /// Upper bound on each remote call; elapsing counts as `RemoteIoError`.
    pub timeout: Duration,
    /// `auto_sync` value written when sync is first enabled.
    pub auto_sync_default: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            object_name: DEFAULT_OBJECT_NAME.to_string(),
            timeout: Duration::from_secs(30),
            auto_sync_default: false,
        }
    }
}

/// What the UI shows about sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncStatus {
    pub connected: bool,
    pub account_identity: Option<AccountIdentity>,
    pub last_sync: Option<DateTime<Utc>>,
    pub in_progress: bool,
}

/// Result of a successful `pull`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PullOutcome {
    pub timestamp: DateTime<Utc>,
    pub record_count: usize,
}

/// Clears the in-flight flag when the sync that set it ends, however it ends.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| NoteVaultError::SyncAlreadyInProgress)?;
        Ok(Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct SyncCoordinator<R: RemoteSyncClient> {
    vault: Arc<RwLock<VaultStore>>,
    remote: R,
    config_file: SyncConfigFile,
    config: Mutex<Option<SyncConfig>>,
    options: SyncOptions,
    connected: AtomicBool,
    in_flight: AtomicBool,
}

impl<R: RemoteSyncClient> SyncCoordinator<R> {
    /// Build a coordinator, loading any previously saved `SyncConfig`.
    pub fn new(
        vault: Arc<RwLock<VaultStore>>,
        remote: R,
        config_file: SyncConfigFile,
        options: SyncOptions,
    ) -> Result<Self> {
        let config = config_file.load()?;
        Ok(Self {
            vault,
            remote,
            config_file,
            config: Mutex::new(config),
            options,
            connected: AtomicBool::new(false),
            in_flight: AtomicBool::new(false),
        })
    }

    pub fn vault(&self) -> &Arc<RwLock<VaultStore>> {
        &self.vault
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// Current sync config, if sync has been enabled.
    pub fn config(&self) -> Option<SyncConfig> {
        self.config.lock().clone()
    }

    pub fn status(&self) -> SyncStatus {
        let config = self.config.lock();
        SyncStatus {
            connected: config.as_ref().is_some_and(|c| c.enabled),
            account_identity: config.as_ref().map(|c| c.account_identity.clone()),
            last_sync: config.as_ref().and_then(|c| c.last_sync),
            in_progress: self.in_flight.load(Ordering::Acquire),
        }
    }

    // ------------------------------------------------------------------
    // Connection management
    // ------------------------------------------------------------------

    /// Sign in to the remote store and start a fresh `SyncConfig`.
    ///
    /// Fails with `SyncAlreadyInProgress` while a push or pull runs.
    pub async fn enable_sync(&self) -> Result<SyncConfig> {
        let _in_flight = InFlight::acquire(&self.in_flight)?;
        let identity = self.remote_call("connect", self.remote.connect()).await?;
        self.connected.store(true, Ordering::Release);

        let config = SyncConfig::connected(identity, self.options.auto_sync_default);
        self.config_file.save(&config)?;
        *self.config.lock() = Some(config.clone());

        info!(account = %config.account_identity, "sync enabled");
        Ok(config)
    }

    /// Sign out and forget the sync config.
    ///
    /// Local config is cleared even if the remote sign-out fails; that
    /// failure is still returned.  Fails with `SyncAlreadyInProgress`
    /// while a push or pull runs.
    pub async fn disable_sync(&self) -> Result<()> {
        let _in_flight = InFlight::acquire(&self.in_flight)?;
        let signed_out = self.remote_call("disconnect", self.remote.disconnect()).await;
        self.connected.store(false, Ordering::Release);

        self.config_file.clear()?;
        *self.config.lock() = None;
        info!("sync disabled");

        signed_out
    }

    /// Change sync preferences (currently `auto_sync`).
    pub fn configure(&self, auto_sync: bool) -> Result<SyncConfig> {
        let mut guard = self.config.lock();
        let mut next = guard.clone().ok_or(NoteVaultError::SyncNotEnabled)?;
        next.auto_sync = auto_sync;
        self.config_file.save(&next)?;
        *guard = Some(next.clone());
        Ok(next)
    }

    // ------------------------------------------------------------------
    // Push / pull
    // ------------------------------------------------------------------

    /// Upload the current snapshot, overwriting the remote object.
    ///
    /// The uploaded snapshot already carries the new `last_sync`, so a
    /// later `pull` reproduces the local snapshot exactly.  The vault and
    /// the config record the sync together or not at all.
    pub async fn push(&self) -> Result<DateTime<Utc>> {
        let _in_flight = InFlight::acquire(&self.in_flight)?;
        let config = self.ready()?;
        debug!("push started");

        self.ensure_connected().await?;
        let handle = self.ensure_handle(&config).await?;

        let stamp = Utc::now();
        let blob = self.vault.read().seal_for_sync(stamp)?;

        if let Err(e) = self
            .remote_call("upload", self.remote.upload(&handle, &blob))
            .await
        {
            self.forget_handle_if_gone(&e);
            warn!(error = %e, "push failed");
            return Err(e);
        }

        let previous = self.update_config(|c| {
            c.last_sync = Some(stamp);
            c.remote_object_id = Some(handle.clone());
        })?;
        if let Err(e) = self.vault.write().commit_sync(stamp) {
            self.restore_config(previous);
            warn!(error = %e, "push could not be recorded locally");
            return Err(e);
        }

        info!(at = %stamp, "push complete");
        Ok(stamp)
    }

    /// Replace the local snapshot with the remote one.
    ///
    /// A remote blob sealed under another PIN fails with
    /// `AuthenticationFailed`, distinct from the `Remote*` network errors.
    pub async fn pull(&self) -> Result<PullOutcome> {
        let _in_flight = InFlight::acquire(&self.in_flight)?;
        let config = self.ready()?;
        debug!("pull started");

        self.ensure_connected().await?;
        let handle = self.ensure_handle(&config).await?;

        let blob = match self
            .remote_call("download", self.remote.download(&handle))
            .await
        {
            Ok(blob) => blob,
            Err(e) => {
                self.forget_handle_if_gone(&e);
                warn!(error = %e, "pull failed");
                return Err(e);
            }
        };

        if blob.is_empty() {
            return Err(NoteVaultError::RemoteObjectNotFound(format!(
                "no backup has been pushed to '{}' yet",
                self.options.object_name
            )));
        }

        let timestamp = Utc::now();
        let previous = self.update_config(|c| {
            c.last_sync = Some(timestamp);
            c.remote_object_id = Some(handle.clone());
        })?;
        let record_count = match self.vault.write().replace_from_blob(&blob) {
            Ok(count) => count,
            Err(e) => {
                self.restore_config(previous);
                warn!(error = %e, "pull rejected");
                return Err(e);
            }
        };

        info!(records = record_count, "pull complete");
        Ok(PullOutcome {
            timestamp,
            record_count,
        })
    }

    /// Push if sync is enabled with `auto_sync` on; otherwise do nothing.
    pub async fn auto_push(&self) -> Result<Option<DateTime<Utc>>> {
        let wanted = self
            .config
            .lock()
            .as_ref()
            .is_some_and(|c| c.enabled && c.auto_sync);
        if !wanted {
            return Ok(None);
        }
        self.push().await.map(Some)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Vault unlocked and sync enabled; returns a copy of the config.
    fn ready(&self) -> Result<SyncConfig> {
        if !self.vault.read().is_authenticated() {
            return Err(NoteVaultError::NotAuthenticated);
        }
        self.config
            .lock()
            .clone()
            .filter(|c| c.enabled)
            .ok_or(NoteVaultError::SyncNotEnabled)
    }

    async fn ensure_connected(&self) -> Result<()> {
        if self.connected.load(Ordering::Acquire) {
            return Ok(());
        }
        self.remote_call("connect", self.remote.connect()).await?;
        self.connected.store(true, Ordering::Release);
        Ok(())
    }

    async fn ensure_handle(&self, config: &SyncConfig) -> Result<ObjectHandle> {
        if let Some(handle) = &config.remote_object_id {
            return Ok(handle.clone());
        }
        let handle = self
            .remote_call(
                "locate",
                self.remote.locate_or_create_object(&self.options.object_name),
            )
            .await?;
        debug!(handle = %handle, "remote object located");
        Ok(handle)
    }

    /// A cached handle that the provider no longer knows is dropped so the
    /// next sync locates the object again.
    fn forget_handle_if_gone(&self, e: &NoteVaultError) {
        if !matches!(e, NoteVaultError::RemoteObjectNotFound(_)) {
            return;
        }
        let result = self.update_config(|c| c.remote_object_id = None);
        if let Err(err) = result {
            warn!(error = %err, "could not clear stale remote handle");
        }
    }

    /// Apply `f` to the config and persist it.  Returns the config as it
    /// was before, for `restore_config`.
    fn update_config(&self, f: impl FnOnce(&mut SyncConfig)) -> Result<SyncConfig> {
        let mut guard = self.config.lock();
        let previous = guard.clone().ok_or(NoteVaultError::SyncNotEnabled)?;
        let mut next = previous.clone();
        f(&mut next);
        self.config_file.save(&next)?;
        *guard = Some(next);
        Ok(previous)
    }

    fn restore_config(&self, previous: SyncConfig) {
        let mut guard = self.config.lock();
        if let Err(e) = self.config_file.save(&previous) {
            warn!(error = %e, "could not roll back sync config");
        }
        *guard = Some(previous);
    }

    async fn remote_call<T>(
        &self,
        what: &str,
        call: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        match tokio::time::timeout(self.options.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(NoteVaultError::RemoteIoError(format!(
                "{what} timed out after {}s",
                self.options.timeout.as_secs_f32()
            ))),
        }
    }
}
