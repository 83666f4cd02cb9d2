//! In-process `RemoteSyncClient`.
//!
//! Useful for tests and for embedding the vault without a real provider.
//! Several clients can share one backing store (`MemoryRemote::sharing`)
//! to model two devices syncing against the same account.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::remote::{AccountIdentity, ObjectHandle, RemoteSyncClient};
use crate::errors::{NoteVaultError, Result};

#[derive(Default)]
struct Objects {
    by_name: HashMap<String, ObjectHandle>,
    blobs: HashMap<ObjectHandle, Vec<u8>>,
    next_id: u64,
    creates: usize,
    uploads: usize,
}

/// A remote store that lives in memory.
pub struct MemoryRemote {
    account: AccountIdentity,
    objects: Arc<Mutex<Objects>>,
    connected: AtomicBool,
    fail_connect: AtomicBool,
    fail_io: AtomicBool,
    latency: Mutex<Option<Duration>>,
}

impl MemoryRemote {
    pub fn new(account: impl Into<String>) -> Self {
        Self {
            account: AccountIdentity::new(account),
            objects: Arc::new(Mutex::new(Objects::default())),
            connected: AtomicBool::new(false),
            fail_connect: AtomicBool::new(false),
            fail_io: AtomicBool::new(false),
            latency: Mutex::new(None),
        }
    }

    /// A second, independently connected client over the same objects.
    pub fn sharing(&self) -> Self {
        Self {
            account: self.account.clone(),
            objects: Arc::clone(&self.objects),
            connected: AtomicBool::new(false),
            fail_connect: AtomicBool::new(false),
            fail_io: AtomicBool::new(false),
            latency: Mutex::new(None),
        }
    }

    /// Make `connect` fail with `RemoteAuthFailed`.
    pub fn set_fail_connect(&self, fail: bool) {
        self.fail_connect.store(fail, Ordering::SeqCst);
    }

    /// Make uploads and downloads fail with `RemoteIoError`.
    pub fn set_fail_io(&self, fail: bool) {
        self.fail_io.store(fail, Ordering::SeqCst);
    }

    /// Delay every upload and download by `latency`.
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.lock() = latency;
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Number of objects ever created.
    pub fn create_count(&self) -> usize {
        self.objects.lock().creates
    }

    /// Number of successful uploads.
    pub fn upload_count(&self) -> usize {
        self.objects.lock().uploads
    }

    /// Current content of the object called `name`.
    pub fn blob_named(&self, name: &str) -> Option<Vec<u8>> {
        let objects = self.objects.lock();
        let handle = objects.by_name.get(name)?;
        objects.blobs.get(handle).cloned()
    }

    /// Overwrite the object called `name` as another writer would.
    pub fn put_blob_named(&self, name: &str, blob: Vec<u8>) {
        let mut objects = self.objects.lock();
        let handle = match objects.by_name.get(name) {
            Some(h) => h.clone(),
            None => {
                objects.next_id += 1;
                let h = ObjectHandle::new(format!("mem-{}", objects.next_id));
                objects.by_name.insert(name.to_string(), h.clone());
                h
            }
        };
        objects.blobs.insert(handle, blob);
    }

    /// Delete the object called `name` out from under any cached handle.
    pub fn remove_named(&self, name: &str) {
        let mut objects = self.objects.lock();
        if let Some(handle) = objects.by_name.remove(name) {
            objects.blobs.remove(&handle);
        }
    }

    fn require_connected(&self) -> Result<()> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(NoteVaultError::RemoteAuthFailed("not signed in".into()))
        }
    }

    async fn io_step(&self) -> Result<()> {
        let latency = *self.latency.lock();
        if let Some(d) = latency {
            tokio::time::sleep(d).await;
        }
        if self.fail_io.load(Ordering::SeqCst) {
            return Err(NoteVaultError::RemoteIoError("simulated network failure".into()));
        }
        self.require_connected()
    }
}

#[async_trait]
impl RemoteSyncClient for MemoryRemote {
    async fn connect(&self) -> Result<AccountIdentity> {
        if self.fail_connect.load(Ordering::SeqCst) {
            return Err(NoteVaultError::RemoteAuthFailed("sign-in rejected".into()));
        }
        self.connected.store(true, Ordering::SeqCst);
        Ok(self.account.clone())
    }

    async fn disconnect(&self) -> Result<()> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn locate_or_create_object(&self, name: &str) -> Result<ObjectHandle> {
        self.require_connected()?;
        let mut objects = self.objects.lock();
        if let Some(handle) = objects.by_name.get(name) {
            return Ok(handle.clone());
        }

        objects.next_id += 1;
        objects.creates += 1;
        let handle = ObjectHandle::new(format!("mem-{}", objects.next_id));
        objects.by_name.insert(name.to_string(), handle.clone());
        objects.blobs.insert(handle.clone(), Vec::new());
        Ok(handle)
    }

    async fn upload(&self, handle: &ObjectHandle, bytes: &[u8]) -> Result<()> {
        self.io_step().await?;
        let mut objects = self.objects.lock();
        let Some(blob) = objects.blobs.get_mut(handle) else {
            return Err(NoteVaultError::RemoteObjectNotFound(handle.to_string()));
        };
        *blob = bytes.to_vec();
        objects.uploads += 1;
        Ok(())
    }

    async fn download(&self, handle: &ObjectHandle) -> Result<Vec<u8>> {
        self.io_step().await?;
        self.objects
            .lock()
            .blobs
            .get(handle)
            .cloned()
            .ok_or_else(|| NoteVaultError::RemoteObjectNotFound(handle.to_string()))
    }
}
