//! `RemoteSyncClient` over a plain directory.
//!
//! Point it at any folder another tool keeps in sync (a network share, a
//! cloud-drive mount, a USB stick).  Layout:
//!
//! ```text
//! <root>/objects.json      name -> handle index
//! <root>/<handle>.blob     object contents
//! ```
//!
//! Handles are random, so callers cannot derive them from names; the
//! index is what makes `locate_or_create_object` idempotent.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::remote::{AccountIdentity, ObjectHandle, RemoteSyncClient};
use crate::errors::{NoteVaultError, Result};

const INDEX_FILE: &str = "objects.json";

pub struct FolderRemote {
    root: PathBuf,
    account: Option<String>,
    connected: AtomicBool,
    /// Serializes index read-modify-write within this process.
    index_lock: Mutex<()>,
}

impl FolderRemote {
    /// `account` is reported as the identity; defaults to the folder path.
    pub fn new(root: impl Into<PathBuf>, account: Option<String>) -> Self {
        Self {
            root: root.into(),
            account,
            connected: AtomicBool::new(false),
            index_lock: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn blob_path(&self, handle: &ObjectHandle) -> PathBuf {
        self.root.join(format!("{}.blob", handle.as_str()))
    }

    fn require_connected(&self) -> Result<()> {
        if self.connected.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(NoteVaultError::RemoteAuthFailed(
                "folder remote is not connected".into(),
            ))
        }
    }

    async fn load_index(&self) -> Result<BTreeMap<String, ObjectHandle>> {
        match fs::read(self.root.join(INDEX_FILE)).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                NoteVaultError::RemoteIoError(format!("corrupt {INDEX_FILE}: {e}"))
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(io_err(&self.root.join(INDEX_FILE), e)),
        }
    }

    async fn write_file(&self, path: &Path, data: &[u8]) -> Result<()> {
        let tmp = path.with_extension("tmp");
        let mut file = fs::File::create(&tmp).await.map_err(|e| io_err(&tmp, e))?;
        file.write_all(data).await.map_err(|e| io_err(&tmp, e))?;
        file.sync_all().await.map_err(|e| io_err(&tmp, e))?;
        drop(file);
        fs::rename(&tmp, path).await.map_err(|e| io_err(path, e))
    }
}

fn io_err(path: &Path, e: std::io::Error) -> NoteVaultError {
    NoteVaultError::RemoteIoError(format!("{}: {e}", path.display()))
}

#[async_trait]
impl RemoteSyncClient for FolderRemote {
    async fn connect(&self) -> Result<AccountIdentity> {
        let meta = fs::metadata(&self.root).await.map_err(|e| {
            NoteVaultError::RemoteAuthFailed(format!("{}: {e}", self.root.display()))
        })?;
        if !meta.is_dir() {
            return Err(NoteVaultError::RemoteAuthFailed(format!(
                "{} is not a directory",
                self.root.display()
            )));
        }

        self.connected.store(true, Ordering::SeqCst);
        let identity = self
            .account
            .clone()
            .unwrap_or_else(|| self.root.display().to_string());
        info!(root = %self.root.display(), "folder remote connected");
        Ok(AccountIdentity::new(identity))
    }

    async fn disconnect(&self) -> Result<()> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn locate_or_create_object(&self, name: &str) -> Result<ObjectHandle> {
        self.require_connected()?;
        let _guard = self.index_lock.lock().await;

        let mut index = self.load_index().await?;
        if let Some(handle) = index.get(name) {
            return Ok(handle.clone());
        }

        let handle = ObjectHandle::new(format!("{:016x}", rand::random::<u64>()));
        self.write_file(&self.blob_path(&handle), &[]).await?;

        index.insert(name.to_string(), handle.clone());
        let bytes = serde_json::to_vec_pretty(&index)
            .map_err(|e| NoteVaultError::SerializationError(format!("{INDEX_FILE}: {e}")))?;
        self.write_file(&self.root.join(INDEX_FILE), &bytes).await?;

        debug!(name, handle = %handle, "remote object created");
        Ok(handle)
    }

    async fn upload(&self, handle: &ObjectHandle, bytes: &[u8]) -> Result<()> {
        self.require_connected()?;
        let path = self.blob_path(handle);
        match fs::metadata(&path).await {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(NoteVaultError::RemoteObjectNotFound(handle.to_string()));
            }
            Err(e) => return Err(io_err(&path, e)),
        }
        self.write_file(&path, bytes).await
    }

    async fn download(&self, handle: &ObjectHandle) -> Result<Vec<u8>> {
        self.require_connected()?;
        let path = self.blob_path(handle);
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(NoteVaultError::RemoteObjectNotFound(handle.to_string()))
            }
            Err(e) => Err(io_err(&path, e)),
        }
    }
}
