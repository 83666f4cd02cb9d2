//! The remote object-store seam.
//!
//! The coordinator only needs "one named blob somewhere": connect, find
//! or create the object, upload, download.  Provider adapters implement
//! `RemoteSyncClient`; nothing above this trait knows which provider is
//! in use.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::Result;

/// Opaque provider-assigned identifier of the remote object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectHandle(String);

impl ObjectHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who the remote store is signed in as (e.g. an e-mail address).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountIdentity(String);

impl AccountIdentity {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A remote store holding one named blob.
///
/// Error contract:
/// - `connect` fails with `RemoteAuthFailed`.
/// - `upload` fails with `RemoteIoError` (or `RemoteObjectNotFound` when
///   the handle no longer exists).
/// - `download` fails with `RemoteObjectNotFound` or `RemoteIoError`.
#[async_trait]
pub trait RemoteSyncClient: Send + Sync {
    async fn connect(&self) -> Result<AccountIdentity>;

    async fn disconnect(&self) -> Result<()>;

    /// Idempotent: an existing object with this name is returned, never
    /// duplicated.
    async fn locate_or_create_object(&self, name: &str) -> Result<ObjectHandle>;

    async fn upload(&self, handle: &ObjectHandle, bytes: &[u8]) -> Result<()>;

    async fn download(&self, handle: &ObjectHandle) -> Result<Vec<u8>>;
}
