//! Remote backup and sync of the sealed vault snapshot.
//!
//! - `remote`: the `RemoteSyncClient` provider seam
//! - `folder`, `memory`: provider adapters
//! - `config`: `SyncConfig` and its file
//! - `coordinator`: `SyncCoordinator` (push, pull, connect, disconnect)

pub mod config;
pub mod coordinator;
pub mod folder;
pub mod memory;
pub mod remote;

pub use config::{SyncConfig, SyncConfigFile};
pub use coordinator::{PullOutcome, SyncCoordinator, SyncOptions, SyncStatus, DEFAULT_OBJECT_NAME};
pub use folder::FolderRemote;
pub use memory::MemoryRemote;
pub use remote::{AccountIdentity, ObjectHandle, RemoteSyncClient};
