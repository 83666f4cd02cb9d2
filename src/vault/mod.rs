//! Vault module: PIN-gated, encrypted record storage.
//!
//! This module provides:
//! - `Record`, `RecordDraft` and `Category` types (`record`)
//! - The `VaultSnapshot` persisted as one unit (`snapshot`)
//! - The versioned blob envelope and PIN verifier (`format`)
//! - Local storage adapters behind `VaultPersistence` (`persistence`)
//! - The `VaultStore` state machine (`store`)

pub mod format;
pub mod persistence;
pub mod record;
pub mod snapshot;
pub mod store;

// Re-export the most commonly used items.
pub use format::{StoredArgon2Params, VerifierRecord};
pub use persistence::{FileStorage, MemoryStorage, VaultPersistence};
pub use record::{Category, Record, RecordDraft, RecordKind};
pub use snapshot::VaultSnapshot;
pub use store::{VaultState, VaultStore};
