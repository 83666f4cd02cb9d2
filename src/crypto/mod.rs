//! Cryptographic primitives for NoteVault.
//!
//! This module provides:
//! - PIN parsing and validation (`pin`)
//! - Argon2id PIN-based key derivation (`kdf`)
//! - HKDF domain separation into vault key and verification token (`keys`)
//! - AES-256-GCM sealing and opening (`encryption`)

pub mod encryption;
pub mod kdf;
pub mod keys;
pub mod pin;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{seal, open, KeyDerivation, Pin, ...};
pub use encryption::{open, seal};
pub use kdf::{Argon2Params, KeyDerivation};
pub use keys::{VaultKey, VerificationToken};
pub use pin::Pin;
