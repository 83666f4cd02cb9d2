//! Where the verifier and the sealed vault blob live at rest.
//!
//! `VaultStore` only talks to the `VaultPersistence` trait.  Two adapters
//! ship with the crate:
//! - `FileStorage`: a directory on disk, written atomically.
//! - `MemoryStorage`: in-process, with write-failure injection.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;

use super::format::VerifierRecord;
use crate::errors::{NoteVaultError, Result};

/// Storage seam for the two independent local units a vault needs.
///
/// Implementations must make `store_*` durable before returning: a caller
/// that sees `Ok` relies on the data surviving a crash right after.
pub trait VaultPersistence: Send + Sync {
    fn load_verifier(&self) -> Result<Option<VerifierRecord>>;
    fn store_verifier(&self, verifier: &VerifierRecord) -> Result<()>;
    fn load_vault(&self) -> Result<Option<Vec<u8>>>;
    fn store_vault(&self, blob: &[u8]) -> Result<()>;
}

// ---------------------------------------------------------------------------
// FileStorage
// ---------------------------------------------------------------------------

/// Directory-backed storage:
///
/// ```text
/// <dir>/pin.json    verifier record (JSON)
/// <dir>/vault.nvlt  sealed vault blob
/// ```
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    const VERIFIER_FILE: &'static str = "pin.json";
    const VAULT_FILE: &'static str = "vault.nvlt";

    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn vault_path(&self) -> PathBuf {
        self.dir.join(Self::VAULT_FILE)
    }

    pub fn verifier_path(&self) -> PathBuf {
        self.dir.join(Self::VERIFIER_FILE)
    }
}

impl VaultPersistence for FileStorage {
    fn load_verifier(&self) -> Result<Option<VerifierRecord>> {
        let Some(bytes) = read_optional(&self.verifier_path())? else {
            return Ok(None);
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| NoteVaultError::InvalidVaultFormat(format!("verifier JSON: {e}")))
    }

    fn store_verifier(&self, verifier: &VerifierRecord) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(verifier)
            .map_err(|e| NoteVaultError::SerializationError(format!("verifier: {e}")))?;
        write_atomic(&self.verifier_path(), &bytes)
    }

    fn load_vault(&self) -> Result<Option<Vec<u8>>> {
        read_optional(&self.vault_path())
    }

    fn store_vault(&self, blob: &[u8]) -> Result<()> {
        write_atomic(&self.vault_path(), blob)
    }
}

fn read_optional(path: &Path) -> Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(NoteVaultError::PersistenceError(format!(
            "read {}: {e}",
            path.display()
        ))),
    }
}

/// Write `data` to `path` **atomically** and durably.
///
/// 1. Write to a temp file in the same directory.
/// 2. `fsync` the temp file.
/// 3. Rename it over the target path.
/// 4. On Unix, `fsync` the directory so the rename itself is durable.
///
/// Readers see either the old file or the new one, never a torn write.
pub(crate) fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let persist_err =
        |e: std::io::Error| NoteVaultError::PersistenceError(format!("write {}: {e}", path.display()));

    let parent = parent_dir(path);
    fs::create_dir_all(parent).map_err(persist_err)?;

    let tmp_path = parent.join(format!(
        ".{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy()
    ));

    let mut file = fs::File::create(&tmp_path).map_err(persist_err)?;
    file.write_all(data).map_err(persist_err)?;
    file.sync_all().map_err(persist_err)?;
    drop(file);

    fs::rename(&tmp_path, path).map_err(persist_err)?;
    sync_dir(parent).map_err(persist_err)
}

/// `path`'s directory; `.` for a bare file name.
fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> std::io::Result<()> {
    fs::File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}

// ---------------------------------------------------------------------------
// MemoryStorage
// ---------------------------------------------------------------------------

#[derive(Default)]
struct MemoryState {
    verifier: Option<VerifierRecord>,
    vault: Option<Vec<u8>>,
}

/// In-process storage.  `set_fail_writes(true)` makes every store fail
/// with `PersistenceError`, which is how tests exercise rollback.
#[derive(Default)]
pub struct MemoryStorage {
    state: Mutex<MemoryState>,
    fail_writes: AtomicBool,
    vault_writes: AtomicUsize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful vault blob writes so far.
    pub fn vault_writes(&self) -> usize {
        self.vault_writes.load(Ordering::SeqCst)
    }

    /// Current vault blob, as a peer process would read it.
    pub fn vault_blob(&self) -> Option<Vec<u8>> {
        self.state.lock().vault.clone()
    }

    /// Replace the vault blob behind the store's back (tamper tests).
    pub fn overwrite_vault_blob(&self, blob: Vec<u8>) {
        self.state.lock().vault = Some(blob);
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(NoteVaultError::PersistenceError(
                "simulated storage failure".into(),
            ));
        }
        Ok(())
    }
}

impl VaultPersistence for MemoryStorage {
    fn load_verifier(&self) -> Result<Option<VerifierRecord>> {
        Ok(self.state.lock().verifier.clone())
    }

    fn store_verifier(&self, verifier: &VerifierRecord) -> Result<()> {
        self.check_writable()?;
        self.state.lock().verifier = Some(verifier.clone());
        Ok(())
    }

    fn load_vault(&self) -> Result<Option<Vec<u8>>> {
        Ok(self.state.lock().vault.clone())
    }

    fn store_vault(&self, blob: &[u8]) -> Result<()> {
        self.check_writable()?;
        self.state.lock().vault = Some(blob.to_vec());
        self.vault_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::kdf::Argon2Params;
    use crate::crypto::keys::VerificationToken;
    use tempfile::TempDir;

    fn verifier() -> VerifierRecord {
        let token = VerificationToken::from_slice(&[3u8; 32]).unwrap();
        VerifierRecord::new(&token, Argon2Params::default())
    }

    #[test]
    fn file_storage_starts_empty() {
        let tmp = TempDir::new().unwrap();
        let storage = FileStorage::new(tmp.path());
        assert!(storage.load_verifier().unwrap().is_none());
        assert!(storage.load_vault().unwrap().is_none());
    }

    #[test]
    fn file_storage_roundtrip_creates_directory() {
        let tmp = TempDir::new().unwrap();
        let storage = FileStorage::new(tmp.path().join("nested").join("data"));

        storage.store_verifier(&verifier()).unwrap();
        storage.store_vault(b"NVLT\x01blob").unwrap();

        assert_eq!(storage.load_verifier().unwrap(), Some(verifier()));
        assert_eq!(storage.load_vault().unwrap().unwrap(), b"NVLT\x01blob");
    }

    #[test]
    fn atomic_write_leaves_no_temp_file() {
        let tmp = TempDir::new().unwrap();
        let storage = FileStorage::new(tmp.path());
        storage.store_vault(b"one").unwrap();
        storage.store_vault(b"two").unwrap();

        let names: Vec<_> = fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, ["vault.nvlt"]);
        assert_eq!(fs::read(storage.vault_path()).unwrap(), b"two");
    }

    #[test]
    fn atomic_write_syncs_the_parent_directory() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("sync.json");
        write_atomic(&path, b"{}").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"{}");

        assert_eq!(parent_dir(&path), tmp.path());
        assert_eq!(parent_dir(Path::new("vault.nvlt")), Path::new("."));
        sync_dir(parent_dir(Path::new("vault.nvlt"))).unwrap();
    }

    #[test]
    fn corrupt_verifier_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let storage = FileStorage::new(tmp.path());
        fs::write(storage.verifier_path(), "{not json").unwrap();
        assert!(storage.load_verifier().is_err());
    }

    #[test]
    fn memory_storage_failure_injection() {
        let storage = MemoryStorage::new();
        storage.store_vault(b"a").unwrap();
        storage.set_fail_writes(true);
        assert!(matches!(
            storage.store_vault(b"b"),
            Err(NoteVaultError::PersistenceError(_))
        ));
        assert_eq!(storage.vault_blob().unwrap(), b"a");
        assert_eq!(storage.vault_writes(), 1);
    }
}
