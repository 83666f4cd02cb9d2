//! Integration tests for the NoteVault vault module.

use std::sync::Arc;
use std::time::Duration;

use notevault::crypto::{Argon2Params, KeyDerivation};
use notevault::errors::NoteVaultError;
use notevault::vault::{
    Category, FileStorage, MemoryStorage, RecordDraft, RecordKind, VaultState, VaultStore,
};
use tempfile::TempDir;

/// Minimum Argon2 parameters so tests stay fast.
fn fast_kdf() -> KeyDerivation {
    KeyDerivation::new(Argon2Params {
        memory_kib: 8_192,
        iterations: 1,
        parallelism: 1,
    })
}

/// Helper: a store over a fresh temp directory.
fn file_store() -> (TempDir, VaultStore) {
    let dir = TempDir::new().expect("create temp dir");
    let store = open_dir(&dir);
    (dir, store)
}

/// A new store over an existing directory, as a second process would see it.
fn open_dir(dir: &TempDir) -> VaultStore {
    VaultStore::new(Arc::new(FileStorage::new(dir.path())), fast_kdf())
}

fn memory_store() -> (Arc<MemoryStorage>, VaultStore) {
    let storage = Arc::new(MemoryStorage::new());
    let store = VaultStore::new(storage.clone(), fast_kdf());
    (storage, store)
}

fn bank() -> RecordDraft {
    RecordDraft::new("Bank")
        .category(Category::Credential)
        .username("u")
        .secret("s")
}

// ---------------------------------------------------------------------------
// Setup, logout, authenticate
// ---------------------------------------------------------------------------

#[test]
fn setup_add_logout_authenticate_search() {
    let (_dir, mut store) = file_store();

    store.setup_pin("1234").unwrap();
    assert_eq!(store.state(), VaultState::Authenticated);

    store.add_or_update_record(bank()).unwrap();
    store.logout();
    assert_eq!(store.state(), VaultState::LoggedOut);

    store.authenticate("1234").unwrap();
    let all = store.search("").unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].title, "Bank");
    assert_eq!(all[0].username(), Some("u"));
}

#[test]
fn records_survive_a_restart() {
    let dir = TempDir::new().unwrap();
    {
        let mut store = open_dir(&dir);
        store.setup_pin("1234").unwrap();
        store.add_or_update_record(bank()).unwrap();
        store
            .add_or_update_record(
                RecordDraft::new("Visa")
                    .category(Category::Card)
                    .card_number("4111111111111111")
                    .expiry("09/27")
                    .cvv("123")
                    .holder("A. User"),
            )
            .unwrap();
    }

    let mut store = open_dir(&dir);
    assert!(store.has_pin().unwrap());
    store.authenticate("1234").unwrap();

    let records = store.records().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].title, "Bank");
    match &records[1].kind {
        RecordKind::Card { cvv, holder, .. } => {
            assert_eq!(cvv, "123");
            assert_eq!(holder, "A. User");
        }
        other => panic!("expected a card, got {other:?}"),
    }
}

#[test]
fn wrong_pin_leaves_store_logged_out() {
    let (_dir, mut store) = file_store();
    store.setup_pin("1234").unwrap();
    store.logout();

    let result = store.authenticate("9999");
    assert!(matches!(result, Err(NoteVaultError::AuthenticationFailed)));
    assert_eq!(store.state(), VaultState::LoggedOut);
    assert!(matches!(store.search(""), Err(NoteVaultError::NotAuthenticated)));
}

#[test]
fn unconfigured_vault_fails_like_a_wrong_pin() {
    let (_dir, mut store) = file_store();
    assert!(!store.has_pin().unwrap());

    let result = store.authenticate("1234");
    assert!(matches!(result, Err(NoteVaultError::AuthenticationFailed)));
    assert_eq!(store.state(), VaultState::LoggedOut);
}

#[test]
fn second_setup_is_rejected() {
    let dir = TempDir::new().unwrap();
    open_dir(&dir).setup_pin("1234").unwrap();

    let mut again = open_dir(&dir);
    assert!(matches!(
        again.setup_pin("5678"),
        Err(NoteVaultError::PinAlreadyConfigured)
    ));

    // The original PIN still works, the rejected one does not.
    assert!(again.authenticate("5678").is_err());
    again.authenticate("1234").unwrap();
}

#[test]
fn malformed_pins_are_rejected_before_any_work() {
    let (_dir, mut store) = file_store();
    assert!(matches!(
        store.setup_pin("12a4"),
        Err(NoteVaultError::InvalidPinFormat)
    ));
    assert!(!store.has_pin().unwrap());
    assert!(matches!(
        store.authenticate("123"),
        Err(NoteVaultError::InvalidPinFormat)
    ));
}

#[test]
fn locked_store_refuses_record_operations() {
    let (_storage, mut store) = memory_store();
    store.setup_pin("1234").unwrap();
    store.logout();
    store.logout();

    assert!(matches!(
        store.add_or_update_record(bank()),
        Err(NoteVaultError::NotAuthenticated)
    ));
    assert!(matches!(
        store.delete_record("x"),
        Err(NoteVaultError::NotAuthenticated)
    ));
    assert!(matches!(store.records(), Err(NoteVaultError::NotAuthenticated)));
}

#[test]
fn stored_kdf_params_are_used_to_unlock() {
    let dir = TempDir::new().unwrap();
    open_dir(&dir).setup_pin("1234").unwrap();

    // Default params differ from the fast ones the PIN was set up with.
    let mut store = VaultStore::new(
        Arc::new(FileStorage::new(dir.path())),
        KeyDerivation::default(),
    );
    store.authenticate("1234").unwrap();
}

// ---------------------------------------------------------------------------
// Record operations
// ---------------------------------------------------------------------------

#[test]
fn update_merges_onto_existing_record() {
    let (_storage, mut store) = memory_store();
    store.setup_pin("1234").unwrap();

    let original = store
        .add_or_update_record(bank().url("https://bank.example").content("branch 12"))
        .unwrap();
    std::thread::sleep(Duration::from_millis(5));

    let updated = store
        .add_or_update_record(RecordDraft::update(&original.id).title("new"))
        .unwrap();

    assert_eq!(updated.id, original.id);
    assert_eq!(updated.title, "new");
    assert_eq!(updated.content, "branch 12");
    assert_eq!(updated.kind, original.kind);
    assert_eq!(updated.created_at, original.created_at);
    assert!(updated.updated_at > original.updated_at);
}

#[test]
fn updating_an_unknown_id_fails() {
    let (_storage, mut store) = memory_store();
    store.setup_pin("1234").unwrap();
    assert!(matches!(
        store.add_or_update_record(RecordDraft::update("nope").title("x")),
        Err(NoteVaultError::RecordNotFound(_))
    ));
}

#[test]
fn new_records_get_unique_ids() {
    let (_storage, mut store) = memory_store();
    store.setup_pin("1234").unwrap();

    let mut ids: Vec<String> = (0..20)
        .map(|i| {
            store
                .add_or_update_record(RecordDraft::new(format!("note {i}")))
                .unwrap()
                .id
        })
        .collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 20);
}

#[test]
fn deleting_a_missing_id_is_a_no_op() {
    let (storage, mut store) = memory_store();
    store.setup_pin("1234").unwrap();
    let kept = store.add_or_update_record(bank()).unwrap();
    let writes = storage.vault_writes();

    assert!(!store.delete_record("does-not-exist").unwrap());
    assert_eq!(storage.vault_writes(), writes);

    let after = store.get_record(&kept.id).unwrap().unwrap();
    assert_eq!(after.updated_at, kept.updated_at);

    assert!(store.delete_record(&kept.id).unwrap());
    assert!(store.records().unwrap().is_empty());
}

#[test]
fn search_is_case_insensitive_across_fields() {
    let (_storage, mut store) = memory_store();
    store.setup_pin("1234").unwrap();
    store.add_or_update_record(bank()).unwrap();
    store
        .add_or_update_record(
            RecordDraft::new("Mail")
                .category(Category::Credential)
                .username("alice@example.com")
                .url("https://MAIL.example"),
        )
        .unwrap();
    store
        .add_or_update_record(RecordDraft::new("Passport").content("Number X1234567"))
        .unwrap();

    let titles = |q: &str| -> Vec<String> {
        store
            .search(q)
            .unwrap()
            .into_iter()
            .map(|r| r.title)
            .collect()
    };

    assert_eq!(titles("BANK"), vec!["Bank"]);
    assert_eq!(titles("ALICE"), vec!["Mail"]);
    assert_eq!(titles("mail.example"), vec!["Mail"]);
    assert_eq!(titles("x1234"), vec!["Passport"]);
    assert_eq!(titles("").len(), 3);
    assert!(titles("nothing here").is_empty());
}

#[test]
fn failed_write_leaves_memory_unchanged() {
    let (storage, mut store) = memory_store();
    store.setup_pin("1234").unwrap();
    let kept = store.add_or_update_record(bank()).unwrap();

    storage.set_fail_writes(true);
    assert!(matches!(
        store.add_or_update_record(RecordDraft::new("lost")),
        Err(NoteVaultError::PersistenceError(_))
    ));
    assert!(matches!(
        store.add_or_update_record(RecordDraft::update(&kept.id).title("renamed")),
        Err(NoteVaultError::PersistenceError(_))
    ));
    assert!(store.delete_record(&kept.id).is_err());

    let records = store.records().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].title, "Bank");
}

// ---------------------------------------------------------------------------
// At-rest format
// ---------------------------------------------------------------------------

#[test]
fn nothing_readable_on_disk() {
    let (dir, mut store) = file_store();
    store.setup_pin("1234").unwrap();
    store
        .add_or_update_record(bank().secret("hunter2-very-secret"))
        .unwrap();

    let storage = FileStorage::new(dir.path());
    let blob = std::fs::read(storage.vault_path()).unwrap();
    assert!(blob.starts_with(b"NVLT"));
    let as_text = String::from_utf8_lossy(&blob);
    assert!(!as_text.contains("hunter2"));
    assert!(!as_text.contains("Bank"));

    let verifier = std::fs::read_to_string(storage.verifier_path()).unwrap();
    assert!(!verifier.contains("1234"));
}

#[test]
fn tampered_vault_file_is_reported_not_reset() {
    let (dir, mut store) = file_store();
    store.setup_pin("1234").unwrap();
    store.add_or_update_record(bank()).unwrap();
    store.logout();

    let path = FileStorage::new(dir.path()).vault_path();
    let mut blob = std::fs::read(&path).unwrap();
    let last = blob.len() - 1;
    blob[last] ^= 0xff;
    std::fs::write(&path, &blob).unwrap();

    assert!(matches!(
        store.authenticate("1234"),
        Err(NoteVaultError::PersistenceError(_))
    ));
    assert_eq!(store.state(), VaultState::LoggedOut);
}

#[test]
fn unknown_format_version_is_rejected() {
    let (storage, mut store) = memory_store();
    store.setup_pin("1234").unwrap();
    store.logout();

    let mut blob = storage.vault_blob().unwrap();
    blob[4] = 99;
    storage.overwrite_vault_blob(blob);

    assert!(matches!(
        store.authenticate("1234"),
        Err(NoteVaultError::InvalidVaultFormat(_))
    ));
}
