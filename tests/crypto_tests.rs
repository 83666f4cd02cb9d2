//! Integration tests for the NoteVault crypto module.

use notevault::crypto::{open, seal, Argon2Params, KeyDerivation, Pin};
use notevault::errors::NoteVaultError;

/// Minimum Argon2 parameters so tests stay fast.
fn fast_kdf() -> KeyDerivation {
    KeyDerivation::new(Argon2Params {
        memory_kib: 8_192,
        iterations: 1,
        parallelism: 1,
    })
}

// ---------------------------------------------------------------------------
// PIN validation
// ---------------------------------------------------------------------------

#[test]
fn pin_must_be_four_ascii_digits() {
    assert!(Pin::parse("0000").is_ok());
    assert!(Pin::parse("1234").is_ok());

    for bad in ["", "123", "12345", "12a4", " 123", "١٢٣٤", "12.4"] {
        assert!(
            matches!(Pin::parse(bad), Err(NoteVaultError::InvalidPinFormat)),
            "{bad:?} should be rejected"
        );
    }
}

// ---------------------------------------------------------------------------
// Key derivation
// ---------------------------------------------------------------------------

#[test]
fn same_pin_same_key_across_instances() {
    let pin = Pin::parse("4321").unwrap();
    let a = fast_kdf().derive_key(&pin).unwrap();
    let b = fast_kdf().derive_key(&pin).unwrap();
    assert_eq!(a.as_bytes(), b.as_bytes());
}

#[test]
fn different_pins_different_keys() {
    let kdf = fast_kdf();
    let a = kdf.derive_key(&Pin::parse("1111").unwrap()).unwrap();
    let b = kdf.derive_key(&Pin::parse("1112").unwrap()).unwrap();
    assert_ne!(a.as_bytes(), b.as_bytes());
}

#[test]
fn token_is_not_the_key() {
    let kdf = fast_kdf();
    let pin = Pin::parse("2468").unwrap();
    let (key, token) = kdf.derive_credentials(&pin).unwrap();
    assert_ne!(key.as_bytes(), token.as_bytes());

    let again = kdf.derive_verification_token(&pin).unwrap();
    assert!(token.matches(&again));
}

#[test]
fn params_change_the_key() {
    let pin = Pin::parse("2468").unwrap();
    let slow = fast_kdf().with_params(Argon2Params {
        memory_kib: 8_192,
        iterations: 2,
        parallelism: 1,
    });
    let a = fast_kdf().derive_key(&pin).unwrap();
    let b = slow.derive_key(&pin).unwrap();
    assert_ne!(a.as_bytes(), b.as_bytes());
}

#[test]
fn too_little_memory_is_rejected() {
    let kdf = KeyDerivation::new(Argon2Params {
        memory_kib: 1_024,
        iterations: 1,
        parallelism: 1,
    });
    let result = kdf.derive_key(&Pin::parse("1234").unwrap());
    assert!(matches!(result, Err(NoteVaultError::KeyDerivationFailed(_))));
}

// ---------------------------------------------------------------------------
// Seal / open
// ---------------------------------------------------------------------------

#[test]
fn seal_then_open_with_derived_key() {
    let key = fast_kdf().derive_key(&Pin::parse("9999").unwrap()).unwrap();
    let sealed = seal(b"card 4111 1111 1111 1111", &key).unwrap();
    assert_eq!(open(&sealed, &key).unwrap(), b"card 4111 1111 1111 1111");
}

#[test]
fn sealing_twice_gives_different_bytes() {
    let key = fast_kdf().derive_key(&Pin::parse("9999").unwrap()).unwrap();
    let a = seal(b"same", &key).unwrap();
    let b = seal(b"same", &key).unwrap();
    assert_ne!(a, b);
}

#[test]
fn open_with_other_pin_fails_authentication() {
    let kdf = fast_kdf();
    let right = kdf.derive_key(&Pin::parse("1357").unwrap()).unwrap();
    let wrong = kdf.derive_key(&Pin::parse("7531").unwrap()).unwrap();

    let sealed = seal(b"secret", &right).unwrap();
    assert!(matches!(
        open(&sealed, &wrong),
        Err(NoteVaultError::AuthenticationFailed)
    ));
}

#[test]
fn any_flipped_byte_is_detected() {
    let key = fast_kdf().derive_key(&Pin::parse("1357").unwrap()).unwrap();
    let sealed = seal(b"tamper me", &key).unwrap();

    for i in 0..sealed.len() {
        let mut damaged = sealed.clone();
        damaged[i] ^= 0x01;
        assert!(open(&damaged, &key).is_err(), "flip at byte {i} went unnoticed");
    }
}
