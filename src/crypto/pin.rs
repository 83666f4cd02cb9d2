//! The 4-digit PIN that gates vault access.

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::errors::{NoteVaultError, Result};

/// Number of digits in a PIN.
pub const PIN_LEN: usize = 4;

/// A validated PIN.  The digits are wiped from memory on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Pin {
    digits: [u8; PIN_LEN],
}

impl Pin {
    /// Parse a PIN, accepting exactly four ASCII digits and nothing else
    /// (no whitespace, no signs, no non-ASCII digits).
    pub fn parse(input: &str) -> Result<Self> {
        let bytes = input.as_bytes();
        if bytes.len() != PIN_LEN || !bytes.iter().all(u8::is_ascii_digit) {
            return Err(NoteVaultError::InvalidPinFormat);
        }

        let mut digits = [0u8; PIN_LEN];
        digits.copy_from_slice(bytes);
        Ok(Self { digits })
    }

    /// Raw ASCII digits, used as KDF input.
    pub fn as_bytes(&self) -> &[u8] {
        &self.digits
    }
}

impl std::fmt::Debug for Pin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Pin(****)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_four_digits() {
        assert_eq!(Pin::parse("0042").unwrap().as_bytes(), b"0042");
    }

    #[test]
    fn rejects_wrong_length_and_non_digits() {
        for bad in ["", "123", "12345", "12a4", " 123", "12 4", "-123", "١٢٣٤"] {
            assert!(
                matches!(Pin::parse(bad), Err(NoteVaultError::InvalidPinFormat)),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn debug_does_not_leak_digits() {
        let pin = Pin::parse("1234").unwrap();
        assert!(!format!("{pin:?}").contains("1234"));
    }
}
