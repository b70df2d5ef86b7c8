//! Edit PIN hashing and verification
//!
//! PINs are exactly four ASCII digits and are only ever persisted as a
//! salted bcrypt hash. The hash string embeds its own salt and cost, so
//! verification needs nothing besides the stored value.

use crate::constants::{ERR_INVALID_PIN, PIN_HASH_COST, PIN_LENGTH};
use crate::error::{AppError, Result};

/// Syntactic PIN check: exactly four ASCII digits
pub fn is_well_formed(pin: &str) -> bool {
    pin.len() == PIN_LENGTH && pin.bytes().all(|b| b.is_ascii_digit())
}

/// Hash a PIN with the standard work factor
pub fn hash_pin(pin: &str) -> Result<String> {
    hash_pin_with_cost(pin, PIN_HASH_COST)
}

/// Hash a PIN with an explicit bcrypt cost
pub fn hash_pin_with_cost(pin: &str, cost: u32) -> Result<String> {
    if !is_well_formed(pin) {
        return Err(AppError::InvalidFormat(ERR_INVALID_PIN));
    }
    Ok(bcrypt::hash(pin, cost)?)
}

/// Verify a PIN against a stored hash
///
/// Returns false for a malformed PIN or an unreadable hash instead of
/// failing.
pub fn verify_pin(pin: &str, hash: &str) -> bool {
    if !is_well_formed(pin) {
        return false;
    }
    match bcrypt::verify(pin, hash) {
        Ok(valid) => valid,
        Err(_) => {
            tracing::warn!("Stored PIN hash could not be parsed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // bcrypt's minimum cost keeps these tests fast
    const TEST_COST: u32 = 4;

    #[test]
    fn test_is_well_formed() {
        assert!(is_well_formed("0000"));
        assert!(is_well_formed("4821"));
        assert!(!is_well_formed("123"));
        assert!(!is_well_formed("12345"));
        assert!(!is_well_formed("12ab"));
        assert!(!is_well_formed(""));
        assert!(!is_well_formed(" 123"));
        // Non-ASCII digits are rejected
        assert!(!is_well_formed("١٢٣٤"));
    }

    #[test]
    fn test_hash_rejects_malformed() {
        for pin in ["123", "12345", "12ab"] {
            assert!(matches!(
                hash_pin_with_cost(pin, TEST_COST),
                Err(AppError::InvalidFormat(_))
            ));
        }
    }

    #[test]
    fn test_verify_malformed_returns_false() {
        let hash = hash_pin_with_cost("1234", TEST_COST).unwrap();
        for pin in ["123", "12345", "12ab"] {
            assert!(!verify_pin(pin, &hash));
        }
    }

    #[test]
    fn test_round_trip_and_mismatch() {
        for pin in ["0000", "0001", "4821", "9999", "1111"] {
            let hash = hash_pin_with_cost(pin, TEST_COST).unwrap();
            assert!(verify_pin(pin, &hash));
            assert!(!verify_pin("5555", &hash));
        }
    }

    #[test]
    fn test_hash_is_salted() {
        let first = hash_pin_with_cost("4821", TEST_COST).unwrap();
        let second = hash_pin_with_cost("4821", TEST_COST).unwrap();
        assert_ne!(first, second);
        assert!(verify_pin("4821", &first));
        assert!(verify_pin("4821", &second));
    }

    #[test]
    fn test_standard_cost_embedded_in_hash() {
        let hash = hash_pin("4821").unwrap();
        assert!(hash.starts_with("$2b$12$"));
        assert!(verify_pin("4821", &hash));
        assert!(!verify_pin("4822", &hash));
    }

    #[test]
    fn test_verify_garbage_hash_returns_false() {
        assert!(!verify_pin("1234", "not-a-bcrypt-hash"));
    }
}
