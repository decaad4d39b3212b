//! Salted password hashing.
//!
//! Stored hash layout: `sha256$<salt>$<hex digest>`, where the digest is
//! SHA-256 over the password bytes followed by the salt bytes. The salt is
//! 16 hex characters taken from a v4 UUID.
//!
//! Any stored value without the `sha256$` prefix is a legacy plaintext
//! password. It can still be checked, but always reports `needs_migration`.

use sha2::{Digest, Sha256};

use clinic_contracts::error::{ClinicError, ClinicResult};

pub const HASH_PREFIX: &str = "sha256$";

const SALT_LEN: usize = 16;
const TEMPORARY_LEN: usize = 8;
const TEMPORARY_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
const MIN_LEN: usize = 3;
const MAX_LEN: usize = 128;

/// Outcome of checking a password against a stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordCheck {
    pub valid: bool,
    /// The stored value is plaintext and should be replaced by a hash.
    pub needs_migration: bool,
}

pub fn generate_salt() -> String {
    let mut salt = uuid::Uuid::new_v4().simple().to_string();
    salt.truncate(SALT_LEN);
    salt
}

/// An 8-character alphanumeric password handed to newly approved staff.
///
/// Not checked against `validate_strength`; the holder must change it.
pub fn generate_temporary_password() -> String {
    uuid::Uuid::new_v4()
        .as_bytes()
        .iter()
        .enumerate()
        // Bytes 6 and 8 carry the UUID version and variant bits.
        .filter(|(i, _)| *i != 6 && *i != 8)
        .take(TEMPORARY_LEN)
        .map(|(_, b)| char::from(TEMPORARY_CHARSET[usize::from(*b) % TEMPORARY_CHARSET.len()]))
        .collect()
}

/// Hash `password` with a fresh salt.
pub fn hash_password(password: &str) -> String {
    hash_with_salt(password, &generate_salt())
}

pub fn hash_with_salt(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hasher.update(salt.as_bytes());
    format!("{}{}${}", HASH_PREFIX, salt, hex::encode(hasher.finalize()))
}

pub fn is_hashed(stored: &str) -> bool {
    stored.starts_with(HASH_PREFIX)
}

/// Check `password` against a stored hash or legacy plaintext value.
///
/// A value carrying the hash prefix but not the full layout never verifies.
pub fn verify_password(password: &str, stored: &str) -> PasswordCheck {
    if !is_hashed(stored) {
        return PasswordCheck {
            valid: stored == password,
            needs_migration: true,
        };
    }

    let valid = stored[HASH_PREFIX.len()..]
        .split_once('$')
        .is_some_and(|(salt, _)| hash_with_salt(password, salt) == stored);

    PasswordCheck {
        valid,
        needs_migration: false,
    }
}

/// Strength rules applied to new passwords: 3 to 128 characters with at
/// least one lowercase letter, one uppercase letter and one digit.
///
/// Every broken rule is reported, not just the first.
pub fn validate_strength(password: &str) -> ClinicResult<()> {
    let mut reasons = Vec::new();
    let len = password.chars().count();

    if len < MIN_LEN {
        reasons.push(format!("must have at least {} characters", MIN_LEN));
    }
    if len > MAX_LEN {
        reasons.push(format!("must have at most {} characters", MAX_LEN));
    }
    if !password.chars().any(|c| c.is_lowercase()) {
        reasons.push("must contain a lowercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_uppercase()) {
        reasons.push("must contain an uppercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        reasons.push("must contain a digit".to_string());
    }

    if reasons.is_empty() {
        Ok(())
    } else {
        Err(ClinicError::WeakPassword { reasons })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_has_expected_layout() {
        let hash = hash_with_salt("admin123", "0123456789abcdef");
        let parts: Vec<&str> = hash.split('$').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "sha256");
        assert_eq!(parts[1], "0123456789abcdef");
        assert_eq!(parts[2].len(), 64);
    }

    #[test]
    fn same_password_gets_different_salts() {
        let a = hash_password("recep123");
        let b = hash_password("recep123");
        assert_ne!(a, b);
        assert!(verify_password("recep123", &a).valid);
        assert!(verify_password("recep123", &b).valid);
    }

    #[test]
    fn hashed_value_rejects_wrong_password() {
        let hash = hash_password("prof123");
        let check = verify_password("prof124", &hash);
        assert_eq!(
            check,
            PasswordCheck {
                valid: false,
                needs_migration: false
            }
        );
    }

    #[test]
    fn plaintext_value_verifies_and_needs_migration() {
        assert_eq!(
            verify_password("333", "333"),
            PasswordCheck {
                valid: true,
                needs_migration: true
            }
        );
        assert!(!verify_password("334", "333").valid);
    }

    #[test]
    fn truncated_hash_never_verifies() {
        assert!(!verify_password("x", "sha256$nosalt").valid);
        assert!(!verify_password("sha256$nosalt", "sha256$nosalt").valid);
    }

    #[test]
    fn temporary_passwords_are_eight_alphanumerics() {
        let first = generate_temporary_password();
        assert_eq!(first.len(), TEMPORARY_LEN);
        assert!(first.chars().all(|c| c.is_ascii_alphanumeric()), "{first}");

        let distinct: std::collections::HashSet<String> =
            (0..20).map(|_| generate_temporary_password()).collect();
        assert!(distinct.len() > 1);
    }

    #[test]
    fn strength_rules_report_every_failure() {
        assert!(validate_strength("Secret1").is_ok());

        match validate_strength("ab") {
            Err(ClinicError::WeakPassword { reasons }) => {
                assert_eq!(reasons.len(), 3, "got {:?}", reasons);
            }
            other => panic!("expected WeakPassword, got {:?}", other),
        }

        let long = format!("Aa1{}", "x".repeat(MAX_LEN));
        assert!(validate_strength(&long).is_err());
    }
}
