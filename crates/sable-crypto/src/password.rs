//! Password hashing and password-based key derivation with Argon2id.
//!
//! Hashes are PHC strings: the algorithm identifier, cost parameters, and
//! salt travel inside the encoded output, so verification years later
//! needs nothing beyond the string itself. Key derivation reuses the same
//! memory-hard function with a caller-supplied salt for deterministic
//! re-derivation (unlocking local storage).
//!
//! Both derivations take hundreds of milliseconds at the default cost
//! parameters. Never call them on a latency-sensitive path; offload to a
//! worker thread.

use argon2::{
    Argon2, PasswordHash, PasswordVerifier,
    password_hash::{PasswordHasher, SaltString},
};
use rand::rngs::OsRng;
use thiserror::Error;

/// Derived symmetric key size in bytes.
pub const DERIVED_KEY_SIZE: usize = 32;

/// Minimum accepted salt length in bytes for key derivation.
pub const MIN_SALT_SIZE: usize = 16;

/// Generated salt length in bytes.
pub const SALT_SIZE: usize = 16;

/// Errors from password hashing and key derivation.
#[derive(Debug, Error)]
pub enum PasswordError {
    /// The hashing backend failed (parameter or allocation problem).
    #[error("password hashing failed")]
    HashingFailed,

    /// The encoded hash string is not a valid PHC string.
    #[error("malformed password hash")]
    InvalidHash,

    /// The caller-supplied salt is too short.
    #[error("salt must be at least {MIN_SALT_SIZE} bytes, got {actual}")]
    InvalidSalt {
        /// Length of the rejected salt.
        actual: usize,
    },
}

/// Hash a password for storage.
///
/// Generates a random salt and returns a PHC-format string embedding the
/// algorithm id, cost parameters, salt, and hash.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| PasswordError::HashingFailed)?;

    Ok(hash.to_string())
}

/// Verify a password against a stored PHC hash.
///
/// Re-derives with the parameters embedded in the hash and compares in
/// constant time. A mismatch is `Ok(false)`; only a malformed hash string
/// is an error.
pub fn verify_password(password: &str, encoded_hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(encoded_hash).map_err(|_| PasswordError::InvalidHash)?;

    Ok(Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
}

/// Derive a fixed-length symmetric key from a password and salt.
///
/// Deterministic for a given `(password, salt)` pair; the caller keeps the
/// salt and re-derives the same key later.
pub fn derive_key_from_password(
    password: &str,
    salt: &[u8],
) -> Result<[u8; DERIVED_KEY_SIZE], PasswordError> {
    if salt.len() < MIN_SALT_SIZE {
        return Err(PasswordError::InvalidSalt { actual: salt.len() });
    }

    let mut key = [0u8; DERIVED_KEY_SIZE];
    Argon2::default()
        .hash_password_into(password.as_bytes(), salt, &mut key)
        .map_err(|_| PasswordError::HashingFailed)?;

    Ok(key)
}

/// Generate a random salt for [`derive_key_from_password`].
pub fn generate_salt() -> [u8; SALT_SIZE] {
    use rand::RngCore;

    let mut salt = [0u8; SALT_SIZE];
    OsRng.fill_bytes(&mut salt);
    salt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_phc_encoded() {
        let hash = hash_password("correct horse battery staple").unwrap();
        assert!(hash.starts_with("$argon2id$"));
    }

    #[test]
    fn verify_accepts_the_right_password() {
        let hash = hash_password("open sesame").unwrap();
        assert!(verify_password("open sesame", &hash).unwrap());
    }

    #[test]
    fn verify_rejects_the_wrong_password() {
        let hash = hash_password("open sesame").unwrap();
        assert!(!verify_password("open says me", &hash).unwrap());
    }

    #[test]
    fn verify_rejects_malformed_hash() {
        assert!(matches!(
            verify_password("anything", "not a phc string"),
            Err(PasswordError::InvalidHash)
        ));
    }

    #[test]
    fn same_password_hashes_differently() {
        // Random salt per call; the encoded strings must not repeat.
        let first = hash_password("password").unwrap();
        let second = hash_password("password").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn derived_key_is_deterministic() {
        let salt = [0x21u8; SALT_SIZE];
        let first = derive_key_from_password("vault password", &salt).unwrap();
        let second = derive_key_from_password("vault password", &salt).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn derived_key_depends_on_salt() {
        let first = derive_key_from_password("vault password", &[0x01u8; SALT_SIZE]).unwrap();
        let second = derive_key_from_password("vault password", &[0x02u8; SALT_SIZE]).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn derived_key_depends_on_password() {
        let salt = [0x21u8; SALT_SIZE];
        let first = derive_key_from_password("one", &salt).unwrap();
        let second = derive_key_from_password("two", &salt).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn short_salt_is_rejected() {
        assert!(matches!(
            derive_key_from_password("password", &[0u8; 8]),
            Err(PasswordError::InvalidSalt { actual: 8 })
        ));
    }

    #[test]
    fn generated_salts_are_unique() {
        assert_ne!(generate_salt(), generate_salt());
    }
}
