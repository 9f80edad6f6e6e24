//! Authenticated encryption with XChaCha20-Poly1305.
//!
//! Every encryption draws a fresh random 24-byte nonce; the extended nonce
//! space makes accidental reuse negligible for realistic message volumes,
//! with no counter state to persist. Output framing is
//! `nonce || ciphertext || tag` in a single buffer.
//!
//! Decryption fails closed: the Poly1305 tag is verified before any
//! plaintext is released, and wrong key, corruption, and truncation are
//! indistinguishable in the returned error.

use chacha20poly1305::{
    XChaCha20Poly1305, XNonce,
    aead::{Aead, KeyInit, OsRng},
};
use rand::RngCore;
use thiserror::Error;

/// Symmetric key size in bytes.
pub const KEY_SIZE: usize = 32;

/// XChaCha20 nonce size in bytes.
pub const NONCE_SIZE: usize = 24;

/// Poly1305 authentication tag size in bytes.
pub const TAG_SIZE: usize = 16;

/// Errors from authenticated encryption.
///
/// `DecryptFailed` deliberately carries no detail: the caller cannot tell
/// a wrong key from a corrupted or truncated message.
#[derive(Debug, Error)]
pub enum AeadError {
    /// The backend rejected the encryption inputs.
    #[error("encryption failed")]
    EncryptFailed,

    /// Authentication or framing failed; no plaintext was produced.
    #[error("decryption failed")]
    DecryptFailed,
}

/// Generate a random 32-byte symmetric key.
pub fn generate_key() -> [u8; KEY_SIZE] {
    let mut key = [0u8; KEY_SIZE];
    OsRng.fill_bytes(&mut key);
    key
}

/// Encrypt and authenticate a message.
///
/// Returns `nonce || ciphertext || tag` as one owned buffer. The nonce is
/// generated internally per call; callers never manage nonces.
pub fn encrypt(plaintext: &[u8], key: &[u8; KEY_SIZE]) -> Result<Vec<u8>, AeadError> {
    let cipher = XChaCha20Poly1305::new(key.into());

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = XNonce::from_slice(&nonce_bytes);

    let ciphertext = cipher.encrypt(nonce, plaintext).map_err(|_| AeadError::EncryptFailed)?;

    let mut out = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Verify and decrypt a message produced by [`encrypt`].
///
/// The tag is checked before any plaintext byte is released; on failure no
/// partial plaintext exists.
pub fn decrypt(data: &[u8], key: &[u8; KEY_SIZE]) -> Result<Vec<u8>, AeadError> {
    if data.len() < NONCE_SIZE + TAG_SIZE {
        return Err(AeadError::DecryptFailed);
    }

    let (nonce_bytes, ciphertext) = data.split_at(NONCE_SIZE);
    let nonce = XNonce::from_slice(nonce_bytes);

    let cipher = XChaCha20Poly1305::new(key.into());
    cipher.decrypt(nonce, ciphertext).map_err(|_| AeadError::DecryptFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let key = generate_key();
        let plaintext = b"an entirely ordinary message";

        let encrypted = encrypt(plaintext, &key).unwrap();
        let decrypted = decrypt(&encrypted, &key).unwrap();

        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn empty_plaintext_roundtrip() {
        let key = generate_key();

        let encrypted = encrypt(b"", &key).unwrap();
        assert_eq!(encrypted.len(), NONCE_SIZE + TAG_SIZE);

        let decrypted = decrypt(&encrypted, &key).unwrap();
        assert!(decrypted.is_empty());
    }

    #[test]
    fn large_plaintext_roundtrip() {
        let key = generate_key();
        let plaintext = vec![0x42u8; 64 * 1024];

        let encrypted = encrypt(&plaintext, &key).unwrap();
        let decrypted = decrypt(&encrypted, &key).unwrap();

        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn same_plaintext_encrypts_differently() {
        let key = generate_key();
        let plaintext = b"repeated message";

        let first = encrypt(plaintext, &key).unwrap();
        let second = encrypt(plaintext, &key).unwrap();

        assert_ne!(first[..NONCE_SIZE], second[..NONCE_SIZE], "nonces must differ");
        assert_ne!(first, second);
    }

    #[test]
    fn ciphertext_length_is_plaintext_plus_overhead() {
        let key = generate_key();
        let plaintext = b"sized";

        let encrypted = encrypt(plaintext, &key).unwrap();
        assert_eq!(encrypted.len(), NONCE_SIZE + plaintext.len() + TAG_SIZE);
    }

    #[test]
    fn wrong_key_fails() {
        let key = generate_key();
        let other_key = generate_key();

        let encrypted = encrypt(b"secret", &key).unwrap();
        assert!(matches!(decrypt(&encrypted, &other_key), Err(AeadError::DecryptFailed)));
    }

    #[test]
    fn tampered_ciphertext_fails() {
        let key = generate_key();
        let mut encrypted = encrypt(b"secret", &key).unwrap();

        let last = encrypted.len() - 1;
        encrypted[last] ^= 0x01;

        assert!(matches!(decrypt(&encrypted, &key), Err(AeadError::DecryptFailed)));
    }

    #[test]
    fn tampered_nonce_fails() {
        let key = generate_key();
        let mut encrypted = encrypt(b"secret", &key).unwrap();

        encrypted[0] ^= 0xFF;

        assert!(matches!(decrypt(&encrypted, &key), Err(AeadError::DecryptFailed)));
    }

    #[test]
    fn truncated_input_fails() {
        let key = generate_key();
        let encrypted = encrypt(b"secret", &key).unwrap();

        for len in [0, 1, NONCE_SIZE, NONCE_SIZE + TAG_SIZE - 1] {
            assert!(matches!(decrypt(&encrypted[..len], &key), Err(AeadError::DecryptFailed)));
        }
    }
}
