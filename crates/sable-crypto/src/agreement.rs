//! X25519 Diffie-Hellman key agreement.
//!
//! Both parties derive the same 32-byte shared secret from their own
//! private key and the peer's public key. Low-order and identity points
//! produce an all-zero shared secret; those exchanges are rejected so a
//! malicious peer cannot force a predictable session key.

use rand::rngs::OsRng;
use thiserror::Error;
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::Zeroize;

/// Size of X25519 public and private keys in bytes.
pub const EXCHANGE_KEY_SIZE: usize = 32;

/// Size of the classical shared secret in bytes.
pub const SHARED_SECRET_SIZE: usize = 32;

/// Errors from key agreement.
#[derive(Debug, Error)]
pub enum AgreementError {
    /// A key argument was not exactly 32 bytes.
    #[error("exchange key must be {EXCHANGE_KEY_SIZE} bytes, got {actual}")]
    InvalidKeyLength {
        /// Length of the rejected key.
        actual: usize,
    },

    /// A key argument was all zero bytes.
    #[error("all-zero exchange key rejected")]
    ZeroKey,

    /// The exchange produced an all-zero secret (low-order public key).
    #[error("non-contributory key exchange rejected")]
    NonContributory,
}

/// Generate a new X25519 exchange keypair.
///
/// Returns `(public_key, private_key)`.
pub fn generate_keypair() -> ([u8; EXCHANGE_KEY_SIZE], [u8; EXCHANGE_KEY_SIZE]) {
    let secret = StaticSecret::random_from_rng(OsRng);
    let public = PublicKey::from(&secret);
    (public.to_bytes(), secret.to_bytes())
}

/// Derive the public exchange key from a private key.
pub fn derive_public_key(private_key: &[u8]) -> Result<[u8; EXCHANGE_KEY_SIZE], AgreementError> {
    let secret = secret_from_slice(private_key)?;
    Ok(PublicKey::from(&secret).to_bytes())
}

/// Derive the shared secret from our private key and their public key.
///
/// Commutative: `diffie_hellman(a_priv, b_pub) == diffie_hellman(b_priv, a_pub)`
/// for any two valid keypairs. Fails on malformed lengths, all-zero keys,
/// and exchanges where the peer's point contributes nothing.
pub fn diffie_hellman(
    our_private_key: &[u8],
    their_public_key: &[u8],
) -> Result<[u8; SHARED_SECRET_SIZE], AgreementError> {
    let secret = secret_from_slice(our_private_key)?;

    if their_public_key.len() != EXCHANGE_KEY_SIZE {
        return Err(AgreementError::InvalidKeyLength { actual: their_public_key.len() });
    }
    if their_public_key.iter().all(|&b| b == 0) {
        return Err(AgreementError::ZeroKey);
    }

    let mut public_bytes = [0u8; EXCHANGE_KEY_SIZE];
    public_bytes.copy_from_slice(their_public_key);
    let public = PublicKey::from(public_bytes);

    let shared = secret.diffie_hellman(&public);
    if !shared.was_contributory() {
        return Err(AgreementError::NonContributory);
    }

    Ok(shared.to_bytes())
}

fn secret_from_slice(private_key: &[u8]) -> Result<StaticSecret, AgreementError> {
    if private_key.len() != EXCHANGE_KEY_SIZE {
        return Err(AgreementError::InvalidKeyLength { actual: private_key.len() });
    }
    if private_key.iter().all(|&b| b == 0) {
        return Err(AgreementError::ZeroKey);
    }

    let mut secret_bytes = [0u8; EXCHANGE_KEY_SIZE];
    secret_bytes.copy_from_slice(private_key);
    let secret = StaticSecret::from(secret_bytes);
    secret_bytes.zeroize();
    Ok(secret)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_sides_derive_the_same_secret() {
        let (public_a, private_a) = generate_keypair();
        let (public_b, private_b) = generate_keypair();

        let secret_ab = diffie_hellman(&private_a, &public_b).unwrap();
        let secret_ba = diffie_hellman(&private_b, &public_a).unwrap();

        assert_eq!(secret_ab, secret_ba);
    }

    #[test]
    fn different_peers_derive_different_secrets() {
        let (_, private_a) = generate_keypair();
        let (public_b, _) = generate_keypair();
        let (public_c, _) = generate_keypair();

        let secret_ab = diffie_hellman(&private_a, &public_b).unwrap();
        let secret_ac = diffie_hellman(&private_a, &public_c).unwrap();

        assert_ne!(secret_ab, secret_ac);
    }

    #[test]
    fn derived_public_key_matches_generated() {
        let (public, private) = generate_keypair();
        assert_eq!(derive_public_key(&private).unwrap(), public);
    }

    #[test]
    fn zero_keys_are_rejected() {
        let (public, private) = generate_keypair();
        let zero = [0u8; EXCHANGE_KEY_SIZE];

        assert!(matches!(diffie_hellman(&zero, &public), Err(AgreementError::ZeroKey)));
        assert!(matches!(diffie_hellman(&private, &zero), Err(AgreementError::ZeroKey)));
    }

    #[test]
    fn low_order_point_is_rejected() {
        let (_, private) = generate_keypair();

        // Order-8 point on Curve25519; the exchange output is all zero.
        let mut low_order = [0u8; EXCHANGE_KEY_SIZE];
        low_order[0] = 0x01;

        assert!(matches!(
            diffie_hellman(&private, &low_order),
            Err(AgreementError::NonContributory)
        ));
    }

    #[test]
    fn invalid_lengths_are_errors() {
        let (public, private) = generate_keypair();

        assert!(matches!(
            diffie_hellman(&private[..31], &public),
            Err(AgreementError::InvalidKeyLength { actual: 31 })
        ));
        assert!(matches!(
            diffie_hellman(&private, &public[..4]),
            Err(AgreementError::InvalidKeyLength { actual: 4 })
        ));
        assert!(matches!(
            derive_public_key(&[0x11; 33]),
            Err(AgreementError::InvalidKeyLength { actual: 33 })
        ));
    }
}
