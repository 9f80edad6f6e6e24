//! Ed25519 identity keys and message signatures.
//!
//! An identity is a long-lived Ed25519 keypair. Signatures authenticate
//! arbitrary-length data; verification succeeds only for exactly the signed
//! bytes under exactly the signing key. The dalek backend runs verification
//! in constant time with respect to secret material.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use thiserror::Error;
use zeroize::Zeroize;

/// Size of Ed25519 public and private keys in bytes.
pub const IDENTITY_KEY_SIZE: usize = 32;

/// Size of an Ed25519 signature in bytes.
pub const SIGNATURE_SIZE: usize = 64;

/// Errors from identity operations.
///
/// A well-formed signature that simply does not match is NOT an error:
/// [`verify`] reports it as `Ok(false)` so all authentication failures look
/// alike to the caller.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// A key argument was not exactly 32 bytes.
    #[error("identity key must be {IDENTITY_KEY_SIZE} bytes, got {actual}")]
    InvalidKeyLength {
        /// Length of the rejected key.
        actual: usize,
    },

    /// A signature argument was not exactly 64 bytes.
    #[error("signature must be {SIGNATURE_SIZE} bytes, got {actual}")]
    InvalidSignatureLength {
        /// Length of the rejected signature.
        actual: usize,
    },

    /// The public key bytes do not encode a valid curve point.
    #[error("public key is not a valid curve point")]
    InvalidPublicKey,
}

/// Generate a new Ed25519 identity keypair.
///
/// Returns `(public_key, private_key)`.
pub fn generate_keypair() -> ([u8; IDENTITY_KEY_SIZE], [u8; IDENTITY_KEY_SIZE]) {
    let signing_key = SigningKey::generate(&mut OsRng);
    (signing_key.verifying_key().to_bytes(), signing_key.to_bytes())
}

/// Derive the public identity key from a private key.
pub fn derive_public_key(private_key: &[u8]) -> Result<[u8; IDENTITY_KEY_SIZE], IdentityError> {
    let signing_key = signing_key_from_slice(private_key)?;
    Ok(signing_key.verifying_key().to_bytes())
}

/// Sign arbitrary-length data with an identity private key.
pub fn sign(data: &[u8], private_key: &[u8]) -> Result<[u8; SIGNATURE_SIZE], IdentityError> {
    let signing_key = signing_key_from_slice(private_key)?;
    Ok(signing_key.sign(data).to_bytes())
}

/// Verify a signature over data with an identity public key.
///
/// `Ok(true)` only when the signature is valid for exactly this data and
/// key. A mismatching signature is `Ok(false)`; malformed arguments are
/// errors (wrong length, invalid curve point).
pub fn verify(data: &[u8], signature: &[u8], public_key: &[u8]) -> Result<bool, IdentityError> {
    if public_key.len() != IDENTITY_KEY_SIZE {
        return Err(IdentityError::InvalidKeyLength { actual: public_key.len() });
    }
    if signature.len() != SIGNATURE_SIZE {
        return Err(IdentityError::InvalidSignatureLength { actual: signature.len() });
    }

    let mut public_bytes = [0u8; IDENTITY_KEY_SIZE];
    public_bytes.copy_from_slice(public_key);
    let verifying_key = VerifyingKey::from_bytes(&public_bytes)
        .map_err(|_| IdentityError::InvalidPublicKey)?;

    let mut signature_bytes = [0u8; SIGNATURE_SIZE];
    signature_bytes.copy_from_slice(signature);
    let signature = Signature::from_bytes(&signature_bytes);

    Ok(verifying_key.verify(data, &signature).is_ok())
}

fn signing_key_from_slice(private_key: &[u8]) -> Result<SigningKey, IdentityError> {
    if private_key.len() != IDENTITY_KEY_SIZE {
        return Err(IdentityError::InvalidKeyLength { actual: private_key.len() });
    }

    let mut key_bytes = [0u8; IDENTITY_KEY_SIZE];
    key_bytes.copy_from_slice(private_key);
    let signing_key = SigningKey::from_bytes(&key_bytes);
    key_bytes.zeroize();
    Ok(signing_key)
}
