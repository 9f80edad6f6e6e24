//! Hybrid classical + post-quantum key encapsulation.
//!
//! Combines X25519 ECDH with the ML-KEM-1024 parameter set (FIPS 203). The
//! session secret stays safe while EITHER algorithm remains unbroken: the
//! 64-byte combined secret is an HKDF expansion over the concatenation of
//! both exchange outputs, and neither half is ever used alone.
//!
//! # Byte layouts
//!
//! All bundles crossing the module boundary carry a leading version byte
//! (currently [`HYBRID_LAYOUT_VERSION`]) so the layout can evolve without
//! ambiguity. Offsets are fixed per sub-algorithm:
//!
//! ```text
//! public bundle      [version: 1][x25519 public: 32][ML-KEM public: 1568]
//! ciphertext bundle  [version: 1][x25519 ephemeral: 32][ML-KEM ciphertext: 1568]
//! keypair bytes      [version: 1][x25519 public: 32][x25519 secret: 32]
//!                    [ML-KEM public: 1568][ML-KEM secret: 3168]
//! ```

use hkdf::Hkdf;
use pqc_kyber::{KYBER_CIPHERTEXTBYTES, KYBER_PUBLICKEYBYTES, KYBER_SECRETKEYBYTES};
use rand::rngs::OsRng;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use sha2::Sha256;
use thiserror::Error;
use zeroize::{Zeroize, Zeroizing};

use crate::agreement::{self, AgreementError, EXCHANGE_KEY_SIZE};
use crate::secret::SecretBuffer;

/// ML-KEM-1024 public key size in bytes.
pub const KEM_PUBLIC_KEY_SIZE: usize = KYBER_PUBLICKEYBYTES;

/// ML-KEM-1024 secret key size in bytes.
pub const KEM_SECRET_KEY_SIZE: usize = KYBER_SECRETKEYBYTES;

/// ML-KEM-1024 ciphertext size in bytes.
pub const KEM_CIPHERTEXT_SIZE: usize = KYBER_CIPHERTEXTBYTES;

/// Combined hybrid shared secret size in bytes.
pub const HYBRID_SECRET_SIZE: usize = 64;

/// Version byte leading every hybrid bundle.
pub const HYBRID_LAYOUT_VERSION: u8 = 0x01;

/// Total size of a serialized public bundle.
pub const PUBLIC_BUNDLE_SIZE: usize = 1 + EXCHANGE_KEY_SIZE + KEM_PUBLIC_KEY_SIZE;

/// Total size of a serialized ciphertext bundle.
pub const CIPHERTEXT_BUNDLE_SIZE: usize = 1 + EXCHANGE_KEY_SIZE + KEM_CIPHERTEXT_SIZE;

/// Total size of a serialized keypair.
pub const KEYPAIR_BYTES_SIZE: usize =
    1 + EXCHANGE_KEY_SIZE + EXCHANGE_KEY_SIZE + KEM_PUBLIC_KEY_SIZE + KEM_SECRET_KEY_SIZE;

/// Domain label binding the combined secret to this hybrid construction.
const HYBRID_KDF_LABEL: &[u8] = b"sable-hybrid-kem-v1";

/// Errors from hybrid key encapsulation.
#[derive(Debug, Error)]
pub enum HybridError {
    /// A bundle carried an unknown layout version byte.
    #[error("unsupported hybrid layout version {found:#04x}")]
    UnsupportedVersion {
        /// The version byte found in the bundle.
        found: u8,
    },

    /// A bundle had the wrong total length for its layout.
    #[error("hybrid bundle must be {expected} bytes, got {actual}")]
    InvalidBundleLength {
        /// Required length for this bundle kind.
        expected: usize,
        /// Length of the rejected bundle.
        actual: usize,
    },

    /// The KEM backend failed to produce a keypair.
    #[error("KEM key generation failed")]
    KeyGenerationFailed,

    /// The KEM backend failed to encapsulate.
    #[error("KEM encapsulation failed")]
    EncapsulationFailed,

    /// The KEM backend failed to decapsulate.
    #[error("KEM decapsulation failed")]
    DecapsulationFailed,

    /// The classical half of the exchange failed.
    #[error(transparent)]
    Agreement(#[from] AgreementError),
}

/// A hybrid keypair: one X25519 keypair plus one ML-KEM-1024 keypair.
///
/// Both halves must validate independently; the secrets are wiped when the
/// keypair is dropped.
pub struct HybridKeypair {
    x25519_public: [u8; EXCHANGE_KEY_SIZE],
    x25519_secret: [u8; EXCHANGE_KEY_SIZE],
    kem_public: [u8; KEM_PUBLIC_KEY_SIZE],
    kem_secret: [u8; KEM_SECRET_KEY_SIZE],
}

impl HybridKeypair {
    /// Generate a hybrid keypair from OS randomness.
    pub fn generate() -> Result<Self, HybridError> {
        let (x25519_public, x25519_secret) = agreement::generate_keypair();
        let keys =
            pqc_kyber::keypair(&mut OsRng).map_err(|_| HybridError::KeyGenerationFailed)?;

        Ok(Self {
            x25519_public,
            x25519_secret,
            kem_public: keys.public,
            kem_secret: keys.secret,
        })
    }

    /// Derive a hybrid keypair deterministically from a 32-byte seed.
    ///
    /// The same seed always yields the same keypair, so an identity seed
    /// held in a host keystore can reconstruct its keys on demand.
    pub fn from_seed(seed: &[u8; 32]) -> Result<Self, HybridError> {
        let mut rng = ChaCha20Rng::from_seed(*seed);

        let mut x25519_seed = Zeroizing::new([0u8; EXCHANGE_KEY_SIZE]);
        rng.fill_bytes(&mut *x25519_seed);
        let x25519_secret = x25519_dalek::StaticSecret::from(*x25519_seed);
        let x25519_public = x25519_dalek::PublicKey::from(&x25519_secret);

        let keys = pqc_kyber::keypair(&mut rng).map_err(|_| HybridError::KeyGenerationFailed)?;

        Ok(Self {
            x25519_public: x25519_public.to_bytes(),
            x25519_secret: x25519_secret.to_bytes(),
            kem_public: keys.public,
            kem_secret: keys.secret,
        })
    }

    /// The classical public key.
    pub fn x25519_public(&self) -> &[u8; EXCHANGE_KEY_SIZE] {
        &self.x25519_public
    }

    /// The post-quantum public key.
    pub fn kem_public(&self) -> &[u8; KEM_PUBLIC_KEY_SIZE] {
        &self.kem_public
    }

    /// Serialize the public halves as a versioned bundle for the peer.
    pub fn public_bundle(&self) -> Vec<u8> {
        let mut bundle = Vec::with_capacity(PUBLIC_BUNDLE_SIZE);
        bundle.push(HYBRID_LAYOUT_VERSION);
        bundle.extend_from_slice(&self.x25519_public);
        bundle.extend_from_slice(&self.kem_public);
        bundle
    }

    /// Serialize the full keypair (secrets included) for a host keystore.
    pub fn to_bytes(&self) -> SecretBuffer {
        let mut bytes = Vec::with_capacity(KEYPAIR_BYTES_SIZE);
        bytes.push(HYBRID_LAYOUT_VERSION);
        bytes.extend_from_slice(&self.x25519_public);
        bytes.extend_from_slice(&self.x25519_secret);
        bytes.extend_from_slice(&self.kem_public);
        bytes.extend_from_slice(&self.kem_secret);
        SecretBuffer::new(bytes)
    }

    /// Deserialize a keypair previously written by [`Self::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, HybridError> {
        if bytes.len() != KEYPAIR_BYTES_SIZE {
            return Err(HybridError::InvalidBundleLength {
                expected: KEYPAIR_BYTES_SIZE,
                actual: bytes.len(),
            });
        }
        if bytes[0] != HYBRID_LAYOUT_VERSION {
            return Err(HybridError::UnsupportedVersion { found: bytes[0] });
        }

        let mut x25519_public = [0u8; EXCHANGE_KEY_SIZE];
        let mut x25519_secret = [0u8; EXCHANGE_KEY_SIZE];
        let mut kem_public = [0u8; KEM_PUBLIC_KEY_SIZE];
        let mut kem_secret = [0u8; KEM_SECRET_KEY_SIZE];

        let mut offset = 1;
        x25519_public.copy_from_slice(&bytes[offset..offset + EXCHANGE_KEY_SIZE]);
        offset += EXCHANGE_KEY_SIZE;
        x25519_secret.copy_from_slice(&bytes[offset..offset + EXCHANGE_KEY_SIZE]);
        offset += EXCHANGE_KEY_SIZE;
        kem_public.copy_from_slice(&bytes[offset..offset + KEM_PUBLIC_KEY_SIZE]);
        offset += KEM_PUBLIC_KEY_SIZE;
        kem_secret.copy_from_slice(&bytes[offset..offset + KEM_SECRET_KEY_SIZE]);

        Ok(Self { x25519_public, x25519_secret, kem_public, kem_secret })
    }
}

impl Drop for HybridKeypair {
    fn drop(&mut self) {
        self.x25519_secret.zeroize();
        self.kem_secret.zeroize();
    }
}

/// Encapsulate a fresh shared secret to a peer's public bundle.
///
/// Returns `(combined_secret, ciphertext_bundle)`. The combined secret is
/// 64 bytes; the ciphertext bundle travels to the peer for
/// [`decapsulate`].
pub fn encapsulate(public_bundle: &[u8]) -> Result<(SecretBuffer, Vec<u8>), HybridError> {
    let (their_x25519, their_kem) = parse_public_bundle(public_bundle)?;

    // Classical half: ephemeral X25519 exchange against their static key.
    let (ephemeral_public, ephemeral_secret) = agreement::generate_keypair();
    let ephemeral_secret = Zeroizing::new(ephemeral_secret);
    let x25519_shared =
        Zeroizing::new(agreement::diffie_hellman(&*ephemeral_secret, their_x25519)?);

    // Post-quantum half: ML-KEM encapsulation.
    let (kem_ciphertext, kem_shared) = pqc_kyber::encapsulate(their_kem, &mut OsRng)
        .map_err(|_| HybridError::EncapsulationFailed)?;
    let kem_shared = Zeroizing::new(kem_shared);

    let combined = combine_secrets(&x25519_shared, &*kem_shared);

    let mut bundle = Vec::with_capacity(CIPHERTEXT_BUNDLE_SIZE);
    bundle.push(HYBRID_LAYOUT_VERSION);
    bundle.extend_from_slice(&ephemeral_public);
    bundle.extend_from_slice(&kem_ciphertext);

    Ok((combined, bundle))
}

/// Recover the shared secret from a ciphertext bundle.
///
/// Produces the same 64-byte secret as the matching [`encapsulate`] call.
pub fn decapsulate(
    keypair: &HybridKeypair,
    ciphertext_bundle: &[u8],
) -> Result<SecretBuffer, HybridError> {
    let (ephemeral_public, kem_ciphertext) = parse_ciphertext_bundle(ciphertext_bundle)?;

    let x25519_shared = Zeroizing::new(agreement::diffie_hellman(
        &keypair.x25519_secret,
        ephemeral_public,
    )?);

    let kem_shared = Zeroizing::new(
        pqc_kyber::decapsulate(kem_ciphertext, &keypair.kem_secret)
            .map_err(|_| HybridError::DecapsulationFailed)?,
    );

    Ok(combine_secrets(&x25519_shared, &*kem_shared))
}

/// Bind both exchange outputs into one 64-byte secret.
///
/// HKDF-SHA256 over `x25519_shared || kem_shared` under a fixed domain
/// label; compromising one input does not reveal the output.
fn combine_secrets(x25519_shared: &[u8; 32], kem_shared: &[u8]) -> SecretBuffer {
    let mut ikm = Zeroizing::new(Vec::with_capacity(x25519_shared.len() + kem_shared.len()));
    ikm.extend_from_slice(x25519_shared);
    ikm.extend_from_slice(kem_shared);

    let hkdf = Hkdf::<Sha256>::new(None, &ikm);
    let mut combined = vec![0u8; HYBRID_SECRET_SIZE];
    let Ok(()) = hkdf.expand(HYBRID_KDF_LABEL, &mut combined) else {
        unreachable!("64 bytes is a valid HKDF-SHA256 output length");
    };

    SecretBuffer::new(combined)
}

fn parse_public_bundle(bundle: &[u8]) -> Result<(&[u8], &[u8]), HybridError> {
    if bundle.len() != PUBLIC_BUNDLE_SIZE {
        return Err(HybridError::InvalidBundleLength {
            expected: PUBLIC_BUNDLE_SIZE,
            actual: bundle.len(),
        });
    }
    if bundle[0] != HYBRID_LAYOUT_VERSION {
        return Err(HybridError::UnsupportedVersion { found: bundle[0] });
    }

    let x25519 = &bundle[1..1 + EXCHANGE_KEY_SIZE];
    let kem = &bundle[1 + EXCHANGE_KEY_SIZE..];
    Ok((x25519, kem))
}

fn parse_ciphertext_bundle(bundle: &[u8]) -> Result<(&[u8], &[u8]), HybridError> {
    if bundle.len() != CIPHERTEXT_BUNDLE_SIZE {
        return Err(HybridError::InvalidBundleLength {
            expected: CIPHERTEXT_BUNDLE_SIZE,
            actual: bundle.len(),
        });
    }
    if bundle[0] != HYBRID_LAYOUT_VERSION {
        return Err(HybridError::UnsupportedVersion { found: bundle[0] });
    }

    let ephemeral = &bundle[1..1 + EXCHANGE_KEY_SIZE];
    let ciphertext = &bundle[1 + EXCHANGE_KEY_SIZE..];
    Ok((ephemeral, ciphertext))
}
