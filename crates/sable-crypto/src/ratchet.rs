//! Root-key derivation and the forward-secure chain ratchet.
//!
//! A shared secret from key agreement becomes a root key via HKDF-SHA256
//! under a caller-chosen domain label. From the root key, two directional
//! chain keys are split off; each chain then evolves one way, one HMAC
//! step per message.
//!
//! ```text
//! Shared Secret (X25519 or hybrid)
//!        │
//!        ▼
//! HKDF → Root Key (per channel, per label)
//!        │
//!        ▼
//! HMAC split → Sending / Receiving Chain Keys
//!        │
//!        ▼
//! Chain Ratchet → Message Keys
//! ```
//!
//! # Security
//!
//! - One-way evolution: a chain key yields the next via HMAC-SHA256; prior
//!   chain keys and prior message keys cannot be recovered from later ones.
//! - Label separation: the message key and the next chain key come from
//!   distinct labels, so handing out a message key reveals nothing about
//!   the chain.
//! - Wipe on advance: [`ChainRatchet`] overwrites the old chain key as soon
//!   as the next one is derived.

use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;
use zeroize::Zeroize;

type HmacSha256 = Hmac<Sha256>;

/// Size of root, chain, and message keys in bytes.
pub const KEY_SIZE: usize = 32;

/// Label for deriving the next chain key from the current one.
const CHAIN_LABEL: &[u8] = b"chain";

/// Label for deriving a message key from the current chain key.
const MESSAGE_LABEL: &[u8] = b"message";

/// Label for the chain written by the party with the smaller identifier.
const LOW_DIRECTION_LABEL: &[u8] = b"direction-low";

/// Label for the chain written by the party with the larger identifier.
const HIGH_DIRECTION_LABEL: &[u8] = b"direction-high";

/// Errors from key derivation and ratchet evolution.
#[derive(Debug, Error)]
pub enum RatchetError {
    /// The shared secret was neither 32 (classical) nor 64 (hybrid) bytes.
    #[error("shared secret must be 32 or 64 bytes, got {actual}")]
    InvalidSecretLength {
        /// Length of the rejected secret.
        actual: usize,
    },

    /// The ratchet reached the last representable generation.
    #[error("chain ratchet exhausted at generation {current}")]
    GenerationOverflow {
        /// Generation at which the ratchet stopped.
        current: u32,
    },
}

/// Derive a root key from a shared secret and a domain-separation label.
///
/// HKDF-SHA256, extract-then-expand. Accepts the 32-byte classical secret
/// or the 64-byte hybrid secret; root keys derived from the same secret
/// under different labels never collide.
pub fn derive_root_key(shared_secret: &[u8], info: &[u8]) -> Result<[u8; KEY_SIZE], RatchetError> {
    if shared_secret.len() != 32 && shared_secret.len() != 64 {
        return Err(RatchetError::InvalidSecretLength { actual: shared_secret.len() });
    }

    let hkdf = Hkdf::<Sha256>::new(None, shared_secret);
    let mut root_key = [0u8; KEY_SIZE];
    let Ok(()) = hkdf.expand(info, &mut root_key) else {
        unreachable!("32 bytes is a valid HKDF-SHA256 output length");
    };

    Ok(root_key)
}

/// Split a root key into directional chain keys.
///
/// Returns `(sending, receiving)` for the party identified by `our_id`.
/// Direction is assigned by lexicographic comparison of the identifiers,
/// so both sides agree without negotiation: one party's sending chain is
/// the other's receiving chain.
pub fn derive_chain_keys(
    root_key: &[u8; KEY_SIZE],
    our_id: &[u8],
    their_id: &[u8],
) -> ([u8; KEY_SIZE], [u8; KEY_SIZE]) {
    let low = hmac_label(root_key, LOW_DIRECTION_LABEL);
    let high = hmac_label(root_key, HIGH_DIRECTION_LABEL);

    if our_id <= their_id { (low, high) } else { (high, low) }
}

/// Evolve a chain key one step forward.
///
/// Deterministic and one-way; the caller's key is not modified. Use
/// [`ChainRatchet`] when the old key should be wiped on advance.
pub fn evolve_chain_key(chain_key: &[u8; KEY_SIZE]) -> [u8; KEY_SIZE] {
    hmac_label(chain_key, CHAIN_LABEL)
}

/// Derive the message key for the current chain position.
///
/// Uses a different label than [`evolve_chain_key`], so the message key
/// and the next chain key are unrelated.
pub fn derive_message_key(chain_key: &[u8; KEY_SIZE]) -> [u8; KEY_SIZE] {
    hmac_label(chain_key, MESSAGE_LABEL)
}

fn hmac_label(key: &[u8; KEY_SIZE], label: &[u8]) -> [u8; KEY_SIZE] {
    let Ok(mut mac) = HmacSha256::new_from_slice(key) else {
        unreachable!("HMAC-SHA256 accepts any key size");
    };
    mac.update(label);
    let result = mac.finalize().into_bytes();

    let mut out = [0u8; KEY_SIZE];
    out.copy_from_slice(&result);
    out
}

/// A single-use message key produced by [`ChainRatchet::advance`].
///
/// Use it for exactly one encryption or decryption, then drop it; the key
/// bytes are wiped on drop.
pub struct MessageKey {
    key: [u8; KEY_SIZE],
    generation: u32,
}

impl MessageKey {
    /// The 32-byte symmetric key.
    pub fn key(&self) -> &[u8; KEY_SIZE] {
        &self.key
    }

    /// The chain generation this key was derived at.
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl Drop for MessageKey {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

/// Forward-secure chain ratchet.
///
/// Each [`advance()`](Self::advance) call derives the message key for the
/// current generation, evolves the chain key in place, and wipes the old
/// one. Compromise of the current state reveals nothing about earlier
/// message keys.
pub struct ChainRatchet {
    chain_key: [u8; KEY_SIZE],
    generation: u32,
}

impl ChainRatchet {
    /// Start a ratchet from an initial chain key (generation 0).
    pub fn new(chain_key: &[u8; KEY_SIZE]) -> Self {
        Self { chain_key: *chain_key, generation: 0 }
    }

    /// Number of times the ratchet has advanced.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Advance one step and return the message key for the current
    /// generation.
    pub fn advance(&mut self) -> Result<MessageKey, RatchetError> {
        if self.generation == u32::MAX {
            return Err(RatchetError::GenerationOverflow { current: self.generation });
        }

        let message_key = derive_message_key(&self.chain_key);
        let next_chain_key = evolve_chain_key(&self.chain_key);

        // Overwrite the spent chain key; this is the forward-secrecy step.
        self.chain_key.zeroize();
        self.chain_key = next_chain_key;

        let current = self.generation;
        self.generation += 1;

        Ok(MessageKey { key: message_key, generation: current })
    }
}

impl Drop for ChainRatchet {
    fn drop(&mut self) {
        self.chain_key.zeroize();
    }
}
