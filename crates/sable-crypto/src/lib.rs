//! Sable Cryptographic Core
//!
//! Cryptographic building blocks for the Sable messenger: identity
//! signatures, classical and hybrid post-quantum key agreement, a
//! forward-secure chain ratchet, authenticated encryption, password-based
//! key derivation, and safety numbers. Transport, storage, and session
//! orchestration live in the host application; this crate only turns
//! caller-supplied bytes into other bytes.
//!
//! # Key Lifecycle
//!
//! A channel between two identities is established and evolved as:
//!
//! ```text
//! X25519 / Hybrid KEM Exchange
//!        │
//!        ▼
//! HKDF → Root Key (per channel, per domain label)
//!        │
//!        ▼
//! HMAC split → Directional Chain Keys
//!        │
//!        ▼
//! Chain Ratchet → Message Keys
//!        │
//!        ▼
//! AEAD Encryption → Ciphertext
//! ```
//!
//! Message keys are used for exactly one encryption operation and are
//! discarded immediately; advancing the ratchet wipes the spent chain key,
//! so compromise of current state never exposes earlier messages.
//!
//! # Statelessness
//!
//! Apart from the one-time [`init`] probe, the core holds no state between
//! calls: every operation is a pure function over caller-supplied buffers
//! and is safe to invoke concurrently once [`init`] has returned. Secret
//! buffers (private keys, shared secrets, chain keys) are zeroized before
//! their memory is released, on every path including early failures.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

use std::sync::OnceLock;

use rand::RngCore;
use rand::rngs::OsRng;
use thiserror::Error;
use zeroize::Zeroizing;

pub mod aead;
pub mod agreement;
pub mod hybrid;
pub mod identity;
pub mod password;
pub mod ratchet;
pub mod safety;
pub mod secret;

pub use hybrid::HybridKeypair;
pub use ratchet::{ChainRatchet, MessageKey};
pub use secret::SecretBuffer;

/// Library version, for host display and diagnostics.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

static INIT: OnceLock<()> = OnceLock::new();

/// Errors from process-wide initialization.
#[derive(Debug, Error)]
pub enum InitError {
    /// The OS randomness source could not produce bytes.
    #[error("OS randomness source unavailable")]
    RandomnessUnavailable,
}

/// One-time process-wide initialization.
///
/// Probes the OS randomness source so later key generation cannot fail
/// for lack of entropy. Idempotent: the first successful call completes
/// the setup and every subsequent call returns immediately.
pub fn init() -> Result<(), InitError> {
    if INIT.get().is_some() {
        return Ok(());
    }

    let mut probe = Zeroizing::new([0u8; 32]);
    OsRng.try_fill_bytes(&mut *probe).map_err(|_| InitError::RandomnessUnavailable)?;

    let _ = INIT.set(());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init().unwrap();
        init().unwrap();
    }

    #[test]
    fn version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
