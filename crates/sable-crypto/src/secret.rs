//! Owned secret buffers with guaranteed wipe-on-release.
//!
//! Every variable-length secret the crate hands out (hybrid shared secrets,
//! combined key material) is wrapped in [`SecretBuffer`] so the backing
//! memory is zeroized exactly once, when the owner drops it. `Drop` is the
//! single release point; there is no other way to deallocate the buffer.

use std::fmt;

use zeroize::Zeroize;

/// An owned byte buffer holding secret material.
///
/// The contents are wiped before the memory is returned to the allocator.
/// The buffer never implements `Clone`: secret material is consumed where
/// it is produced, not copied around.
pub struct SecretBuffer {
    bytes: Vec<u8>,
}

impl SecretBuffer {
    /// Take ownership of secret bytes.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Borrow the secret contents.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Length of the secret in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl AsRef<[u8]> for SecretBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

// Redacted: secret contents must never reach logs or panic messages.
impl fmt::Debug for SecretBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretBuffer({} bytes)", self.bytes.len())
    }
}

impl Drop for SecretBuffer {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}
