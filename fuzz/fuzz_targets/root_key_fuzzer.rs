//! Fuzz target for root-key derivation.
//!
//! Shared secrets and labels arrive as raw bytes; derivation must accept
//! exactly the 32- and 64-byte secret lengths and reject everything else
//! with an error, never a panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use sable_crypto::ratchet;

fuzz_target!(|data: &[u8]| {
    let split = data.len() / 2;
    let (secret, info) = data.split_at(split);

    let result = ratchet::derive_root_key(secret, info);
    assert_eq!(result.is_ok(), secret.len() == 32 || secret.len() == 64);
});
