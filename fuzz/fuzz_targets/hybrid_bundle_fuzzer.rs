//! Fuzz target for hybrid bundle parsing.
//!
//! Keypair deserialization and encapsulation take attacker-supplied
//! bundles; both must reject malformed input with an error, never a
//! panic, an over-read, or a partial result.

#![no_main]

use libfuzzer_sys::fuzz_target;
use sable_crypto::hybrid::{self, HybridKeypair};

fuzz_target!(|data: &[u8]| {
    let _ = HybridKeypair::from_bytes(data);
    let _ = hybrid::encapsulate(data);
});
