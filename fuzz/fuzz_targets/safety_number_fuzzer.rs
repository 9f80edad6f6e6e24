//! Fuzz target for safety number generation and verification.
//!
//! Safety numbers are computed over peer-supplied identity bytes and
//! compared against user-typed candidates; neither path may panic, and
//! symmetry must hold for every input split.

#![no_main]

use libfuzzer_sys::fuzz_target;
use sable_crypto::safety;

fuzz_target!(|data: &[u8]| {
    let split = data.len() / 2;
    let (a, b) = data.split_at(split);

    let forward = safety::generate_safety_number(a, b);
    let backward = safety::generate_safety_number(b, a);
    assert_eq!(forward, backward);

    assert!(safety::verify_safety_number(a, b, &forward));

    // Arbitrary candidate strings must be rejected without panicking.
    if let Ok(candidate) = std::str::from_utf8(data) {
        let _ = safety::verify_safety_number(a, b, candidate);
    }
});
