//! Safety numbers: human-comparable channel fingerprints.
//!
//! Two users confirm nobody sits between them by reading the same 60-digit
//! number aloud. The number is a digest over both identity public keys,
//! canonicalized by sorting the keys lexicographically first, so both
//! devices compute the identical string no matter who runs it or in which
//! argument order.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Number of five-digit groups in a safety number.
pub const SAFETY_NUMBER_GROUPS: usize = 12;

/// Total rendered length: 12 groups of 5 digits, space-separated.
pub const SAFETY_NUMBER_LENGTH: usize = SAFETY_NUMBER_GROUPS * 5 + (SAFETY_NUMBER_GROUPS - 1);

/// Domain label for the fingerprint digest.
const SAFETY_NUMBER_LABEL: &[u8] = b"sable-safety-number-v1";

/// Compute the safety number for two identity public keys.
///
/// Symmetric in its arguments: `generate(a, b) == generate(b, a)`.
pub fn generate_safety_number(identity_a: &[u8], identity_b: &[u8]) -> String {
    let (first, second) =
        if identity_a <= identity_b { (identity_a, identity_b) } else { (identity_b, identity_a) };

    let mut hasher = Sha256::new();
    hasher.update(SAFETY_NUMBER_LABEL);
    hasher.update(first);
    hasher.update(second);
    let digest = hasher.finalize();

    // Twelve overlapping 4-byte windows over the 32-byte digest, each
    // reduced to five decimal digits.
    let mut rendered = String::with_capacity(SAFETY_NUMBER_LENGTH);
    for group in 0..SAFETY_NUMBER_GROUPS {
        if group > 0 {
            rendered.push(' ');
        }
        let offset = (group * 5) % digest.len();
        let window = u32::from_be_bytes([
            digest[offset],
            digest[(offset + 1) % digest.len()],
            digest[(offset + 2) % digest.len()],
            digest[(offset + 3) % digest.len()],
        ]);
        let number = window % 100_000;
        rendered.push_str(&format!("{number:05}"));
    }

    rendered
}

/// Check a candidate string against the computed safety number.
///
/// The comparison is constant-time in the string contents.
pub fn verify_safety_number(identity_a: &[u8], identity_b: &[u8], candidate: &str) -> bool {
    let computed = generate_safety_number(identity_a, identity_b);
    computed.as_bytes().ct_eq(candidate.as_bytes()).into()
}
