//! C ABI boundary for the Sable cryptographic core.
//!
//! Exposes the core as a flat set of call-style operations for mobile
//! hosts (Swift, Kotlin). The host only marshals bytes; every
//! cryptographic decision stays in Rust.
//!
//! # Ownership protocol
//!
//! Every variable-length buffer and every string returned by this crate is
//! owned by the caller and must be released through the matching free
//! operation, exactly once:
//!
//! - [`ByteBuffer`] → [`sable_free_buffer`]
//! - raw `(pointer, length, capacity)` triple → [`sable_free_bytes`]
//! - `*mut c_char` → [`sable_free_string`]
//!
//! Releasing a buffer twice, or touching it after release, is a contract
//! violation with undefined behavior. Fixed-size outputs are written into
//! caller-provided storage and follow the caller's lifetime. Buffers that
//! held secret material are wiped before their memory is returned to the
//! allocator.
//!
//! # Status convention
//!
//! Every status-returning operation yields `1` on success and `0` on
//! failure, as does the `status` flag in [`KeypairResult`]. Failures never
//! write partial output.

use std::ffi::{CStr, CString, c_char};
use std::mem::ManuallyDrop;
use std::ptr;
use std::slice;

use sable_crypto::{aead, agreement, hybrid, identity, password, ratchet, safety};
use zeroize::Zeroize;

/// Status value for a successful operation.
pub const SABLE_SUCCESS: i32 = 1;

/// Status value for a failed operation.
pub const SABLE_FAILURE: i32 = 0;

/// Owned byte buffer returned to the host.
///
/// Release with [`sable_free_buffer`] exactly once.
#[repr(C)]
pub struct ByteBuffer {
    /// Pointer to the first byte, or null for the empty failure buffer.
    pub data: *mut u8,
    /// Number of valid bytes.
    pub len: usize,
    /// Allocated capacity in bytes.
    pub cap: usize,
}

impl ByteBuffer {
    fn from_vec(bytes: Vec<u8>) -> Self {
        let mut bytes = ManuallyDrop::new(bytes);
        Self { data: bytes.as_mut_ptr(), len: bytes.len(), cap: bytes.capacity() }
    }
}

/// A generated keypair returned to the host by value.
///
/// `status` follows the crate-wide convention; on failure both key arrays
/// are zero. The host owns the private key bytes and must wipe them when
/// done.
#[repr(C)]
pub struct KeypairResult {
    /// 32-byte public key.
    pub public_key: [u8; 32],
    /// 32-byte private key.
    pub private_key: [u8; 32],
    /// `1` on success, `0` on failure.
    pub status: i32,
}

/// Borrow `(ptr, len)` as a slice; empty `len` needs no pointer.
unsafe fn slice_from<'a>(ptr: *const u8, len: usize) -> Option<&'a [u8]> {
    if len == 0 {
        return Some(&[]);
    }
    if ptr.is_null() {
        return None;
    }
    Some(unsafe { slice::from_raw_parts(ptr, len) })
}

/// Write an owned vector into a host-provided `ByteBuffer` slot.
unsafe fn write_buffer(out: *mut ByteBuffer, bytes: Vec<u8>) -> i32 {
    if out.is_null() {
        return SABLE_FAILURE;
    }
    unsafe {
        out.write(ByteBuffer::from_vec(bytes));
    }
    SABLE_SUCCESS
}

// ─────────────────────────── Lifecycle ───────────────────────────

/// One-time process-wide initialization; idempotent.
///
/// Call once before any other operation.
#[unsafe(no_mangle)]
pub extern "C" fn sable_init() -> i32 {
    match sable_crypto::init() {
        Ok(()) => {
            tracing::debug!(version = sable_crypto::VERSION, "sable core initialized");
            SABLE_SUCCESS
        },
        Err(error) => {
            tracing::error!(%error, "sable core initialization failed");
            SABLE_FAILURE
        },
    }
}

/// Library version as an owned C string.
///
/// Release with [`sable_free_string`].
#[unsafe(no_mangle)]
pub extern "C" fn sable_version() -> *mut c_char {
    CString::new(sable_crypto::VERSION).map_or(ptr::null_mut(), CString::into_raw)
}

/// Release a string previously returned by this crate.
///
/// # Safety
///
/// `string` must have been returned by this crate and not freed before.
/// Null is a no-op.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sable_free_string(string: *mut c_char) {
    if string.is_null() {
        return;
    }
    let mut bytes = unsafe { CString::from_raw(string) }.into_bytes();
    bytes.zeroize();
}

/// Release a buffer previously returned by this crate.
///
/// The contents are wiped before the memory is deallocated. Exactly one
/// call per returned buffer.
///
/// # Safety
///
/// `buffer` must be a value previously returned by this crate, unmodified,
/// and not freed before. A null `data` pointer is a no-op.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sable_free_buffer(buffer: ByteBuffer) {
    unsafe { sable_free_bytes(buffer.data, buffer.len, buffer.cap) }
}

/// Release a buffer by its unpacked `(pointer, length, capacity)` triple.
///
/// For hosts whose binding layer flattens [`ByteBuffer`] into separate
/// fields. Same contract as [`sable_free_buffer`]: contents are wiped
/// first, exactly one call per returned buffer.
///
/// # Safety
///
/// `ptr`, `len`, and `cap` must together describe a buffer previously
/// returned by this crate, unmodified and not freed before. A null `ptr`
/// is a no-op.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sable_free_bytes(ptr: *mut u8, len: usize, cap: usize) {
    if ptr.is_null() {
        return;
    }
    unsafe {
        slice::from_raw_parts_mut(ptr, len).zeroize();
        drop(Vec::from_raw_parts(ptr, len, cap));
    }
}

// ─────────────────────────── Identity ───────────────────────────

/// Generate an Ed25519 identity keypair.
#[unsafe(no_mangle)]
pub extern "C" fn sable_generate_identity_keypair() -> KeypairResult {
    let (public_key, private_key) = identity::generate_keypair();
    KeypairResult { public_key, private_key, status: SABLE_SUCCESS }
}

/// Derive the Ed25519 public key from a private key.
///
/// # Safety
///
/// `private_key` must point to 32 readable bytes and `out_public_key` to
/// 32 writable bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sable_identity_public_key(
    private_key: *const u8,
    out_public_key: *mut u8,
) -> i32 {
    if private_key.is_null() || out_public_key.is_null() {
        return SABLE_FAILURE;
    }

    let private_key = unsafe { slice::from_raw_parts(private_key, identity::IDENTITY_KEY_SIZE) };
    match identity::derive_public_key(private_key) {
        Ok(public_key) => {
            unsafe {
                ptr::copy_nonoverlapping(public_key.as_ptr(), out_public_key, public_key.len());
            }
            SABLE_SUCCESS
        },
        Err(_) => SABLE_FAILURE,
    }
}

/// Sign data with an Ed25519 private key, writing a 64-byte signature.
///
/// # Safety
///
/// `data` must point to `data_len` readable bytes (or be unused when
/// `data_len` is 0), `private_key` to 32 readable bytes, and
/// `out_signature` to 64 writable bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sable_sign(
    data: *const u8,
    data_len: usize,
    private_key: *const u8,
    out_signature: *mut u8,
) -> i32 {
    if private_key.is_null() || out_signature.is_null() {
        return SABLE_FAILURE;
    }
    let Some(data) = (unsafe { slice_from(data, data_len) }) else {
        return SABLE_FAILURE;
    };

    let private_key = unsafe { slice::from_raw_parts(private_key, identity::IDENTITY_KEY_SIZE) };
    match identity::sign(data, private_key) {
        Ok(signature) => {
            unsafe {
                ptr::copy_nonoverlapping(signature.as_ptr(), out_signature, signature.len());
            }
            SABLE_SUCCESS
        },
        Err(_) => SABLE_FAILURE,
    }
}

/// Verify an Ed25519 signature. Returns `1` only for a valid signature.
///
/// # Safety
///
/// `data` must point to `data_len` readable bytes (or be unused when
/// `data_len` is 0), `signature` to 64 readable bytes, and `public_key`
/// to 32 readable bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sable_verify(
    data: *const u8,
    data_len: usize,
    signature: *const u8,
    public_key: *const u8,
) -> i32 {
    if signature.is_null() || public_key.is_null() {
        return SABLE_FAILURE;
    }
    let Some(data) = (unsafe { slice_from(data, data_len) }) else {
        return SABLE_FAILURE;
    };

    let signature = unsafe { slice::from_raw_parts(signature, identity::SIGNATURE_SIZE) };
    let public_key = unsafe { slice::from_raw_parts(public_key, identity::IDENTITY_KEY_SIZE) };

    match identity::verify(data, signature, public_key) {
        Ok(true) => SABLE_SUCCESS,
        Ok(false) | Err(_) => SABLE_FAILURE,
    }
}

// ─────────────────────────── Key agreement ───────────────────────────

/// Generate an X25519 exchange keypair.
#[unsafe(no_mangle)]
pub extern "C" fn sable_generate_exchange_keypair() -> KeypairResult {
    let (public_key, private_key) = agreement::generate_keypair();
    KeypairResult { public_key, private_key, status: SABLE_SUCCESS }
}

/// Derive the X25519 public key from a private key.
///
/// # Safety
///
/// `private_key` must point to 32 readable bytes and `out_public_key` to
/// 32 writable bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sable_exchange_public_key(
    private_key: *const u8,
    out_public_key: *mut u8,
) -> i32 {
    if private_key.is_null() || out_public_key.is_null() {
        return SABLE_FAILURE;
    }

    let private_key = unsafe { slice::from_raw_parts(private_key, agreement::EXCHANGE_KEY_SIZE) };
    match agreement::derive_public_key(private_key) {
        Ok(public_key) => {
            unsafe {
                ptr::copy_nonoverlapping(public_key.as_ptr(), out_public_key, public_key.len());
            }
            SABLE_SUCCESS
        },
        Err(_) => SABLE_FAILURE,
    }
}

/// Derive the X25519 shared secret into 32 caller-provided bytes.
///
/// # Safety
///
/// `our_private_key` and `their_public_key` must each point to 32 readable
/// bytes; `out_shared_secret` must point to 32 writable bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sable_diffie_hellman(
    our_private_key: *const u8,
    their_public_key: *const u8,
    out_shared_secret: *mut u8,
) -> i32 {
    if our_private_key.is_null() || their_public_key.is_null() || out_shared_secret.is_null() {
        return SABLE_FAILURE;
    }

    let our_private =
        unsafe { slice::from_raw_parts(our_private_key, agreement::EXCHANGE_KEY_SIZE) };
    let their_public =
        unsafe { slice::from_raw_parts(their_public_key, agreement::EXCHANGE_KEY_SIZE) };

    match agreement::diffie_hellman(our_private, their_public) {
        Ok(mut shared) => {
            unsafe {
                ptr::copy_nonoverlapping(shared.as_ptr(), out_shared_secret, shared.len());
            }
            shared.zeroize();
            SABLE_SUCCESS
        },
        Err(_) => SABLE_FAILURE,
    }
}

// ─────────────────────────── Hybrid KEM ───────────────────────────

/// Generate a hybrid X25519 + ML-KEM-1024 keypair.
///
/// Writes the serialized keypair (secrets included; destined for the host
/// keystore) and the shareable public bundle. Both use the versioned
/// layouts documented in the core crate. Release both buffers with
/// [`sable_free_buffer`].
///
/// # Safety
///
/// `out_keypair` and `out_public_bundle` must be valid writable slots.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sable_generate_hybrid_keypair(
    out_keypair: *mut ByteBuffer,
    out_public_bundle: *mut ByteBuffer,
) -> i32 {
    if out_keypair.is_null() || out_public_bundle.is_null() {
        return SABLE_FAILURE;
    }

    let Ok(keypair) = hybrid::HybridKeypair::generate() else {
        return SABLE_FAILURE;
    };

    let public_bundle = keypair.public_bundle();
    let keypair_bytes = keypair.to_bytes().as_bytes().to_vec();

    unsafe {
        write_buffer(out_keypair, keypair_bytes);
        write_buffer(out_public_bundle, public_bundle);
    }
    SABLE_SUCCESS
}

/// Encapsulate a fresh shared secret to a peer's public bundle.
///
/// Writes the 64-byte combined secret and the ciphertext bundle to send.
/// Release both buffers with [`sable_free_buffer`].
///
/// # Safety
///
/// `public_bundle` must point to `bundle_len` readable bytes;
/// `out_shared_secret` and `out_ciphertext` must be valid writable slots.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sable_hybrid_encapsulate(
    public_bundle: *const u8,
    bundle_len: usize,
    out_shared_secret: *mut ByteBuffer,
    out_ciphertext: *mut ByteBuffer,
) -> i32 {
    if out_shared_secret.is_null() || out_ciphertext.is_null() {
        return SABLE_FAILURE;
    }
    let Some(bundle) = (unsafe { slice_from(public_bundle, bundle_len) }) else {
        return SABLE_FAILURE;
    };

    match hybrid::encapsulate(bundle) {
        Ok((shared_secret, ciphertext)) => {
            unsafe {
                write_buffer(out_shared_secret, shared_secret.as_bytes().to_vec());
                write_buffer(out_ciphertext, ciphertext);
            }
            SABLE_SUCCESS
        },
        Err(_) => SABLE_FAILURE,
    }
}

/// Recover the shared secret from a hybrid ciphertext bundle.
///
/// Release the secret buffer with [`sable_free_buffer`].
///
/// # Safety
///
/// `keypair_bytes` and `ciphertext` must point to their stated lengths;
/// `out_shared_secret` must be a valid writable slot.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sable_hybrid_decapsulate(
    keypair_bytes: *const u8,
    keypair_len: usize,
    ciphertext: *const u8,
    ciphertext_len: usize,
    out_shared_secret: *mut ByteBuffer,
) -> i32 {
    if out_shared_secret.is_null() {
        return SABLE_FAILURE;
    }
    let Some(keypair_bytes) = (unsafe { slice_from(keypair_bytes, keypair_len) }) else {
        return SABLE_FAILURE;
    };
    let Some(ciphertext) = (unsafe { slice_from(ciphertext, ciphertext_len) }) else {
        return SABLE_FAILURE;
    };

    let Ok(keypair) = hybrid::HybridKeypair::from_bytes(keypair_bytes) else {
        return SABLE_FAILURE;
    };

    match hybrid::decapsulate(&keypair, ciphertext) {
        Ok(shared_secret) => {
            unsafe { write_buffer(out_shared_secret, shared_secret.as_bytes().to_vec()) }
        },
        Err(_) => SABLE_FAILURE,
    }
}

// ─────────────────────────── Ratchet KDF ───────────────────────────

/// Derive a 32-byte root key from a shared secret and a domain label.
///
/// # Safety
///
/// `shared_secret` and `info` must point to their stated lengths;
/// `out_root_key` must point to 32 writable bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sable_derive_root_key(
    shared_secret: *const u8,
    secret_len: usize,
    info: *const u8,
    info_len: usize,
    out_root_key: *mut u8,
) -> i32 {
    if out_root_key.is_null() {
        return SABLE_FAILURE;
    }
    let Some(shared_secret) = (unsafe { slice_from(shared_secret, secret_len) }) else {
        return SABLE_FAILURE;
    };
    let Some(info) = (unsafe { slice_from(info, info_len) }) else {
        return SABLE_FAILURE;
    };

    match ratchet::derive_root_key(shared_secret, info) {
        Ok(mut root_key) => {
            unsafe {
                ptr::copy_nonoverlapping(root_key.as_ptr(), out_root_key, root_key.len());
            }
            root_key.zeroize();
            SABLE_SUCCESS
        },
        Err(_) => SABLE_FAILURE,
    }
}

/// Split a root key into this party's sending and receiving chain keys.
///
/// Direction is fixed by lexicographic comparison of the identifiers, so
/// both parties derive mirrored chains.
///
/// # Safety
///
/// `root_key` must point to 32 readable bytes; the id arguments to their
/// stated lengths; `out_sending` and `out_receiving` to 32 writable bytes
/// each.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sable_derive_chain_keys(
    root_key: *const u8,
    our_id: *const u8,
    our_id_len: usize,
    their_id: *const u8,
    their_id_len: usize,
    out_sending: *mut u8,
    out_receiving: *mut u8,
) -> i32 {
    if root_key.is_null() || out_sending.is_null() || out_receiving.is_null() {
        return SABLE_FAILURE;
    }
    let Some(our_id) = (unsafe { slice_from(our_id, our_id_len) }) else {
        return SABLE_FAILURE;
    };
    let Some(their_id) = (unsafe { slice_from(their_id, their_id_len) }) else {
        return SABLE_FAILURE;
    };

    let mut root = [0u8; ratchet::KEY_SIZE];
    unsafe {
        ptr::copy_nonoverlapping(root_key, root.as_mut_ptr(), root.len());
    }

    let (mut sending, mut receiving) = ratchet::derive_chain_keys(&root, our_id, their_id);
    root.zeroize();

    unsafe {
        ptr::copy_nonoverlapping(sending.as_ptr(), out_sending, sending.len());
        ptr::copy_nonoverlapping(receiving.as_ptr(), out_receiving, receiving.len());
    }
    sending.zeroize();
    receiving.zeroize();
    SABLE_SUCCESS
}

/// Evolve a chain key one step; the input is left untouched.
///
/// # Safety
///
/// `chain_key` must point to 32 readable bytes and `out_next_key` to 32
/// writable bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sable_evolve_chain_key(
    chain_key: *const u8,
    out_next_key: *mut u8,
) -> i32 {
    unsafe { derive_from_chain(chain_key, out_next_key, ratchet::evolve_chain_key) }
}

/// Derive the message key for the current chain position.
///
/// # Safety
///
/// `chain_key` must point to 32 readable bytes and `out_message_key` to 32
/// writable bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sable_derive_message_key(
    chain_key: *const u8,
    out_message_key: *mut u8,
) -> i32 {
    unsafe { derive_from_chain(chain_key, out_message_key, ratchet::derive_message_key) }
}

unsafe fn derive_from_chain(
    chain_key: *const u8,
    out_key: *mut u8,
    derive: fn(&[u8; ratchet::KEY_SIZE]) -> [u8; ratchet::KEY_SIZE],
) -> i32 {
    if chain_key.is_null() || out_key.is_null() {
        return SABLE_FAILURE;
    }

    let mut chain = [0u8; ratchet::KEY_SIZE];
    unsafe {
        ptr::copy_nonoverlapping(chain_key, chain.as_mut_ptr(), chain.len());
    }

    let mut derived = derive(&chain);
    chain.zeroize();

    unsafe {
        ptr::copy_nonoverlapping(derived.as_ptr(), out_key, derived.len());
    }
    derived.zeroize();
    SABLE_SUCCESS
}

// ─────────────────────────── AEAD ───────────────────────────

/// Generate a random 32-byte symmetric key.
///
/// # Safety
///
/// `out_key` must point to 32 writable bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sable_generate_key(out_key: *mut u8) -> i32 {
    if out_key.is_null() {
        return SABLE_FAILURE;
    }

    let mut key = aead::generate_key();
    unsafe {
        ptr::copy_nonoverlapping(key.as_ptr(), out_key, key.len());
    }
    key.zeroize();
    SABLE_SUCCESS
}

/// Encrypt a message; the output buffer is `nonce || ciphertext || tag`.
///
/// Release the buffer with [`sable_free_buffer`].
///
/// # Safety
///
/// `plaintext` must point to `plaintext_len` readable bytes (or be unused
/// when the length is 0), `key` to 32 readable bytes, and
/// `out_ciphertext` must be a valid writable slot.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sable_encrypt(
    plaintext: *const u8,
    plaintext_len: usize,
    key: *const u8,
    out_ciphertext: *mut ByteBuffer,
) -> i32 {
    if key.is_null() || out_ciphertext.is_null() {
        return SABLE_FAILURE;
    }
    let Some(plaintext) = (unsafe { slice_from(plaintext, plaintext_len) }) else {
        return SABLE_FAILURE;
    };

    let mut key_bytes = [0u8; aead::KEY_SIZE];
    unsafe {
        ptr::copy_nonoverlapping(key, key_bytes.as_mut_ptr(), key_bytes.len());
    }

    let result = aead::encrypt(plaintext, &key_bytes);
    key_bytes.zeroize();

    match result {
        Ok(ciphertext) => unsafe { write_buffer(out_ciphertext, ciphertext) },
        Err(_) => SABLE_FAILURE,
    }
}

/// Verify and decrypt a message produced by [`sable_encrypt`].
///
/// Release the buffer with [`sable_free_buffer`]. On failure no plaintext
/// is written.
///
/// # Safety
///
/// `data` must point to `data_len` readable bytes, `key` to 32 readable
/// bytes, and `out_plaintext` must be a valid writable slot.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sable_decrypt(
    data: *const u8,
    data_len: usize,
    key: *const u8,
    out_plaintext: *mut ByteBuffer,
) -> i32 {
    if key.is_null() || out_plaintext.is_null() {
        return SABLE_FAILURE;
    }
    let Some(data) = (unsafe { slice_from(data, data_len) }) else {
        return SABLE_FAILURE;
    };

    let mut key_bytes = [0u8; aead::KEY_SIZE];
    unsafe {
        ptr::copy_nonoverlapping(key, key_bytes.as_mut_ptr(), key_bytes.len());
    }

    let result = aead::decrypt(data, &key_bytes);
    key_bytes.zeroize();

    match result {
        Ok(plaintext) => unsafe { write_buffer(out_plaintext, plaintext) },
        Err(_) => SABLE_FAILURE,
    }
}

// ─────────────────────────── Password KDF ───────────────────────────

/// Hash a password for storage; returns a PHC string or null on failure.
///
/// Release the string with [`sable_free_string`]. Memory-hard and slow;
/// call from a worker thread.
///
/// # Safety
///
/// `password` must be a valid NUL-terminated C string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sable_hash_password(password: *const c_char) -> *mut c_char {
    let Some(password) = (unsafe { str_from(password) }) else {
        return ptr::null_mut();
    };

    match password::hash_password(password) {
        Ok(encoded) => CString::new(encoded).map_or(ptr::null_mut(), CString::into_raw),
        Err(_) => ptr::null_mut(),
    }
}

/// Verify a password against a stored PHC hash.
///
/// Returns `1` only when the password matches.
///
/// # Safety
///
/// `password` and `encoded_hash` must be valid NUL-terminated C strings.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sable_verify_password(
    password: *const c_char,
    encoded_hash: *const c_char,
) -> i32 {
    let Some(password) = (unsafe { str_from(password) }) else {
        return SABLE_FAILURE;
    };
    let Some(encoded_hash) = (unsafe { str_from(encoded_hash) }) else {
        return SABLE_FAILURE;
    };

    match password::verify_password(password, encoded_hash) {
        Ok(true) => SABLE_SUCCESS,
        Ok(false) | Err(_) => SABLE_FAILURE,
    }
}

/// Derive a 32-byte key from a password and caller-held salt.
///
/// Deterministic per `(password, salt)`. Memory-hard and slow; call from
/// a worker thread.
///
/// # Safety
///
/// `password` must be a valid NUL-terminated C string, `salt` must point
/// to `salt_len` readable bytes, and `out_key` to 32 writable bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sable_derive_key_from_password(
    password: *const c_char,
    salt: *const u8,
    salt_len: usize,
    out_key: *mut u8,
) -> i32 {
    if out_key.is_null() {
        return SABLE_FAILURE;
    }
    let Some(password) = (unsafe { str_from(password) }) else {
        return SABLE_FAILURE;
    };
    let Some(salt) = (unsafe { slice_from(salt, salt_len) }) else {
        return SABLE_FAILURE;
    };

    match password::derive_key_from_password(password, salt) {
        Ok(mut key) => {
            unsafe {
                ptr::copy_nonoverlapping(key.as_ptr(), out_key, key.len());
            }
            key.zeroize();
            SABLE_SUCCESS
        },
        Err(_) => SABLE_FAILURE,
    }
}

/// Generate a random 16-byte salt for key derivation.
///
/// # Safety
///
/// `out_salt` must point to 16 writable bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sable_generate_salt(out_salt: *mut u8) -> i32 {
    if out_salt.is_null() {
        return SABLE_FAILURE;
    }

    let salt = password::generate_salt();
    unsafe {
        ptr::copy_nonoverlapping(salt.as_ptr(), out_salt, salt.len());
    }
    SABLE_SUCCESS
}

// ─────────────────────────── Safety numbers ───────────────────────────

/// Compute the safety number for two 32-byte identity public keys.
///
/// Symmetric in its arguments. Release the string with
/// [`sable_free_string`].
///
/// # Safety
///
/// `identity_a` and `identity_b` must each point to 32 readable bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sable_safety_number(
    identity_a: *const u8,
    identity_b: *const u8,
) -> *mut c_char {
    if identity_a.is_null() || identity_b.is_null() {
        return ptr::null_mut();
    }

    let identity_a = unsafe { slice::from_raw_parts(identity_a, identity::IDENTITY_KEY_SIZE) };
    let identity_b = unsafe { slice::from_raw_parts(identity_b, identity::IDENTITY_KEY_SIZE) };

    let rendered = safety::generate_safety_number(identity_a, identity_b);
    CString::new(rendered).map_or(ptr::null_mut(), CString::into_raw)
}

/// Check a candidate safety number string in constant time.
///
/// Returns `1` only when the candidate matches.
///
/// # Safety
///
/// `identity_a` and `identity_b` must each point to 32 readable bytes and
/// `candidate` must be a valid NUL-terminated C string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sable_verify_safety_number(
    identity_a: *const u8,
    identity_b: *const u8,
    candidate: *const c_char,
) -> i32 {
    if identity_a.is_null() || identity_b.is_null() {
        return SABLE_FAILURE;
    }
    let Some(candidate) = (unsafe { str_from(candidate) }) else {
        return SABLE_FAILURE;
    };

    let identity_a = unsafe { slice::from_raw_parts(identity_a, identity::IDENTITY_KEY_SIZE) };
    let identity_b = unsafe { slice::from_raw_parts(identity_b, identity::IDENTITY_KEY_SIZE) };

    if safety::verify_safety_number(identity_a, identity_b, candidate) {
        SABLE_SUCCESS
    } else {
        SABLE_FAILURE
    }
}

/// Borrow a NUL-terminated C string as UTF-8.
unsafe fn str_from<'a>(string: *const c_char) -> Option<&'a str> {
    if string.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(string) }.to_str().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn take_buffer(buffer: &ByteBuffer) -> Vec<u8> {
        unsafe { slice::from_raw_parts(buffer.data, buffer.len) }.to_vec()
    }

    fn empty_buffer() -> ByteBuffer {
        ByteBuffer { data: ptr::null_mut(), len: 0, cap: 0 }
    }

    #[test]
    fn init_reports_success() {
        assert_eq!(sable_init(), SABLE_SUCCESS);
        assert_eq!(sable_init(), SABLE_SUCCESS);
    }

    #[test]
    fn version_string_roundtrip() {
        let version = sable_version();
        assert!(!version.is_null());

        let text = unsafe { CStr::from_ptr(version) }.to_str().unwrap().to_owned();
        assert_eq!(text, sable_crypto::VERSION);

        unsafe { sable_free_string(version) };
    }

    #[test]
    fn identity_sign_verify_through_the_boundary() {
        let keypair = sable_generate_identity_keypair();
        assert_eq!(keypair.status, SABLE_SUCCESS);

        let data = b"boundary-crossing message";
        let mut signature = [0u8; 64];
        let status = unsafe {
            sable_sign(
                data.as_ptr(),
                data.len(),
                keypair.private_key.as_ptr(),
                signature.as_mut_ptr(),
            )
        };
        assert_eq!(status, SABLE_SUCCESS);

        let verdict = unsafe {
            sable_verify(data.as_ptr(), data.len(), signature.as_ptr(), keypair.public_key.as_ptr())
        };
        assert_eq!(verdict, SABLE_SUCCESS);

        let tampered = b"boundary-crossing messagE";
        let verdict = unsafe {
            sable_verify(
                tampered.as_ptr(),
                tampered.len(),
                signature.as_ptr(),
                keypair.public_key.as_ptr(),
            )
        };
        assert_eq!(verdict, SABLE_FAILURE);
    }

    #[test]
    fn derived_identity_public_key_matches() {
        let keypair = sable_generate_identity_keypair();

        let mut derived = [0u8; 32];
        let status = unsafe {
            sable_identity_public_key(keypair.private_key.as_ptr(), derived.as_mut_ptr())
        };
        assert_eq!(status, SABLE_SUCCESS);
        assert_eq!(derived, keypair.public_key);
    }

    #[test]
    fn diffie_hellman_commutes_through_the_boundary() {
        let alice = sable_generate_exchange_keypair();
        let bob = sable_generate_exchange_keypair();
        assert_eq!(alice.status, SABLE_SUCCESS);
        assert_eq!(bob.status, SABLE_SUCCESS);

        let mut secret_ab = [0u8; 32];
        let mut secret_ba = [0u8; 32];

        let status = unsafe {
            sable_diffie_hellman(
                alice.private_key.as_ptr(),
                bob.public_key.as_ptr(),
                secret_ab.as_mut_ptr(),
            )
        };
        assert_eq!(status, SABLE_SUCCESS);

        let status = unsafe {
            sable_diffie_hellman(
                bob.private_key.as_ptr(),
                alice.public_key.as_ptr(),
                secret_ba.as_mut_ptr(),
            )
        };
        assert_eq!(status, SABLE_SUCCESS);

        assert_eq!(secret_ab, secret_ba);
    }

    #[test]
    fn encrypt_decrypt_through_byte_buffers() {
        let mut key = [0u8; 32];
        assert_eq!(unsafe { sable_generate_key(key.as_mut_ptr()) }, SABLE_SUCCESS);

        let plaintext = b"owned across the boundary";
        let mut ciphertext = empty_buffer();
        let status = unsafe {
            sable_encrypt(plaintext.as_ptr(), plaintext.len(), key.as_ptr(), &raw mut ciphertext)
        };
        assert_eq!(status, SABLE_SUCCESS);
        assert!(!ciphertext.data.is_null());

        let ciphertext_bytes = take_buffer(&ciphertext);
        let mut plaintext_out = empty_buffer();
        let status = unsafe {
            sable_decrypt(
                ciphertext_bytes.as_ptr(),
                ciphertext_bytes.len(),
                key.as_ptr(),
                &raw mut plaintext_out,
            )
        };
        assert_eq!(status, SABLE_SUCCESS);
        assert_eq!(take_buffer(&plaintext_out), plaintext);

        unsafe {
            sable_free_buffer(ciphertext);
            sable_free_buffer(plaintext_out);
        }
    }

    #[test]
    fn unpacked_buffer_release_is_equivalent() {
        let mut key = [0u8; 32];
        assert_eq!(unsafe { sable_generate_key(key.as_mut_ptr()) }, SABLE_SUCCESS);

        let plaintext = b"released by parts";
        let mut ciphertext = empty_buffer();
        let status = unsafe {
            sable_encrypt(plaintext.as_ptr(), plaintext.len(), key.as_ptr(), &raw mut ciphertext)
        };
        assert_eq!(status, SABLE_SUCCESS);

        // A host that flattened the record frees through the triple form.
        unsafe { sable_free_bytes(ciphertext.data, ciphertext.len, ciphertext.cap) };
    }

    #[test]
    fn decrypt_failure_writes_nothing() {
        let mut key = [0u8; 32];
        assert_eq!(unsafe { sable_generate_key(key.as_mut_ptr()) }, SABLE_SUCCESS);

        let garbage = [0u8; 8];
        let mut plaintext_out = empty_buffer();
        let status = unsafe {
            sable_decrypt(garbage.as_ptr(), garbage.len(), key.as_ptr(), &raw mut plaintext_out)
        };
        assert_eq!(status, SABLE_FAILURE);
        assert!(plaintext_out.data.is_null());
    }

    #[test]
    fn hybrid_exchange_through_the_boundary() {
        let mut keypair = empty_buffer();
        let mut bundle = empty_buffer();
        let status = unsafe { sable_generate_hybrid_keypair(&raw mut keypair, &raw mut bundle) };
        assert_eq!(status, SABLE_SUCCESS);

        let bundle_bytes = take_buffer(&bundle);
        let mut sender_secret = empty_buffer();
        let mut ciphertext = empty_buffer();
        let status = unsafe {
            sable_hybrid_encapsulate(
                bundle_bytes.as_ptr(),
                bundle_bytes.len(),
                &raw mut sender_secret,
                &raw mut ciphertext,
            )
        };
        assert_eq!(status, SABLE_SUCCESS);

        let keypair_bytes = take_buffer(&keypair);
        let ciphertext_bytes = take_buffer(&ciphertext);
        let mut receiver_secret = empty_buffer();
        let status = unsafe {
            sable_hybrid_decapsulate(
                keypair_bytes.as_ptr(),
                keypair_bytes.len(),
                ciphertext_bytes.as_ptr(),
                ciphertext_bytes.len(),
                &raw mut receiver_secret,
            )
        };
        assert_eq!(status, SABLE_SUCCESS);
        assert_eq!(take_buffer(&sender_secret), take_buffer(&receiver_secret));

        unsafe {
            sable_free_buffer(keypair);
            sable_free_buffer(bundle);
            sable_free_buffer(sender_secret);
            sable_free_buffer(ciphertext);
            sable_free_buffer(receiver_secret);
        }
    }

    #[test]
    fn ratchet_operations_through_the_boundary() {
        let shared_secret = [0x42u8; 32];
        let label = b"channel-v1";

        let mut root = [0u8; 32];
        let status = unsafe {
            sable_derive_root_key(
                shared_secret.as_ptr(),
                shared_secret.len(),
                label.as_ptr(),
                label.len(),
                root.as_mut_ptr(),
            )
        };
        assert_eq!(status, SABLE_SUCCESS);

        let mut sending = [0u8; 32];
        let mut receiving = [0u8; 32];
        let status = unsafe {
            sable_derive_chain_keys(
                root.as_ptr(),
                b"alice".as_ptr(),
                5,
                b"bob".as_ptr(),
                3,
                sending.as_mut_ptr(),
                receiving.as_mut_ptr(),
            )
        };
        assert_eq!(status, SABLE_SUCCESS);
        assert_ne!(sending, receiving);

        let mut next = [0u8; 32];
        let mut message_key = [0u8; 32];
        assert_eq!(
            unsafe { sable_evolve_chain_key(sending.as_ptr(), next.as_mut_ptr()) },
            SABLE_SUCCESS
        );
        assert_eq!(
            unsafe { sable_derive_message_key(sending.as_ptr(), message_key.as_mut_ptr()) },
            SABLE_SUCCESS
        );
        assert_ne!(next, sending);
        assert_ne!(next, message_key);
    }

    #[test]
    fn password_flow_through_the_boundary() {
        let password = CString::new("boundary passphrase").unwrap();

        let encoded = unsafe { sable_hash_password(password.as_ptr()) };
        assert!(!encoded.is_null());

        let verdict = unsafe { sable_verify_password(password.as_ptr(), encoded) };
        assert_eq!(verdict, SABLE_SUCCESS);

        let wrong = CString::new("other passphrase").unwrap();
        let verdict = unsafe { sable_verify_password(wrong.as_ptr(), encoded) };
        assert_eq!(verdict, SABLE_FAILURE);

        unsafe { sable_free_string(encoded) };

        let mut salt = [0u8; 16];
        assert_eq!(unsafe { sable_generate_salt(salt.as_mut_ptr()) }, SABLE_SUCCESS);

        let mut key_a = [0u8; 32];
        let mut key_b = [0u8; 32];
        let status = unsafe {
            sable_derive_key_from_password(
                password.as_ptr(),
                salt.as_ptr(),
                salt.len(),
                key_a.as_mut_ptr(),
            )
        };
        assert_eq!(status, SABLE_SUCCESS);
        let status = unsafe {
            sable_derive_key_from_password(
                password.as_ptr(),
                salt.as_ptr(),
                salt.len(),
                key_b.as_mut_ptr(),
            )
        };
        assert_eq!(status, SABLE_SUCCESS);
        assert_eq!(key_a, key_b);
    }

    #[test]
    fn safety_number_through_the_boundary() {
        let alice = sable_generate_identity_keypair();
        let bob = sable_generate_identity_keypair();

        let forward =
            unsafe { sable_safety_number(alice.public_key.as_ptr(), bob.public_key.as_ptr()) };
        let backward =
            unsafe { sable_safety_number(bob.public_key.as_ptr(), alice.public_key.as_ptr()) };
        assert!(!forward.is_null() && !backward.is_null());

        let forward_text = unsafe { CStr::from_ptr(forward) }.to_owned();
        assert_eq!(forward_text.as_c_str(), unsafe { CStr::from_ptr(backward) });

        let verdict = unsafe {
            sable_verify_safety_number(
                alice.public_key.as_ptr(),
                bob.public_key.as_ptr(),
                forward_text.as_ptr(),
            )
        };
        assert_eq!(verdict, SABLE_SUCCESS);

        unsafe {
            sable_free_string(forward);
            sable_free_string(backward);
        }
    }

    #[test]
    fn null_arguments_fail_without_writing() {
        assert_eq!(
            unsafe { sable_identity_public_key(ptr::null(), ptr::null_mut()) },
            SABLE_FAILURE
        );
        assert_eq!(
            unsafe { sable_diffie_hellman(ptr::null(), ptr::null(), ptr::null_mut()) },
            SABLE_FAILURE
        );
        assert_eq!(unsafe { sable_generate_key(ptr::null_mut()) }, SABLE_FAILURE);
        assert!(unsafe { sable_hash_password(ptr::null()) }.is_null());

        // Freeing the null buffer and the null string are no-ops.
        unsafe {
            sable_free_buffer(ByteBuffer { data: ptr::null_mut(), len: 0, cap: 0 });
            sable_free_bytes(ptr::null_mut(), 0, 0);
            sable_free_string(ptr::null_mut());
        }
    }
}
