//! Low-level cryptographic operations.
//!
//! This module is the only place in the crate that imports `ring` directly
//! (`keys` is likewise the only importer of `k256`). All other modules
//! encrypt, derive, and authenticate exclusively through the functions
//! exposed here.
//!
//! Primitive choices:
//! - **Cipher**: AES-256-GCM (authenticated encryption)
//! - **Nonce**: 96-bit (12 bytes), caller-supplied — the vault and content
//!   wire formats carry the IV in their own fields, so it is never bundled
//!   into the ciphertext here
//! - **Key derivation**: HKDF-SHA256 (vault envelope), PBKDF2-HMAC-SHA256
//!   with 10,000 iterations (content gate)
//! - **Integrity**: HMAC-SHA256 with constant-time verification

use std::num::NonZeroU32;

use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM};
use ring::rand::{SecureRandom, SystemRandom};
use ring::{hkdf, hmac, pbkdf2};

use crate::error::VaultError;

/// Size of a symmetric key in bytes (256 bits).
pub const KEY_LEN: usize = 32;

/// Size of an AES-GCM nonce in bytes (96 bits).
pub const NONCE_LEN: usize = 12;

/// Size of the HKDF salt in the vault envelope (256 bits).
pub const SALT_LEN: usize = 32;

/// Size of an HMAC-SHA256 tag in bytes.
pub const MAC_LEN: usize = 32;

/// PBKDF2 iteration count for content-gate key derivation.
pub const PBKDF2_ITERATIONS: u32 = 10_000;

// Checked at compile time; `pbkdf2::derive` requires a non-zero count.
const PBKDF2_ITERATIONS_NZ: NonZeroU32 = match NonZeroU32::new(PBKDF2_ITERATIONS) {
    Some(n) => n,
    None => panic!("iteration count must be non-zero"),
};

/// Fill a buffer with cryptographically secure random bytes.
///
/// Uses `ring::rand::SystemRandom` — the only source of randomness in the
/// crate. There is deliberately no fallback: if the platform RNG fails, the
/// operation fails. A non-cryptographic substitute would silently produce
/// recoverable keys.
pub(crate) fn fill_random(buf: &mut [u8]) -> Result<(), VaultError> {
    let rng = SystemRandom::new();
    rng.fill(buf).map_err(|_| VaultError::RandomnessFailure)
}

/// Draw `len` cryptographically secure random bytes.
pub(crate) fn random_bytes(len: usize) -> Result<Vec<u8>, VaultError> {
    let mut buf = vec![0u8; len];
    fill_random(&mut buf)?;
    Ok(buf)
}

/// Encrypt a plaintext payload with AES-256-GCM under an explicit nonce.
///
/// Returns the ciphertext with the GCM authentication tag appended. The
/// nonce is not prepended — callers place it in their wire format and must
/// never reuse one under the same key (every call site draws a fresh nonce
/// via `fill_random`).
pub(crate) fn aead_seal(
    key_bytes: &[u8; KEY_LEN],
    nonce: &[u8; NONCE_LEN],
    plaintext: &[u8],
) -> Result<Vec<u8>, VaultError> {
    let unbound = UnboundKey::new(&AES_256_GCM, key_bytes).map_err(|_| VaultError::InvalidKey)?;
    let key = LessSafeKey::new(unbound);

    let mut in_out = plaintext.to_vec();
    key.seal_in_place_append_tag(Nonce::assume_unique_for_key(*nonce), Aad::empty(), &mut in_out)
        .map_err(|_| VaultError::EncryptionFailure)?;

    Ok(in_out)
}

/// Decrypt an AES-256-GCM payload produced by `aead_seal`.
///
/// If the key is wrong or the ciphertext has been tampered with, the GCM
/// authentication check fails and this function returns an error. The
/// caller receives no partial plaintext.
pub(crate) fn aead_open(
    key_bytes: &[u8; KEY_LEN],
    nonce: &[u8; NONCE_LEN],
    ciphertext: &[u8],
) -> Result<Vec<u8>, VaultError> {
    if ciphertext.len() < AES_256_GCM.tag_len() {
        return Err(VaultError::DecryptionFailure);
    }

    let unbound = UnboundKey::new(&AES_256_GCM, key_bytes).map_err(|_| VaultError::InvalidKey)?;
    let key = LessSafeKey::new(unbound);

    let mut in_out = ciphertext.to_vec();
    let plaintext = key
        .open_in_place(Nonce::assume_unique_for_key(*nonce), Aad::empty(), &mut in_out)
        .map_err(|_| VaultError::DecryptionFailure)?;

    Ok(plaintext.to_vec())
}

/// Derive a 256-bit key via HKDF-SHA256.
///
/// Extract-then-expand over the input keying material with an explicit salt
/// and context string. Different salts or info strings produce statistically
/// independent outputs; HKDF is one-way, so the derived key reveals nothing
/// about the shared secret it came from.
pub(crate) fn hkdf_sha256(
    ikm: &[u8],
    salt: &[u8],
    info: &[u8],
) -> Result<[u8; KEY_LEN], VaultError> {
    let salt = hkdf::Salt::new(hkdf::HKDF_SHA256, salt);
    let prk = salt.extract(ikm);
    let info = [info];
    let okm = prk
        .expand(&info, hkdf::HKDF_SHA256)
        .map_err(|_| VaultError::KeyDerivationFailure)?;

    let mut derived = [0u8; KEY_LEN];
    okm.fill(&mut derived)
        .map_err(|_| VaultError::KeyDerivationFailure)?;
    Ok(derived)
}

/// Derive a 256-bit key via PBKDF2-HMAC-SHA256.
///
/// Deterministic: the same secret and salt always yield the same key. The
/// content gate relies on this — the tier key segment itself is the secret,
/// not a random seed.
pub(crate) fn pbkdf2_sha256(secret: &[u8], salt: &[u8]) -> [u8; KEY_LEN] {
    let mut derived = [0u8; KEY_LEN];
    pbkdf2::derive(
        pbkdf2::PBKDF2_HMAC_SHA256,
        PBKDF2_ITERATIONS_NZ,
        salt,
        secret,
        &mut derived,
    );
    derived
}

/// Compute HMAC-SHA256 over a message.
pub(crate) fn hmac_sign(key_bytes: &[u8; KEY_LEN], message: &[u8]) -> [u8; MAC_LEN] {
    let key = hmac::Key::new(hmac::HMAC_SHA256, key_bytes);
    let tag = hmac::sign(&key, message);
    let mut out = [0u8; MAC_LEN];
    out.copy_from_slice(tag.as_ref());
    out
}

/// Verify an HMAC-SHA256 tag in constant time.
///
/// `ring::hmac::verify` recomputes the tag and compares without
/// early-exiting on the first mismatched byte, so a failed integrity check
/// is not timing-distinguishable by tag prefix.
pub(crate) fn hmac_verify(
    key_bytes: &[u8; KEY_LEN],
    message: &[u8],
    tag: &[u8],
) -> Result<(), VaultError> {
    let key = hmac::Key::new(hmac::HMAC_SHA256, key_bytes);
    hmac::verify(&key, message, tag).map_err(|_| VaultError::IntegrityCheckFailure)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aead_roundtrip_and_tamper() {
        let key = [7u8; KEY_LEN];
        let nonce = [1u8; NONCE_LEN];

        let sealed = aead_seal(&key, &nonce, b"payload").unwrap();
        assert_eq!(aead_open(&key, &nonce, &sealed).unwrap(), b"payload");

        let mut tampered = sealed.clone();
        tampered[0] ^= 0x01;
        assert!(aead_open(&key, &nonce, &tampered).is_err());

        let wrong_key = [8u8; KEY_LEN];
        assert!(aead_open(&wrong_key, &nonce, &sealed).is_err());
    }

    #[test]
    fn test_hkdf_is_deterministic_and_salt_sensitive() {
        let a = hkdf_sha256(b"shared", &[0u8; SALT_LEN], b"ctx").unwrap();
        let b = hkdf_sha256(b"shared", &[0u8; SALT_LEN], b"ctx").unwrap();
        let c = hkdf_sha256(b"shared", &[1u8; SALT_LEN], b"ctx").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_hmac_verify_rejects_flipped_tag() {
        let key = [3u8; KEY_LEN];
        let mut tag = hmac_sign(&key, b"msg");
        hmac_verify(&key, b"msg", &tag).unwrap();

        tag[MAC_LEN - 1] ^= 0x80;
        assert!(hmac_verify(&key, b"msg", &tag).is_err());
    }

    #[test]
    fn test_pbkdf2_deterministic() {
        let a = pbkdf2_sha256(b"segment", b"blog-encryption");
        let b = pbkdf2_sha256(b"segment", b"blog-encryption");
        let c = pbkdf2_sha256(b"segment", b"other-salt");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
