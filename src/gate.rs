//! Tier-gated content encryption.
//!
//! Seals arbitrary content (inscription payloads) under a key derived from
//! a single tier secret, independent of the vault envelope. The derivation
//! is deliberately deterministic — PBKDF2 over the tier key segment with a
//! fixed salt — because the segment itself is the secret: anyone holding
//! the right tier can derive the same key and open the content.
//!
//! Level 0 ("public") short-circuits both directions: nothing is derived
//! and the payload passes through unchanged.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::{self, KEY_LEN, NONCE_LEN};
use crate::error::VaultError;
use crate::tiers::EncryptionLevel;

/// Default PBKDF2 salt for content keys. Fixed by the deployed format.
pub const DEFAULT_CONTENT_SALT: &str = "blog-encryption";

/// The `algorithm` tag carried in content metadata.
pub const CONTENT_ALGORITHM: &str = "aes-256-gcm";

/// A symmetric content key derived from a tier segment.
///
/// Opaque: the raw bytes never leave the crate. Zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ContentKey {
    bytes: [u8; KEY_LEN],
}

impl ContentKey {
    pub(crate) fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

/// Derive a content key from a tier key segment.
///
/// PBKDF2-HMAC-SHA256, 10,000 iterations, 256-bit output. Same segment and
/// salt always yield the same key.
pub fn derive_content_key(key_segment: &str, salt: &str) -> ContentKey {
    ContentKey {
        bytes: crypto::pbkdf2_sha256(key_segment.as_bytes(), salt.as_bytes()),
    }
}

/// Metadata bundled alongside a piece of gated content.
///
/// For encrypted content, `iv` is the hex-encoded 96-bit nonce and
/// `algorithm` is [`CONTENT_ALGORITHM`]; both are omitted at level 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentMetadata {
    pub encrypted: bool,
    pub level: EncryptionLevel,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub iv: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub algorithm: Option<String>,
}

/// Output of [`encrypt_content`]: the payload plus its metadata.
///
/// At level 0 `encrypted_data` is the plaintext itself; at levels 1..=5 it
/// is base64 of the AEAD ciphertext with the GCM tag appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedContent {
    pub encrypted_data: String,
    pub metadata: ContentMetadata,
}

/// Encrypt content under the tier key segment for `level`.
///
/// A fresh 96-bit IV is drawn per call, so encrypting the same plaintext
/// twice yields different ciphertext. Level 0 returns the plaintext
/// unchanged, tagged `{encrypted: false, level: 0}`.
pub fn encrypt_content(
    plaintext: &str,
    key_segment: &str,
    level: EncryptionLevel,
) -> Result<EncryptedContent, VaultError> {
    if level.is_public() {
        return Ok(EncryptedContent {
            encrypted_data: plaintext.to_string(),
            metadata: ContentMetadata {
                encrypted: false,
                level: EncryptionLevel::Public,
                iv: None,
                algorithm: None,
            },
        });
    }

    let key = derive_content_key(key_segment, DEFAULT_CONTENT_SALT);

    let mut iv = [0u8; NONCE_LEN];
    crypto::fill_random(&mut iv)?;

    let ciphertext = crypto::aead_seal(key.as_bytes(), &iv, plaintext.as_bytes())?;

    Ok(EncryptedContent {
        encrypted_data: BASE64.encode(ciphertext),
        metadata: ContentMetadata {
            encrypted: true,
            level,
            iv: Some(hex::encode(iv)),
            algorithm: Some(CONTENT_ALGORITHM.to_string()),
        },
    })
}

/// Decrypt content previously sealed by [`encrypt_content`].
///
/// A GCM tag failure here almost always means the caller's tier does not
/// match the level the content was sealed under, so it surfaces as
/// [`VaultError::InsufficientAccessLevel`] rather than a bare decryption
/// error. Malformed metadata is rejected before any key derivation.
pub fn decrypt_content(
    encrypted_data: &str,
    key_segment: &str,
    metadata: &ContentMetadata,
) -> Result<String, VaultError> {
    if !metadata.encrypted || metadata.level.is_public() {
        return Ok(encrypted_data.to_string());
    }

    if metadata.algorithm.as_deref() != Some(CONTENT_ALGORITHM) {
        return Err(VaultError::InvalidEnvelope(
            "unsupported content algorithm".to_string(),
        ));
    }

    let iv_hex = metadata
        .iv
        .as_deref()
        .ok_or_else(|| VaultError::InvalidEnvelope("missing iv".to_string()))?;
    let iv_bytes = hex::decode(iv_hex)
        .map_err(|_| VaultError::InvalidEnvelope("iv is not hex".to_string()))?;
    let iv: [u8; NONCE_LEN] = iv_bytes
        .try_into()
        .map_err(|_| VaultError::InvalidEnvelope("iv has wrong length".to_string()))?;

    let ciphertext = BASE64
        .decode(encrypted_data)
        .map_err(|_| VaultError::InvalidEnvelope("ciphertext is not base64".to_string()))?;

    let key = derive_content_key(key_segment, DEFAULT_CONTENT_SALT);

    let plaintext = crypto::aead_open(key.as_bytes(), &iv, &ciphertext).map_err(|e| match e {
        VaultError::DecryptionFailure => VaultError::InsufficientAccessLevel,
        other => other,
    })?;

    String::from_utf8(plaintext).map_err(|_| VaultError::CorruptPayload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_all_gated_levels() {
        for level in [
            EncryptionLevel::Tier1,
            EncryptionLevel::Tier2,
            EncryptionLevel::Tier3,
            EncryptionLevel::Tier4,
            EncryptionLevel::Tier5,
        ] {
            let sealed = encrypt_content("secret note", "segment-hex", level).unwrap();
            assert!(sealed.metadata.encrypted);
            assert_eq!(sealed.metadata.level, level);
            assert_ne!(sealed.encrypted_data, "secret note");

            let opened =
                decrypt_content(&sealed.encrypted_data, "segment-hex", &sealed.metadata).unwrap();
            assert_eq!(opened, "secret note");
        }
    }

    #[test]
    fn test_level_zero_passthrough() {
        let sealed = encrypt_content("public post", "ignored", EncryptionLevel::Public).unwrap();
        assert!(!sealed.metadata.encrypted);
        assert_eq!(sealed.encrypted_data, "public post");
        assert!(sealed.metadata.iv.is_none());
        assert!(sealed.metadata.algorithm.is_none());

        let opened = decrypt_content(&sealed.encrypted_data, "ignored", &sealed.metadata).unwrap();
        assert_eq!(opened, "public post");
    }

    #[test]
    fn test_wrong_segment_is_insufficient_access() {
        let sealed = encrypt_content("tier three only", "tier3-seg", EncryptionLevel::Tier3).unwrap();
        let result = decrypt_content(&sealed.encrypted_data, "tier1-seg", &sealed.metadata);
        assert!(matches!(result, Err(VaultError::InsufficientAccessLevel)));
    }

    #[test]
    fn test_fresh_iv_per_call() {
        let a = encrypt_content("same input", "seg", EncryptionLevel::Tier1).unwrap();
        let b = encrypt_content("same input", "seg", EncryptionLevel::Tier1).unwrap();
        assert_ne!(a.encrypted_data, b.encrypted_data);
        assert_ne!(a.metadata.iv, b.metadata.iv);
    }

    #[test]
    fn test_malformed_metadata_rejected_before_crypto() {
        let sealed = encrypt_content("x", "seg", EncryptionLevel::Tier1).unwrap();

        let mut no_iv = sealed.metadata.clone();
        no_iv.iv = None;
        assert!(matches!(
            decrypt_content(&sealed.encrypted_data, "seg", &no_iv),
            Err(VaultError::InvalidEnvelope(_))
        ));

        let mut wrong_algo = sealed.metadata.clone();
        wrong_algo.algorithm = Some("rot13".to_string());
        assert!(matches!(
            decrypt_content(&sealed.encrypted_data, "seg", &wrong_algo),
            Err(VaultError::InvalidEnvelope(_))
        ));

        assert!(matches!(
            decrypt_content("!!!not-base64!!!", "seg", &sealed.metadata),
            Err(VaultError::InvalidEnvelope(_))
        ));
    }

    #[test]
    fn test_metadata_wire_shape() {
        let sealed = encrypt_content("x", "seg", EncryptionLevel::Tier2).unwrap();
        let value = serde_json::to_value(&sealed.metadata).unwrap();
        assert_eq!(value["encrypted"], true);
        assert_eq!(value["level"], 2);
        assert_eq!(value["algorithm"], "aes-256-gcm");
        assert_eq!(value["iv"].as_str().unwrap().len(), NONCE_LEN * 2);
    }
}
