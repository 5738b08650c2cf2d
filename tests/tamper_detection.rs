//! Tamper-detection properties of the sealed envelope.
//!
//! Flipping any single bit of the wire ciphertext or mac must surface as
//! an integrity or decryption failure — never a silent wrong-plaintext
//! return.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use tiervault::{open, seal_for_self, KeyHistory, Network, Vault, VaultError};

const OWNER_KEY: &str = "9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60";

fn sealed_envelope() -> tiervault::EncryptedVault {
    let vault = Vault::assemble(
        KeyHistory::new(),
        Default::default(),
        Vec::new(),
        serde_json::Value::Null,
    );
    seal_for_self(&vault, OWNER_KEY, Network::Mainnet, "addr", 1).unwrap()
}

/// Flip one bit of the decoded wire bytes at `index` and re-encode.
fn flip_wire_bit(envelope: &tiervault::EncryptedVault, index: usize) -> tiervault::EncryptedVault {
    let mut wire = BASE64.decode(&envelope.ciphertext).unwrap();
    wire[index] ^= 0x01;
    let mut tampered = envelope.clone();
    tampered.ciphertext = BASE64.encode(wire);
    tampered
}

#[test]
fn test_flipped_salt_fails_integrity() {
    // A different salt derives a different key, so the detached MAC
    // cannot verify.
    let envelope = sealed_envelope();
    let tampered = flip_wire_bit(&envelope, 0);
    assert!(matches!(
        open(&tampered, OWNER_KEY),
        Err(VaultError::IntegrityCheckFailure)
    ));
}

#[test]
fn test_flipped_iv_fails_decryption() {
    // The IV is outside the detached MAC's coverage; the GCM tag catches it.
    let envelope = sealed_envelope();
    let tampered = flip_wire_bit(&envelope, 32); // first IV byte
    assert!(matches!(
        open(&tampered, OWNER_KEY),
        Err(VaultError::DecryptionFailure)
    ));
}

#[test]
fn test_flipped_ciphertext_fails_integrity() {
    let envelope = sealed_envelope();
    let tampered = flip_wire_bit(&envelope, 44); // first AEAD ciphertext byte
    assert!(matches!(
        open(&tampered, OWNER_KEY),
        Err(VaultError::IntegrityCheckFailure)
    ));
}

#[test]
fn test_flipped_tag_fails_integrity() {
    let envelope = sealed_envelope();
    let wire_len = BASE64.decode(&envelope.ciphertext).unwrap().len();
    let tampered = flip_wire_bit(&envelope, wire_len - 1); // last GCM tag byte
    assert!(matches!(
        open(&tampered, OWNER_KEY),
        Err(VaultError::IntegrityCheckFailure)
    ));
}

#[test]
fn test_flipped_mac_fails_integrity() {
    let envelope = sealed_envelope();
    let mut mac = BASE64.decode(&envelope.mac).unwrap();
    mac[0] ^= 0x01;
    let mut tampered = envelope.clone();
    tampered.mac = BASE64.encode(mac);

    assert!(matches!(
        open(&tampered, OWNER_KEY),
        Err(VaultError::IntegrityCheckFailure)
    ));
}

#[test]
fn test_every_wire_byte_position_is_covered() {
    // Sweep a bit flip across the whole decoded wire payload. Integrity or
    // decryption failure at every position; success nowhere.
    let envelope = sealed_envelope();
    let wire_len = BASE64.decode(&envelope.ciphertext).unwrap().len();

    for index in (0..wire_len).step_by(7) {
        let tampered = flip_wire_bit(&envelope, index);
        match open(&tampered, OWNER_KEY) {
            Err(VaultError::IntegrityCheckFailure) | Err(VaultError::DecryptionFailure) => {}
            other => panic!("byte {index}: expected tamper failure, got {other:?}"),
        }
    }
}

#[test]
fn test_truncated_wire_is_invalid_envelope() {
    let envelope = sealed_envelope();
    let mut truncated = envelope.clone();
    truncated.ciphertext = BASE64.encode(&BASE64.decode(&envelope.ciphertext).unwrap()[..20]);
    assert!(matches!(
        open(&truncated, OWNER_KEY),
        Err(VaultError::InvalidEnvelope(_))
    ));
}

#[test]
fn test_swapped_ephemeral_key_fails() {
    // Substituting the ephemeral point from another (valid) envelope
    // changes the agreed secret; the MAC fails closed.
    let a = sealed_envelope();
    let b = sealed_envelope();

    let mut spliced = a.clone();
    spliced.ephemeral_public_key = b.ephemeral_public_key.clone();
    assert!(matches!(
        open(&spliced, OWNER_KEY),
        Err(VaultError::IntegrityCheckFailure)
    ));
}
