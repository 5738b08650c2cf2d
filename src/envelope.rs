//! Self-ECIES vault sealing and opening.
//!
//! The envelope composes ECDH + HKDF-SHA256 + AES-256-GCM + a detached
//! HMAC-SHA256. The recipient of every seal is the vault owner themselves:
//! a fresh ephemeral secp256k1 pair is agreed against the owner's own
//! public key, so this is an encrypt-to-self backup pattern — hence
//! `seal_for_self`, not a two-party confidentiality primitive.
//!
//! ## Wire layout
//!
//! ```text
//! ciphertext field = base64( salt (32) ‖ iv (12) ‖ AEAD ciphertext + tag )
//! mac field        = base64( HMAC-SHA256(derived key, AEAD ciphertext) )
//! ```
//!
//! The detached MAC reuses the AEAD key. This is redundant with the GCM
//! tag and reuses one key across two primitives, but the deployed file
//! format carries it, so compatibility wins; it is verified in constant
//! time *before* any AEAD work is attempted.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::Utc;
use zeroize::Zeroizing;

use crate::crypto::{self, NONCE_LEN, SALT_LEN};
use crate::error::VaultError;
use crate::events::{EventLog, EventRecord, EventSink, Operation, OUTCOME_OK};
use crate::keys::{self, EphemeralKey, OwnerKey};
use crate::vault::{
    BackupMetadata, EncryptedVault, Network, Vault, VAULT_ALGORITHM, VAULT_FORMAT_VERSION,
};

/// HKDF context string. Fixed by the deployed format.
const HKDF_INFO: &[u8] = b"vault-encryption";

/// Minimum decoded length of the `ciphertext` field: salt, IV, and at
/// least a GCM tag.
const MIN_WIRE_LEN: usize = SALT_LEN + NONCE_LEN + 16;

/// Seal a vault into an encrypted backup envelope.
///
/// Encrypt-to-self: the ECDH runs between a single-use ephemeral key and
/// the public key derived from `owner_private_key_hex`. Two calls with
/// identical inputs produce entirely different envelopes — the ephemeral
/// key, salt, and IV are all drawn fresh.
///
/// `address` and `backup_number` are caller-owned wallet state stamped
/// into the envelope metadata; the codec keeps no counters of its own.
///
/// Any step failure surfaces as [`VaultError::SealFailure`] wrapping the
/// underlying cause; no partial envelope is ever returned.
pub fn seal_for_self(
    vault: &Vault,
    owner_private_key_hex: &str,
    network: Network,
    address: &str,
    backup_number: u64,
) -> Result<EncryptedVault, VaultError> {
    seal_steps(vault, owner_private_key_hex, network, address, backup_number)
        .map_err(|cause| VaultError::SealFailure(Box::new(cause)))
}

fn seal_steps(
    vault: &Vault,
    owner_private_key_hex: &str,
    network: Network,
    address: &str,
    backup_number: u64,
) -> Result<EncryptedVault, VaultError> {
    let owner = OwnerKey::from_hex(owner_private_key_hex)?;

    // Fresh ephemeral pair per seal; never reused across calls.
    let ephemeral = EphemeralKey::generate()?;
    let shared = keys::shared_secret(ephemeral.secret(), &owner.public_key());

    let mut salt = [0u8; SALT_LEN];
    crypto::fill_random(&mut salt)?;
    let key = Zeroizing::new(crypto::hkdf_sha256(shared.as_ref(), &salt, HKDF_INFO)?);

    let mut iv = [0u8; NONCE_LEN];
    crypto::fill_random(&mut iv)?;

    let plaintext =
        Zeroizing::new(serde_json::to_vec(vault).map_err(|_| VaultError::EncryptionFailure)?);
    let ciphertext = crypto::aead_seal(&key, &iv, &plaintext)?;

    // Detached MAC over the AEAD ciphertext only — salt and IV are not
    // covered, matching the deployed format.
    let mac = crypto::hmac_sign(&key, &ciphertext);

    let mut wire = Vec::with_capacity(SALT_LEN + NONCE_LEN + ciphertext.len());
    wire.extend_from_slice(&salt);
    wire.extend_from_slice(&iv);
    wire.extend_from_slice(&ciphertext);

    Ok(EncryptedVault {
        version: VAULT_FORMAT_VERSION.to_string(),
        algorithm: VAULT_ALGORITHM.to_string(),
        encrypted: true,
        timestamp: Utc::now(),
        ephemeral_public_key: ephemeral.public_key_hex(),
        ciphertext: BASE64.encode(wire),
        mac: BASE64.encode(mac),
        metadata: BackupMetadata {
            address: address.to_string(),
            network,
            backup_number,
        },
    })
}

/// Open an encrypted backup envelope back into a vault.
///
/// Failure order is fixed and every failure is terminal for the attempt:
/// 1. Format tags (`algorithm`, `encrypted`, `version`) — no crypto yet.
/// 2. Ephemeral point and owner key parsing.
/// 3. Detached HMAC, verified in constant time before any AEAD work.
/// 4. AES-GCM open.
/// 5. UTF-8 JSON parse into the vault shape.
///
/// The distinct error variants let a caller tell "not a vault file at all"
/// from "wrong key or tampered file" from "corrupt contents".
pub fn open(envelope: &EncryptedVault, owner_private_key_hex: &str) -> Result<Vault, VaultError> {
    if envelope.algorithm != VAULT_ALGORITHM {
        return Err(VaultError::InvalidEnvelope(format!(
            "unsupported algorithm \"{}\"",
            envelope.algorithm
        )));
    }
    if !envelope.encrypted {
        return Err(VaultError::InvalidEnvelope(
            "envelope is not marked encrypted".to_string(),
        ));
    }
    if envelope.version != VAULT_FORMAT_VERSION {
        return Err(VaultError::InvalidEnvelope(format!(
            "unsupported format version \"{}\"",
            envelope.version
        )));
    }

    let ephemeral_public = keys::decode_point(&envelope.ephemeral_public_key).map_err(|_| {
        VaultError::InvalidEnvelope("ephemeral public key is not a curve point".to_string())
    })?;
    let owner = OwnerKey::from_hex(owner_private_key_hex)?;

    let wire = BASE64
        .decode(&envelope.ciphertext)
        .map_err(|_| VaultError::InvalidEnvelope("ciphertext is not base64".to_string()))?;
    if wire.len() < MIN_WIRE_LEN {
        return Err(VaultError::InvalidEnvelope(
            "ciphertext is too short".to_string(),
        ));
    }
    let mac = BASE64
        .decode(&envelope.mac)
        .map_err(|_| VaultError::InvalidEnvelope("mac is not base64".to_string()))?;

    // ECDH symmetry: owner secret against the ephemeral public point
    // yields the seal-time shared secret.
    let shared = keys::shared_secret(owner.secret(), &ephemeral_public);

    let salt = &wire[..SALT_LEN];
    let iv: [u8; NONCE_LEN] = wire[SALT_LEN..SALT_LEN + NONCE_LEN]
        .try_into()
        .map_err(|_| VaultError::InvalidEnvelope("iv has wrong length".to_string()))?;
    let aead_ciphertext = &wire[SALT_LEN + NONCE_LEN..];

    let key = Zeroizing::new(crypto::hkdf_sha256(shared.as_ref(), salt, HKDF_INFO)?);

    // Fail closed on the detached MAC before touching the AEAD.
    crypto::hmac_verify(&key, aead_ciphertext, &mac)?;

    let plaintext = Zeroizing::new(crypto::aead_open(&key, &iv, aead_ciphertext)?);

    serde_json::from_slice(&plaintext).map_err(|_| VaultError::CorruptPayload)
}

// ---------------------------------------------------------------------------
// Codec facade with event logging
// ---------------------------------------------------------------------------

/// Seals and opens vaults, recording one event per attempt.
///
/// Owns the [`EventLog`]; the crypto itself lives in the free functions
/// above and is stateless. Records carry the operation name and an outcome
/// category only.
#[derive(Debug, Default)]
pub struct VaultCodec {
    events: EventLog,
}

impl VaultCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a sink that receives a copy of every event record.
    pub fn add_event_sink(&mut self, sink: Box<dyn EventSink>) {
        self.events.add_forward_sink(sink);
    }

    /// The event records accumulated so far.
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Seal a vault, logging the attempt. See [`seal_for_self`].
    pub fn seal_for_self(
        &mut self,
        vault: &Vault,
        owner_private_key_hex: &str,
        network: Network,
        address: &str,
        backup_number: u64,
    ) -> Result<EncryptedVault, VaultError> {
        let result = seal_for_self(vault, owner_private_key_hex, network, address, backup_number);
        self.record(Operation::SealVault, &result);
        result
    }

    /// Open an envelope, logging the attempt. See [`open`].
    pub fn open(
        &mut self,
        envelope: &EncryptedVault,
        owner_private_key_hex: &str,
    ) -> Result<Vault, VaultError> {
        let result = open(envelope, owner_private_key_hex);
        self.record(Operation::OpenVault, &result);
        result
    }

    fn record<T>(&mut self, operation: Operation, result: &Result<T, VaultError>) {
        let outcome = match result {
            Ok(_) => OUTCOME_OK,
            Err(e) => e.category(),
        };
        self.events.append(EventRecord::now(operation, outcome));
    }
}
