//! Error types for tiervault.
//!
//! Every variant is a distinct failure mode in the sealing protocol or the
//! content gate. Error messages are intentionally minimal — they signal
//! *what* failed without revealing *why* in ways that could leak
//! cryptographic state.

use std::fmt;

/// The single error type for all tiervault operations.
#[derive(Debug)]
pub enum VaultError {
    /// The system's random number generator failed to produce bytes.
    /// Fatal: there is no fallback source of randomness.
    RandomnessFailure,

    /// A key was invalid: wrong length, non-hex characters, or a scalar
    /// outside the secp256k1 order.
    InvalidKey,

    /// Key derivation (HKDF or PBKDF2) failed.
    KeyDerivationFailure,

    /// AEAD encryption failed. The underlying `ring` operation returned
    /// an error.
    EncryptionFailure,

    /// A vault seal operation failed, wrapping the step that broke.
    /// No partial envelope is ever produced.
    SealFailure(Box<VaultError>),

    /// The envelope is not a vault file: wrong `algorithm` or `version`
    /// tag, `encrypted` not set, or an unparseable wire field. Checked
    /// before any cryptographic operation is attempted.
    InvalidEnvelope(String),

    /// The detached HMAC over the ciphertext did not verify. The file has
    /// been tampered with or was sealed under a different key.
    IntegrityCheckFailure,

    /// AES-GCM authentication failed: wrong key or tampered ciphertext.
    DecryptionFailure,

    /// Decryption succeeded but the plaintext is not a valid vault
    /// (not UTF-8, or not JSON in the expected shape).
    CorruptPayload,

    /// A content decrypt was attempted with a key segment that does not
    /// match the level the content was sealed under.
    InsufficientAccessLevel,

    /// An encryption level outside the supported range 0..=5.
    InvalidLevel,

    /// A tier hierarchy was already minted for this session. Generation
    /// is refused until the caller explicitly resets.
    HierarchyLocked,
}

impl VaultError {
    /// Stable snake_case token for the event log. Never carries the
    /// variant's detail payload.
    pub fn category(&self) -> &'static str {
        match self {
            Self::RandomnessFailure => "randomness_failure",
            Self::InvalidKey => "invalid_key",
            Self::KeyDerivationFailure => "key_derivation_failure",
            Self::EncryptionFailure => "encryption_failure",
            Self::SealFailure(_) => "seal_failure",
            Self::InvalidEnvelope(_) => "invalid_envelope",
            Self::IntegrityCheckFailure => "integrity_check_failure",
            Self::DecryptionFailure => "decryption_failure",
            Self::CorruptPayload => "corrupt_payload",
            Self::InsufficientAccessLevel => "insufficient_access_level",
            Self::InvalidLevel => "invalid_level",
            Self::HierarchyLocked => "hierarchy_locked",
        }
    }
}

impl fmt::Display for VaultError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RandomnessFailure => write!(f, "secure random source unavailable"),
            Self::InvalidKey => write!(f, "invalid key"),
            Self::KeyDerivationFailure => write!(f, "key derivation failed"),
            Self::EncryptionFailure => write!(f, "encryption failed"),
            Self::SealFailure(cause) => write!(f, "vault encryption failed: {}", cause),
            Self::InvalidEnvelope(reason) => write!(f, "not a vault file: {}", reason),
            Self::IntegrityCheckFailure => {
                write!(f, "integrity check failed: data may be tampered")
            }
            Self::DecryptionFailure => write!(f, "decryption failed"),
            Self::CorruptPayload => write!(f, "corrupt vault contents"),
            Self::InsufficientAccessLevel => write!(f, "insufficient access level"),
            Self::InvalidLevel => write!(f, "invalid encryption level"),
            Self::HierarchyLocked => {
                write!(f, "key hierarchy already generated; reset before regenerating")
            }
        }
    }
}

impl std::error::Error for VaultError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::SealFailure(cause) => Some(cause.as_ref()),
            _ => None,
        }
    }
}
