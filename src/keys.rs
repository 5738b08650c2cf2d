//! secp256k1 key handling for the vault envelope.
//!
//! This is the only module in the crate that imports `k256` directly. It
//! owns three responsibilities:
//! 1. Parsing the wallet owner's master key from its 64-hex-char scalar form.
//! 2. Generating the fresh ephemeral key pair used by each seal operation.
//! 3. Computing the ECDH shared secret both sides of the envelope derive
//!    their AES key from.
//!
//! WIF import and address derivation belong to the wallet boundary, not
//! here — the core takes the raw hex scalar after the boundary's format
//! validation has passed.
//!
//! `k256::SecretKey` zeroizes its scalar on drop; scratch buffers holding
//! raw key bytes are wrapped in `zeroize::Zeroizing` so no copy of the
//! material outlives the operation that drew it.

use k256::ecdh;
use k256::{PublicKey, SecretKey};
use zeroize::Zeroizing;

use crate::crypto::{self, KEY_LEN};
use crate::error::VaultError;

/// The wallet owner's master secp256k1 key.
///
/// Constructed fresh from the caller-supplied hex scalar for each seal or
/// open call; the crate never holds one in process-wide state.
pub struct OwnerKey {
    secret: SecretKey,
}

impl OwnerKey {
    /// Parse an owner key from a raw 64-hex-character scalar.
    ///
    /// Rejects anything that is not exactly 64 hex digits, as well as
    /// scalars that are zero or at/above the secp256k1 group order.
    pub fn from_hex(hex_scalar: &str) -> Result<Self, VaultError> {
        if hex_scalar.len() != 64 || !hex_scalar.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(VaultError::InvalidKey);
        }

        let bytes = Zeroizing::new(hex::decode(hex_scalar).map_err(|_| VaultError::InvalidKey)?);
        let secret = SecretKey::from_slice(&bytes).map_err(|_| VaultError::InvalidKey)?;
        Ok(Self { secret })
    }

    /// The owner's public point, SEC1-compressed, hex-encoded.
    pub fn public_key_hex(&self) -> String {
        encode_point(&self.secret.public_key())
    }

    pub(crate) fn public_key(&self) -> PublicKey {
        self.secret.public_key()
    }

    pub(crate) fn secret(&self) -> &SecretKey {
        &self.secret
    }
}

/// A single-use ephemeral key pair for one seal operation.
///
/// Not `Clone`; dropped (and zeroized) as soon as the shared secret has
/// been computed.
pub(crate) struct EphemeralKey {
    secret: SecretKey,
}

impl EphemeralKey {
    /// Generate a fresh ephemeral key from the system RNG.
    ///
    /// Randomness comes from `crypto::fill_random` so an unavailable RNG is
    /// a reported failure, never a panic. A draw landing outside the curve
    /// order is rejected by `SecretKey::from_slice`; the probability is
    /// about 2^-128, so a handful of redraws is already unreachable in
    /// practice.
    pub(crate) fn generate() -> Result<Self, VaultError> {
        for _ in 0..4 {
            let mut buf = Zeroizing::new([0u8; KEY_LEN]);
            crypto::fill_random(buf.as_mut())?;
            if let Ok(secret) = SecretKey::from_slice(buf.as_ref()) {
                return Ok(Self { secret });
            }
        }
        Err(VaultError::RandomnessFailure)
    }

    pub(crate) fn public_key_hex(&self) -> String {
        encode_point(&self.secret.public_key())
    }

    pub(crate) fn secret(&self) -> &SecretKey {
        &self.secret
    }
}

/// Compute the ECDH shared secret between a secret scalar and a public
/// point, returned as the 32-byte x-coordinate.
///
/// By ECDH symmetry, `shared_secret(eph, owner_pub)` at seal time equals
/// `shared_secret(owner, eph_pub)` at open time.
pub(crate) fn shared_secret(secret: &SecretKey, public: &PublicKey) -> Zeroizing<[u8; KEY_LEN]> {
    let shared = ecdh::diffie_hellman(secret.to_nonzero_scalar(), public.as_affine());
    let mut out = Zeroizing::new([0u8; KEY_LEN]);
    out.copy_from_slice(shared.raw_secret_bytes().as_slice());
    out
}

/// Hex-encode a public point in SEC1 compressed form (33 bytes, 66 chars).
pub(crate) fn encode_point(public: &PublicKey) -> String {
    hex::encode(public.to_sec1_bytes())
}

/// Parse a hex-encoded SEC1 point. Accepts compressed or uncompressed
/// encodings; rejects anything not on the curve.
pub(crate) fn decode_point(hex_point: &str) -> Result<PublicKey, VaultError> {
    let bytes = hex::decode(hex_point).map_err(|_| VaultError::InvalidKey)?;
    PublicKey::from_sec1_bytes(&bytes).map_err(|_| VaultError::InvalidKey)
}
