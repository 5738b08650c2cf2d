//! # tiervault
//!
//! Self-ECIES vault sealing with tiered access-control keys.
//!
//! A wallet's backup state — its tiered key hierarchy, contacts, and API
//! key history — is assembled into a [`Vault`] value and sealed into an
//! [`EncryptedVault`] file under the owner's own secp256k1 key (ECDH with
//! a single-use ephemeral pair, HKDF-SHA256, AES-256-GCM, and a detached
//! HMAC). Individual content payloads are gated separately under one of
//! five cumulative access tiers.
//!
//! ## Public API
//!
//! The public surface of this crate is intentionally narrow. Raw key bytes
//! never leave the crate; callers hand in the owner's hex scalar per call
//! and the crate holds no key material in global state.
//!
//! ```no_run
//! use tiervault::{KeyHistory, Network, TierGenerator, Vault, VaultCodec};
//!
//! # fn main() -> Result<(), tiervault::VaultError> {
//! let mut history = KeyHistory::new();
//! let mut generator = TierGenerator::new();
//! generator.generate(&mut history, Some("initial".into()))?;
//!
//! let vault = Vault::assemble(history, Default::default(), Vec::new(), serde_json::Value::Null);
//!
//! let owner_hex = "..."; // 64-hex-char secp256k1 scalar, caller-supplied
//! let mut codec = VaultCodec::new();
//! let envelope = codec.seal_for_self(&vault, owner_hex, Network::Testnet, "1Addr...", 1)?;
//! let restored = codec.open(&envelope, owner_hex)?;
//! assert_eq!(restored, vault);
//! # Ok(())
//! # }
//! ```

// Module declarations.
pub(crate) mod crypto;
pub mod envelope;
pub mod error;
pub mod events;
pub mod gate;
pub mod keys;
pub mod tiers;
pub mod vault;

pub use envelope::{open, seal_for_self, VaultCodec};
pub use error::VaultError;
pub use events::{EventLog, EventRecord, EventSink, FileEventSink, Operation};
pub use gate::{
    decrypt_content, derive_content_key, encrypt_content, ContentKey, ContentMetadata,
    EncryptedContent,
};
pub use keys::OwnerKey;
pub use tiers::{
    AccessBundles, EncryptionLevel, KeyHistory, KeyHistoryVersion, TierGenerator, TierSecrets,
};
pub use vault::{
    ApiKeyRecord, BackupMetadata, ContactRecord, EncryptedVault, Network, Vault,
    VAULT_ALGORITHM, VAULT_FORMAT_VERSION,
};
