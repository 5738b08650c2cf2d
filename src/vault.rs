//! Vault data model and wire format.
//!
//! A [`Vault`] is the full backup payload: the tiered key history, contact
//! book, API key history, and opaque session metadata, assembled fresh from
//! in-memory wallet state each time a seal is requested. It is a value —
//! built once, serialized, encrypted, and never mutated afterwards.
//!
//! An [`EncryptedVault`] is the only entity that reaches durable storage
//! (the downloaded backup file). Its field names are fixed by the deployed
//! file format, hence the camelCase serde renames throughout.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tiers::KeyHistory;

/// Wire format version of the encrypted backup file.
pub const VAULT_FORMAT_VERSION: &str = "1.0";

/// The `algorithm` tag every valid backup file carries.
pub const VAULT_ALGORITHM: &str = "ECIES-AES256-GCM";

/// Which chain the sealed wallet belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Testnet,
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mainnet => f.write_str("mainnet"),
            Self::Testnet => f.write_str("testnet"),
        }
    }
}

/// A saved messaging contact, restored into wallet state on open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactRecord {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub public_key_hex: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub shared_secret: Option<String>,
    pub added: DateTime<Utc>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Current and historical API keys for one external service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKeyRecord {
    pub current: String,
    #[serde(default)]
    pub history: Vec<String>,
}

/// The full backup payload sealed into an [`EncryptedVault`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vault {
    pub version: String,
    pub encrypted: bool,
    pub timestamp: DateTime<Utc>,
    pub blog_keys: KeyHistory,
    #[serde(default)]
    pub api_keys: BTreeMap<String, ApiKeyRecord>,
    #[serde(default)]
    pub contacts: Vec<ContactRecord>,
    /// UI-defined session metadata; opaque to the core.
    #[serde(default)]
    pub session_data: serde_json::Value,
}

impl Vault {
    /// Assemble a plaintext vault from current wallet state.
    pub fn assemble(
        blog_keys: KeyHistory,
        api_keys: BTreeMap<String, ApiKeyRecord>,
        contacts: Vec<ContactRecord>,
        session_data: serde_json::Value,
    ) -> Self {
        Self {
            version: VAULT_FORMAT_VERSION.to_string(),
            encrypted: false,
            timestamp: Utc::now(),
            blog_keys,
            api_keys,
            contacts,
            session_data,
        }
    }
}

/// Caller-persisted counters and identity stamped into the envelope.
///
/// The backup number is a monotonic counter owned by the wallet, not by
/// the codec; the address is the wallet's receive address for the sealed
/// network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupMetadata {
    pub address: String,
    pub network: Network,
    pub backup_number: u64,
}

/// The encrypted backup file: the only durably-persisted entity.
///
/// `ciphertext` is base64 of `salt (32) ‖ iv (12) ‖ AEAD ciphertext + tag`;
/// `mac` is base64 of a detached HMAC-SHA256 over the AEAD ciphertext.
/// Immutable once produced and consumed exactly once by an open call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedVault {
    pub version: String,
    pub algorithm: String,
    pub encrypted: bool,
    pub timestamp: DateTime<Utc>,
    /// SEC1-encoded ephemeral secp256k1 point, hex.
    pub ephemeral_public_key: String,
    pub ciphertext: String,
    pub mac: String,
    pub metadata: BackupMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiers::KeyHistory;

    #[test]
    fn test_vault_wire_field_names() {
        let vault = Vault::assemble(
            KeyHistory::new(),
            BTreeMap::new(),
            vec![ContactRecord {
                id: "c1".into(),
                name: "Alice".into(),
                public_key_hex: Some("02ab".into()),
                address: None,
                shared_secret: None,
                added: Utc::now(),
                tags: vec!["friend".into()],
            }],
            serde_json::json!({ "theme": "dark" }),
        );

        let value = serde_json::to_value(&vault).unwrap();
        assert!(value.get("blogKeys").is_some());
        assert!(value.get("apiKeys").is_some());
        assert!(value.get("sessionData").is_some());
        assert_eq!(value["contacts"][0]["publicKeyHex"], "02ab");
        // Absent optionals are omitted, not null.
        assert!(value["contacts"][0].get("address").is_none());
    }

    #[test]
    fn test_network_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Network::Testnet).unwrap(), "\"testnet\"");
        assert_eq!(Network::Mainnet.to_string(), "mainnet");
    }

    #[test]
    fn test_vault_json_roundtrip_is_deep_equal() {
        let vault = Vault::assemble(
            KeyHistory::new(),
            BTreeMap::from([(
                "indexer".to_string(),
                ApiKeyRecord { current: "key-2".into(), history: vec!["key-1".into()] },
            )]),
            Vec::new(),
            serde_json::Value::Null,
        );

        let json = serde_json::to_string(&vault).unwrap();
        let back: Vault = serde_json::from_str(&json).unwrap();
        assert_eq!(back, vault);
    }
}
