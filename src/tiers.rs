//! Tiered access-control key hierarchy.
//!
//! Five independently-drawn random secrets ("tier1".."tier5") gate content
//! at increasing access levels. Access is cumulative: the bundle for tier n
//! is the ordered list of secrets for tiers 1..n, so holding tier 5 implies
//! access to everything below it.
//!
//! Hierarchies are versioned, never mutated. Minting a fresh hierarchy
//! appends a new version to the caller-held [`KeyHistory`]; version 0 means
//! "no keys generated yet". A [`TierGenerator`] refuses to mint twice in
//! one session — regenerating live keys without an explicit reset would
//! orphan every payload sealed under the previous hierarchy.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto;
use crate::error::VaultError;

/// Byte lengths of the five tier secrets (128/128/128/192/256 bits).
pub const TIER_SECRET_LENS: [usize; 5] = [16, 16, 16, 24, 32];

// ---------------------------------------------------------------------------
// Encryption level
// ---------------------------------------------------------------------------

/// Which tier gates a piece of content. Level 0 means public: no key
/// derivation and no encryption at all.
///
/// Serialized as its integer value (0..=5), matching the content metadata
/// wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum EncryptionLevel {
    Public,
    Tier1,
    Tier2,
    Tier3,
    Tier4,
    Tier5,
}

impl EncryptionLevel {
    /// Returns true for level 0 (no encryption).
    pub fn is_public(self) -> bool {
        self == Self::Public
    }

    pub fn as_u8(self) -> u8 {
        self.into()
    }
}

impl From<EncryptionLevel> for u8 {
    fn from(level: EncryptionLevel) -> u8 {
        match level {
            EncryptionLevel::Public => 0,
            EncryptionLevel::Tier1 => 1,
            EncryptionLevel::Tier2 => 2,
            EncryptionLevel::Tier3 => 3,
            EncryptionLevel::Tier4 => 4,
            EncryptionLevel::Tier5 => 5,
        }
    }
}

impl TryFrom<u8> for EncryptionLevel {
    type Error = VaultError;

    fn try_from(value: u8) -> Result<Self, VaultError> {
        match value {
            0 => Ok(Self::Public),
            1 => Ok(Self::Tier1),
            2 => Ok(Self::Tier2),
            3 => Ok(Self::Tier3),
            4 => Ok(Self::Tier4),
            5 => Ok(Self::Tier5),
            _ => Err(VaultError::InvalidLevel),
        }
    }
}

// ---------------------------------------------------------------------------
// Tier secrets and access bundles
// ---------------------------------------------------------------------------

/// The five hex-encoded tier secrets of one hierarchy version.
///
/// Immutable once generated; zeroized on drop. The `Debug` impl is
/// redacted so secrets cannot reach a log through formatting.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct TierSecrets {
    pub tier1: String,
    pub tier2: String,
    pub tier3: String,
    pub tier4: String,
    pub tier5: String,
}

impl fmt::Debug for TierSecrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TierSecrets { <redacted> }")
    }
}

impl TierSecrets {
    /// Draw five fresh independent secrets from the system RNG.
    ///
    /// Fails with `RandomnessFailure` if the RNG is unavailable — never
    /// falls back to a non-cryptographic source.
    pub(crate) fn generate() -> Result<Self, VaultError> {
        let mut drawn = Vec::with_capacity(TIER_SECRET_LENS.len());
        for len in TIER_SECRET_LENS {
            drawn.push(hex::encode(crypto::random_bytes(len)?));
        }
        // Five elements by construction; consume in order.
        let mut drawn = drawn.into_iter();
        let mut next = || drawn.next().ok_or(VaultError::RandomnessFailure);
        Ok(Self {
            tier1: next()?,
            tier2: next()?,
            tier3: next()?,
            tier4: next()?,
            tier5: next()?,
        })
    }

    /// The single secret gating `level`, or `None` for level 0.
    pub fn segment(&self, level: EncryptionLevel) -> Option<&str> {
        match level {
            EncryptionLevel::Public => None,
            EncryptionLevel::Tier1 => Some(&self.tier1),
            EncryptionLevel::Tier2 => Some(&self.tier2),
            EncryptionLevel::Tier3 => Some(&self.tier3),
            EncryptionLevel::Tier4 => Some(&self.tier4),
            EncryptionLevel::Tier5 => Some(&self.tier5),
        }
    }

    /// The cumulative access bundle for `level`: the ordered secrets for
    /// tiers 1..=n. Level 0 yields an empty list.
    pub fn bundle_for(&self, level: EncryptionLevel) -> Vec<String> {
        let all = [&self.tier1, &self.tier2, &self.tier3, &self.tier4, &self.tier5];
        all.iter()
            .take(level.as_u8() as usize)
            .map(|s| s.to_string())
            .collect()
    }
}

/// The precomputed cumulative bundles for one hierarchy version.
///
/// Derived from [`TierSecrets`], never stored independently: `tier(n)` is
/// always `tier(n-1)` plus the n-th secret, and `tier5` is the full-access
/// bundle.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct AccessBundles {
    pub tier1: Vec<String>,
    pub tier2: Vec<String>,
    pub tier3: Vec<String>,
    pub tier4: Vec<String>,
    pub tier5: Vec<String>,
}

impl fmt::Debug for AccessBundles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessBundles { <redacted> }")
    }
}

impl AccessBundles {
    /// Recompute the bundles from a secret set.
    pub fn compute(secrets: &TierSecrets) -> Self {
        Self {
            tier1: secrets.bundle_for(EncryptionLevel::Tier1),
            tier2: secrets.bundle_for(EncryptionLevel::Tier2),
            tier3: secrets.bundle_for(EncryptionLevel::Tier3),
            tier4: secrets.bundle_for(EncryptionLevel::Tier4),
            tier5: secrets.bundle_for(EncryptionLevel::Tier5),
        }
    }

    /// The bundle for a level; empty for level 0.
    pub fn for_level(&self, level: EncryptionLevel) -> &[String] {
        match level {
            EncryptionLevel::Public => &[],
            EncryptionLevel::Tier1 => &self.tier1,
            EncryptionLevel::Tier2 => &self.tier2,
            EncryptionLevel::Tier3 => &self.tier3,
            EncryptionLevel::Tier4 => &self.tier4,
            EncryptionLevel::Tier5 => &self.tier5,
        }
    }
}

// ---------------------------------------------------------------------------
// Versioned history
// ---------------------------------------------------------------------------

/// One appended snapshot of the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyHistoryVersion {
    pub keys: TierSecrets,
    pub access_bundles: AccessBundles,
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub label: Option<String>,
}

/// Append-only record of every hierarchy ever minted for a wallet.
///
/// `current_version` always names the most recently appended version;
/// 0 means the history is empty. Restoring a vault replaces the in-memory
/// history wholesale — versions are never merged or rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyHistory {
    pub current_version: u32,
    pub versions: BTreeMap<u32, KeyHistoryVersion>,
    pub created_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    pub total_versions: u32,
}

impl KeyHistory {
    /// Create an empty history (version 0, no keys generated yet).
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            current_version: 0,
            versions: BTreeMap::new(),
            created_at: now,
            last_modified: now,
            total_versions: 0,
        }
    }

    /// The most recently minted version, if any.
    pub fn current(&self) -> Option<&KeyHistoryVersion> {
        self.versions.get(&self.current_version)
    }

    /// Look up a specific version.
    pub fn version(&self, number: u32) -> Option<&KeyHistoryVersion> {
        self.versions.get(&number)
    }

    fn append(
        &mut self,
        keys: TierSecrets,
        access_bundles: AccessBundles,
        label: Option<String>,
    ) -> &KeyHistoryVersion {
        let number = self.current_version + 1;
        let entry = KeyHistoryVersion {
            keys,
            access_bundles,
            version: number,
            generated_at: Utc::now(),
            label,
        };

        self.versions.insert(number, entry);
        self.current_version = number;
        self.total_versions = self.versions.len() as u32;
        self.last_modified = Utc::now();

        // Just inserted under this number.
        &self.versions[&number]
    }
}

impl Default for KeyHistory {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Generator with a re-generation guard
// ---------------------------------------------------------------------------

/// Mints tier hierarchies, at most one per session.
///
/// The guard models "you cannot regenerate production keys without an
/// explicit reset": after a successful mint, `generate` refuses with
/// [`VaultError::HierarchyLocked`] until [`TierGenerator::reset`] is
/// called. The guard is session state, owned by the caller — it is not
/// persisted in the history.
#[derive(Debug, Default)]
pub struct TierGenerator {
    minted: bool,
}

impl TierGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a fresh five-tier hierarchy and append it to `history`.
    ///
    /// Draws five independent secrets (128/128/128/192/256 bits), computes
    /// the cumulative bundles, and advances `history.current_version`.
    /// Fails only on RNG unavailability or if this generator already
    /// minted in the current session.
    pub fn generate<'h>(
        &mut self,
        history: &'h mut KeyHistory,
        label: Option<String>,
    ) -> Result<&'h KeyHistoryVersion, VaultError> {
        if self.minted {
            return Err(VaultError::HierarchyLocked);
        }

        let secrets = TierSecrets::generate()?;
        let bundles = AccessBundles::compute(&secrets);

        self.minted = true;
        Ok(history.append(secrets, bundles, label))
    }

    /// Explicitly clear the guard, allowing another mint.
    pub fn reset(&mut self) {
        self.minted = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_lengths() {
        let secrets = TierSecrets::generate().unwrap();
        // Hex doubles the byte length.
        assert_eq!(secrets.tier1.len(), 32);
        assert_eq!(secrets.tier2.len(), 32);
        assert_eq!(secrets.tier3.len(), 32);
        assert_eq!(secrets.tier4.len(), 48);
        assert_eq!(secrets.tier5.len(), 64);
    }

    #[test]
    fn test_bundles_are_nested_prefixes() {
        let secrets = TierSecrets::generate().unwrap();
        let bundles = AccessBundles::compute(&secrets);

        assert!(bundles.for_level(EncryptionLevel::Public).is_empty());

        let mut previous: &[String] = &[];
        for level in [
            EncryptionLevel::Tier1,
            EncryptionLevel::Tier2,
            EncryptionLevel::Tier3,
            EncryptionLevel::Tier4,
            EncryptionLevel::Tier5,
        ] {
            let bundle = bundles.for_level(level);
            assert_eq!(bundle.len(), level.as_u8() as usize);
            assert_eq!(&bundle[..previous.len()], previous);
            previous = bundle;
        }

        assert_eq!(bundles.tier5.last().map(String::as_str), Some(secrets.tier5.as_str()));
    }

    #[test]
    fn test_generate_appends_and_locks() {
        let mut history = KeyHistory::new();
        let mut generator = TierGenerator::new();
        assert_eq!(history.current_version, 0);
        assert!(history.current().is_none());

        let version = generator.generate(&mut history, Some("initial".into())).unwrap();
        assert_eq!(version.version, 1);
        assert_eq!(version.label.as_deref(), Some("initial"));
        assert_eq!(history.current_version, 1);
        assert_eq!(history.total_versions, 1);

        // Locked until reset.
        assert!(matches!(
            generator.generate(&mut history, None),
            Err(VaultError::HierarchyLocked)
        ));

        generator.reset();
        let second = generator.generate(&mut history, None).unwrap();
        assert_eq!(second.version, 2);
        assert_eq!(history.current_version, 2);
        assert_eq!(history.total_versions, 2);

        // Version 1 is still present, untouched.
        assert_eq!(history.version(1).unwrap().version, 1);
    }

    #[test]
    fn test_two_hierarchies_are_independent() {
        let a = TierSecrets::generate().unwrap();
        let b = TierSecrets::generate().unwrap();
        assert_ne!(a.tier1, b.tier1);
        assert_ne!(a.tier5, b.tier5);
    }

    #[test]
    fn test_level_conversions() {
        for n in 0u8..=5 {
            let level = EncryptionLevel::try_from(n).unwrap();
            assert_eq!(level.as_u8(), n);
        }
        assert!(matches!(
            EncryptionLevel::try_from(6),
            Err(VaultError::InvalidLevel)
        ));
        assert!(EncryptionLevel::Public.is_public());
        assert!(!EncryptionLevel::Tier3.is_public());
    }

    #[test]
    fn test_level_serializes_as_integer() {
        let json = serde_json::to_string(&EncryptionLevel::Tier3).unwrap();
        assert_eq!(json, "3");
        let back: EncryptionLevel = serde_json::from_str("3").unwrap();
        assert_eq!(back, EncryptionLevel::Tier3);
        assert!(serde_json::from_str::<EncryptionLevel>("9").is_err());
    }
}
