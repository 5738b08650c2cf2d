//! Minimal example: a full backup/restore cycle.
//!
//! Run with: `cargo run --example backup_restore_demo`
//!
//! Walks the whole lifecycle:
//! - Mint a five-tier key hierarchy
//! - Assemble a vault and seal it to a backup file
//! - Read the file back and restore the vault
//! - Gate a content payload under tier 3 and open it with the restored keys
//! - Persist the event log to a file for inspection

use std::collections::BTreeMap;
use std::path::PathBuf;

use tiervault::{
    decrypt_content, encrypt_content, ContactRecord, EncryptionLevel, FileEventSink, KeyHistory,
    Network, TierGenerator, Vault, VaultCodec,
};

// Demo-only key. A real wallet supplies the owner's scalar from its own
// key management; the core never generates or stores it.
const OWNER_KEY: &str = "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Mint a tier hierarchy
    let mut history = KeyHistory::new();
    let mut generator = TierGenerator::new();
    generator.generate(&mut history, Some("demo keys".into()))?;
    println!("Minted hierarchy v{}", history.current_version);

    // Keep a tier-3 segment aside for the content-gating step
    let tier3_segment = history
        .current()
        .expect("just minted")
        .keys
        .segment(EncryptionLevel::Tier3)
        .expect("tier 3 exists")
        .to_string();

    // 2. Assemble and seal the vault
    let vault = Vault::assemble(
        history,
        BTreeMap::new(),
        vec![ContactRecord {
            id: "c-1".into(),
            name: "Alice".into(),
            public_key_hex: None,
            address: None,
            shared_secret: None,
            added: chrono::Utc::now(),
            tags: vec![],
        }],
        serde_json::Value::Null,
    );

    let mut codec = VaultCodec::new();
    let events_path = PathBuf::from(std::env::temp_dir()).join("tiervault_events.jsonl");
    codec.add_event_sink(Box::new(FileEventSink::new(&events_path)?));

    let envelope = codec.seal_for_self(&vault, OWNER_KEY, Network::Testnet, "mnDemoAddr", 1)?;

    let backup_path = PathBuf::from(std::env::temp_dir()).join("demo_backup.vault");
    std::fs::write(&backup_path, serde_json::to_string_pretty(&envelope)?)?;
    println!("Sealed backup #{} to {}", envelope.metadata.backup_number, backup_path.display());

    // 3. Restore from the file
    let file_contents = std::fs::read_to_string(&backup_path)?;
    let from_disk = serde_json::from_str(&file_contents)?;
    let restored = codec.open(&from_disk, OWNER_KEY)?;
    println!(
        "Restored vault: hierarchy v{}, {} contact(s)",
        restored.blog_keys.current_version,
        restored.contacts.len()
    );

    // 4. Gate content under tier 3, open with the restored segment
    let sealed = encrypt_content("tier-3 inscription body", &tier3_segment, EncryptionLevel::Tier3)?;
    let restored_segment = restored
        .blog_keys
        .current()
        .expect("restored hierarchy")
        .keys
        .segment(EncryptionLevel::Tier3)
        .expect("tier 3 exists");
    let opened = decrypt_content(&sealed.encrypted_data, restored_segment, &sealed.metadata)?;
    assert_eq!(opened, "tier-3 inscription body");
    println!("Tier-3 content round-tripped through the gate");

    // 5. Event log
    println!("Event log: {} record(s)", codec.events().len());
    for record in codec.events().iter() {
        println!("  {:?} -> {} @ {:?}", record.operation, record.outcome, record.timestamp);
    }
    println!("Full event log also written to: {}", events_path.display());

    Ok(())
}
