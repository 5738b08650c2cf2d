//! Backup event logging.
//!
//! Records every seal and open attempt with its outcome category. The log
//! is append-only and supports pluggable sinks for forwarding records to
//! files or other stores.
//!
//! Records carry high-level event names and error categories only — never
//! plaintext, key material, or derived keys.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome token for a successful operation.
pub const OUTCOME_OK: &str = "ok";

/// The operations the codec logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    SealVault,
    OpenVault,
}

/// A sink that receives event records. Implement this to forward records
/// to a file, database, or other persistent store.
pub trait EventSink: Send {
    /// Append a record. Called for every seal/open attempt.
    fn append(&mut self, record: EventRecord);
}

/// A permanent record of one codec operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Which operation ran.
    pub operation: Operation,
    /// `"ok"` or the error category token (see `VaultError::category`).
    pub outcome: String,
    /// When the operation completed.
    pub timestamp: DateTime<Utc>,
}

impl EventRecord {
    pub(crate) fn now(operation: Operation, outcome: &str) -> Self {
        Self {
            operation,
            outcome: outcome.to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// An append-only log of codec operations.
/// Can forward records to additional sinks via `add_forward_sink`.
#[derive(Default, Serialize, Deserialize)]
pub struct EventLog {
    records: Vec<EventRecord>,
    #[serde(skip)]
    forward_sinks: Option<Vec<Box<dyn EventSink>>>,
}

impl std::fmt::Debug for EventLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLog")
            .field("records", &self.records)
            .field(
                "forward_sinks",
                &self.forward_sinks.as_ref().map(|s| s.len()),
            )
            .finish()
    }
}

impl EventLog {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            forward_sinks: None,
        }
    }

    /// Add a sink to receive a copy of every record. Useful for persisting
    /// to a file without replacing the in-memory log.
    pub fn add_forward_sink(&mut self, sink: Box<dyn EventSink>) {
        self.forward_sinks.get_or_insert_with(Vec::new).push(sink);
    }

    /// Append a new record to the log and forward it to any attached sinks.
    pub fn append(&mut self, record: EventRecord) {
        if let Some(ref mut sinks) = self.forward_sinks {
            for sink in sinks.iter_mut() {
                sink.append(record.clone());
            }
        }
        self.records.push(record);
    }

    /// Return the number of records in the log.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the log is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over the records.
    pub fn iter(&self) -> std::slice::Iter<'_, EventRecord> {
        self.records.iter()
    }
}

// ---------------------------------------------------------------------------
// Built-in sink: file
// ---------------------------------------------------------------------------

/// Writes event records as JSON lines (one per record) to a file.
/// Creates the file if it doesn't exist; appends if it does.
pub struct FileEventSink {
    file: std::fs::File,
}

impl FileEventSink {
    /// Open or create a file for append-only event logging.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, std::io::Error> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self { file })
    }
}

impl EventSink for FileEventSink {
    fn append(&mut self, record: EventRecord) {
        if let Ok(line) = serde_json::to_string(&record) {
            let _ = writeln!(self.file, "{line}");
            let _ = self.file.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_iterate() {
        let mut log = EventLog::new();
        assert!(log.is_empty());

        log.append(EventRecord::now(Operation::SealVault, OUTCOME_OK));
        log.append(EventRecord::now(Operation::OpenVault, "integrity_check_failure"));

        assert_eq!(log.len(), 2);
        let outcomes: Vec<&str> = log.iter().map(|r| r.outcome.as_str()).collect();
        assert_eq!(outcomes, ["ok", "integrity_check_failure"]);
    }

    #[test]
    fn test_operation_serializes_snake_case() {
        let record = EventRecord::now(Operation::SealVault, OUTCOME_OK);
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["operation"], "seal_vault");
    }
}
