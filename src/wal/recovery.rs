//! WAL Recovery
//!
//! Rebuilds a memtable by replaying a log file.

use std::path::Path;

use tracing::{debug, info};

use crate::env::{Env, SequentialFile};
use crate::error::Result;
use crate::key::{SequenceNumber, ValueType};
use crate::memtable::MemTable;

use super::{LogReader, WalEntry};

/// Handles WAL replay on startup
pub struct WalRecovery;

/// Result of a recovery operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryResult {
    /// Number of records decoded
    pub records_replayed: u64,

    /// Put entries among them
    pub puts: u64,

    /// Delete entries among them
    pub deletes: u64,

    /// Highest sequence number seen (0 for an empty log)
    pub last_sequence: SequenceNumber,

    /// Length of the log prefix made of complete records
    pub valid_bytes: u64,

    /// Whether the log ended in the middle of a record
    pub torn_tail: bool,
}

impl WalRecovery {
    /// Replay every record of `file` into `memtable`, in log order.
    ///
    /// Stops at the end of the log or at a torn tail. A payload that does not
    /// decode aborts the replay with `WalCorruption`.
    pub fn replay<F: SequentialFile>(file: F, memtable: &mut MemTable) -> Result<RecoveryResult> {
        let result = Self::scan(file, |entry| {
            memtable.add(entry.sequence, entry.value_type, &entry.key, &entry.value);
        })?;

        info!(
            records = result.records_replayed,
            puts = result.puts,
            deletes = result.deletes,
            last_sequence = result.last_sequence,
            torn_tail = result.torn_tail,
            "WAL replay finished"
        );
        Ok(result)
    }

    /// Decode a log file without applying it
    pub fn verify(env: &dyn Env, path: &Path) -> Result<RecoveryResult> {
        let file = env.new_sequential_file(path)?;
        Self::scan(file, |_| {})
    }

    fn scan<F, A>(file: F, mut apply: A) -> Result<RecoveryResult>
    where
        F: SequentialFile,
        A: FnMut(WalEntry),
    {
        let mut reader = LogReader::new(file);
        let mut result = RecoveryResult::default();

        while let Some(payload) = reader.read_record()? {
            let entry = WalEntry::decode(&payload)?;
            debug!(
                sequence = entry.sequence,
                value_type = ?entry.value_type,
                key_len = entry.key.len(),
                "replaying WAL entry"
            );

            match entry.value_type {
                ValueType::Value => result.puts += 1,
                ValueType::Deletion => result.deletes += 1,
            }
            result.records_replayed += 1;
            result.last_sequence = result.last_sequence.max(entry.sequence);
            apply(entry);
        }

        result.valid_bytes = reader.valid_offset();
        result.torn_tail = reader.torn_tail();
        Ok(result)
    }
}
