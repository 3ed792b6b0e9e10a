//! Engine Module
//!
//! Recovery and write-path orchestration for one store instance.
//!
//! ## Responsibilities
//! - Decide on startup between a fresh store and replaying `wal.log`
//! - Assign sequence numbers to writes
//! - Log every mutation before applying it to the MemTable
//! - Release file handles on close

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::env::{Env, WritableFile};
use crate::error::{MemwalError, Result};
use crate::key::{InternalKeyComparator, SequenceNumber, ValueType, MAX_SEQUENCE_NUMBER};
use crate::memtable::{MemTable, MemTableEntry, MemTableIterator};
use crate::wal::{LogWriter, RecoveryResult, WalEntry, WalRecovery, HEADER_SIZE};

/// The storage engine: one WAL segment plus the MemTable it describes
///
/// ## Write discipline
/// Every `put`/`delete` is encoded, appended to the WAL and flushed before
/// the MemTable changes. If the append fails the MemTable is left alone, the
/// log is cut back to the end of the last acknowledged record, and the
/// engine refuses further writes.
///
/// ## Concurrency
/// Single owner. Writes take `&mut self`; wrap the engine in a lock to share
/// it between threads.
pub struct Engine {
    /// Engine configuration
    config: Config,

    env: Arc<dyn Env>,

    wal_path: PathBuf,

    /// Write-ahead log for durability
    wal: LogWriter<Box<dyn WritableFile>>,

    /// In-memory table for the current log segment
    memtable: MemTable,

    /// Sequence number of the last successful write
    last_sequence: SequenceNumber,

    /// Length of the log up to the end of the last acknowledged record
    wal_offset: u64,

    /// Set once a WAL append fails
    wal_error: Option<String>,
}

impl Engine {
    // =========================================================================
    // Internal Path Constants
    // =========================================================================
    const WAL_FILENAME: &'static str = "wal.log";

    /// Open or create an engine with the given config
    ///
    /// On startup:
    /// 1. If `wal.log` exists, replay it into a fresh MemTable and reopen it
    ///    for append (a torn tail is cut off first)
    /// 2. Otherwise create the data directory and an empty `wal.log`
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;

        let env = Arc::clone(&config.env);
        let wal_path = Self::wal_path_for(&config.data_dir);
        let mut memtable = MemTable::new(InternalKeyComparator::new(Arc::clone(&config.comparator)));

        let (file, last_sequence, wal_offset) = if env.file_exists(&wal_path) {
            if config.error_if_exists {
                return Err(MemwalError::InvalidArgument(format!(
                    "{} already exists",
                    wal_path.display()
                )));
            }

            info!(path = %wal_path.display(), "recovering from WAL");
            let result = Self::recover(env.as_ref(), &wal_path, &mut memtable)?;
            (
                env.new_appendable_file(&wal_path)?,
                result.last_sequence,
                result.valid_bytes,
            )
        } else {
            if !config.create_if_missing {
                return Err(MemwalError::InvalidArgument(format!(
                    "{} does not exist (create_if_missing is false)",
                    wal_path.display()
                )));
            }

            info!(dir = %config.data_dir.display(), "creating new store");
            env.create_dir(&config.data_dir)?;
            (env.new_writable_file(&wal_path)?, 0, 0)
        };

        info!(
            entries = memtable.entry_count(),
            last_sequence,
            comparator = config.comparator.name(),
            "engine open"
        );

        Ok(Self {
            wal: LogWriter::new(file, config.wal_sync_strategy),
            config,
            env,
            wal_path,
            memtable,
            last_sequence,
            wal_offset,
            wal_error: None,
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(Config::builder().data_dir(path).build())
    }

    /// Remove the log and the store directory
    pub fn destroy(config: &Config) -> Result<()> {
        let env = config.env.as_ref();
        let wal_path = Self::wal_path_for(&config.data_dir);

        if env.file_exists(&wal_path) {
            env.remove_file(&wal_path)?;
        }
        if env.file_exists(&config.data_dir) {
            env.remove_dir(&config.data_dir)?;
        }
        info!(dir = %config.data_dir.display(), "store destroyed");
        Ok(())
    }

    /// Replay `wal_path` into `memtable`, cutting off a torn tail
    fn recover(env: &dyn Env, wal_path: &Path, memtable: &mut MemTable) -> Result<RecoveryResult> {
        let file = env.new_sequential_file(wal_path)?;
        let result = WalRecovery::replay(file, memtable)?;

        if result.torn_tail {
            let file_size = env.get_file_size(wal_path)?;
            warn!(
                valid_bytes = result.valid_bytes,
                file_size,
                "truncating torn record at end of WAL"
            );
            env.truncate_file(wal_path, result.valid_bytes)?;
        }

        Ok(result)
    }

    fn wal_path_for(data_dir: &Path) -> PathBuf {
        data_dir.join(Self::WAL_FILENAME)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Get the latest value for a key
    ///
    /// `Ok(None)` for a key that was never written or was deleted.
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(match self.memtable.get_latest(key) {
            Some(MemTableEntry::Value(value)) => Some(value),
            Some(MemTableEntry::Tombstone) | None => None,
        })
    }

    /// Cursor over the MemTable, tombstones included
    pub fn iter(&self) -> MemTableIterator<'_> {
        self.memtable.new_iterator()
    }

    /// All live key-value pairs in key order
    pub fn scan(&self) -> Vec<(Vec<u8>, Vec<u8>)> {
        self.memtable
            .iter()
            .filter_map(|(key, value)| value.map(|v| (key.to_vec(), v.to_vec())))
            .collect()
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Put a key-value pair, returning its sequence number
    pub fn put(&mut self, key: &[u8], value: &[u8]) -> Result<SequenceNumber> {
        self.write(ValueType::Value, key, value)
    }

    /// Delete a key by writing a tombstone, returning its sequence number
    pub fn delete(&mut self, key: &[u8]) -> Result<SequenceNumber> {
        self.write(ValueType::Deletion, key, &[])
    }

    /// Log first, then apply
    fn write(&mut self, value_type: ValueType, key: &[u8], value: &[u8]) -> Result<SequenceNumber> {
        if let Some(reason) = &self.wal_error {
            return Err(MemwalError::WalWrite(format!(
                "store is read-only after an earlier WAL failure: {}",
                reason
            )));
        }

        let sequence = self.last_sequence + 1;
        if sequence > MAX_SEQUENCE_NUMBER {
            return Err(MemwalError::SequenceExhausted);
        }

        // Encoding and size checks fail before anything reaches the file
        let payload = WalEntry::new(sequence, value_type, key, value).encode()?;

        if let Err(e) = self.wal.add_record(&payload) {
            if matches!(e, MemwalError::RecordTooLarge { .. }) {
                return Err(e);
            }
            error!(sequence, error = %e, "WAL append failed");
            return Err(self.abandon_record(e));
        }

        self.memtable.add(sequence, value_type, key, value);
        self.last_sequence = sequence;
        self.wal_offset += (HEADER_SIZE + payload.len()) as u64;
        debug!(sequence, ?value_type, key_len = key.len(), "write applied");

        Ok(sequence)
    }

    /// Take back a record whose append failed and poison the engine
    ///
    /// Any part of the record may already be in the file or still sit in
    /// the writer's buffer. The buffer is dropped unwritten and the file is
    /// cut back to `wal_offset`, so the failed write cannot come back on the
    /// next replay.
    fn abandon_record(&mut self, cause: MemwalError) -> MemwalError {
        self.wal.discard();

        match self.env.truncate_file(&self.wal_path, self.wal_offset) {
            Ok(()) => {
                warn!(offset = self.wal_offset, "WAL rolled back to last acknowledged record");
                self.wal_error = Some(cause.to_string());
                cause
            }
            Err(truncate_err) => {
                error!(
                    offset = self.wal_offset,
                    error = %truncate_err,
                    "could not roll back failed WAL record"
                );
                let reason = format!(
                    "{}; rolling the log back to {} bytes also failed: {}",
                    cause, self.wal_offset, truncate_err
                );
                self.wal_error = Some(reason.clone());
                MemwalError::WalWrite(reason)
            }
        }
    }

    /// Force the WAL to stable storage
    pub fn sync(&mut self) -> Result<()> {
        self.wal.sync()
    }

    /// Close the engine, flushing and releasing the WAL handle
    ///
    /// Dropping an engine without calling this still flushes through the
    /// writer's own drop. After a WAL failure the handle is already gone and
    /// nothing is written.
    pub fn close(self) -> Result<()> {
        info!(
            last_sequence = self.last_sequence,
            records_written = self.wal.records_written(),
            "closing engine"
        );
        self.wal.close()
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    pub fn wal_path(&self) -> &Path {
        &self.wal_path
    }

    /// Bytes of the log covered by acknowledged records
    pub fn wal_offset(&self) -> u64 {
        self.wal_offset
    }

    /// Sequence number of the last successful write (0 before any)
    pub fn last_sequence(&self) -> SequenceNumber {
        self.last_sequence
    }

    pub fn memtable(&self) -> &MemTable {
        &self.memtable
    }

    /// Get the current memtable size
    pub fn memtable_size(&self) -> usize {
        self.memtable.approximate_memory_usage()
    }

    /// Get the memtable entry count
    pub fn memtable_entry_count(&self) -> usize {
        self.memtable.entry_count()
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn env(&self) -> &dyn Env {
        self.env.as_ref()
    }
}
