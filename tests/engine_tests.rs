//! Tests for Engine
//!
//! These tests verify:
//! - Open creates the directory and log
//! - Basic get/put/delete operations
//! - Sequence number assignment
//!//! - Open options and destroy

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use memwal::config::{Config, WalSyncStrategy};
use memwal::engine::Engine;
use memwal::env::{Env, PosixEnv, SequentialFile, WritableFile};
use memwal::memtable::MemTableEntry;
use memwal::wal::MAX_RECORD_SIZE;
use memwal::{MemwalError, Result};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_engine() -> (TempDir, Engine) {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp_dir.path().join("db"))
        .wal_sync_strategy(WalSyncStrategy::EveryWrite) // Sync every write for test reliability
        .build();
    let engine = Engine::open(config).unwrap();
    (temp_dir, engine)
}

/// Which operations a `FaultyEnv` should fail
#[derive(Debug, Default)]
struct Faults {
    append: AtomicBool,
    flush: AtomicBool,
    sync: AtomicBool,
    truncate: AtomicBool,
}

impl Faults {
    fn injected(flag: &AtomicBool) -> Result<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(std::io::Error::new(std::io::ErrorKind::Other, "injected failure").into());
        }
        Ok(())
    }

    fn set_all(&self, on: bool) {
        for flag in [&self.append, &self.flush, &self.sync, &self.truncate] {
            flag.store(on, Ordering::SeqCst);
        }
    }
}

/// Env over the real filesystem that fails whatever `faults` says
#[derive(Debug, Default)]
struct FaultyEnv {
    inner: PosixEnv,
    faults: Arc<Faults>,
}

struct FaultyFile {
    inner: Box<dyn WritableFile>,
    faults: Arc<Faults>,
}

impl WritableFile for FaultyFile {
    fn append(&mut self, data: &[u8]) -> Result<()> {
        Faults::injected(&self.faults.append)?;
        self.inner.append(data)
    }

    fn flush(&mut self) -> Result<()> {
        Faults::injected(&self.faults.flush)?;
        self.inner.flush()
    }

    fn sync(&mut self) -> Result<()> {
        Faults::injected(&self.faults.sync)?;
        self.inner.sync()
    }

    fn close(&mut self) -> Result<()> {
        self.inner.close()
    }

    fn discard(&mut self) {
        self.inner.discard()
    }
}

impl FaultyEnv {
    fn wrap(&self, inner: Box<dyn WritableFile>) -> Box<dyn WritableFile> {
        Box::new(FaultyFile {
            inner,
            faults: Arc::clone(&self.faults),
        })
    }
}

impl Env for FaultyEnv {
    fn new_sequential_file(&self, path: &Path) -> Result<Box<dyn SequentialFile>> {
        self.inner.new_sequential_file(path)
    }

    fn new_writable_file(&self, path: &Path) -> Result<Box<dyn WritableFile>> {
        Ok(self.wrap(self.inner.new_writable_file(path)?))
    }

    fn new_appendable_file(&self, path: &Path) -> Result<Box<dyn WritableFile>> {
        Ok(self.wrap(self.inner.new_appendable_file(path)?))
    }

    fn file_exists(&self, path: &Path) -> bool {
        self.inner.file_exists(path)
    }

    fn create_dir(&self, path: &Path) -> Result<()> {
        self.inner.create_dir(path)
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        self.inner.remove_file(path)
    }

    fn remove_dir(&self, path: &Path) -> Result<()> {
        self.inner.remove_dir(path)
    }

    fn get_file_size(&self, path: &Path) -> Result<u64> {
        self.inner.get_file_size(path)
    }

    fn truncate_file(&self, path: &Path, len: u64) -> Result<()> {
        Faults::injected(&self.faults.truncate)?;
        self.inner.truncate_file(path, len)
    }
}

fn setup_faulty_engine(strategy: WalSyncStrategy) -> (TempDir, Arc<Faults>, Engine) {
    let temp_dir = TempDir::new().unwrap();
    let env = FaultyEnv::default();
    let faults = Arc::clone(&env.faults);
    let config = Config::builder()
        .data_dir(temp_dir.path().join("db"))
        .wal_sync_strategy(strategy)
        .env(Arc::new(env))
        .build();
    let engine = Engine::open(config).unwrap();
    (temp_dir, faults, engine)
}

/// Reopen the store under `temp_dir` with a healthy env
fn reopen(temp_dir: &TempDir) -> Engine {
    Engine::open_path(&temp_dir.path().join("db")).unwrap()
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_engine_open_creates_directory_and_log() {
    let temp_dir = TempDir::new().unwrap();
    let data_dir = temp_dir.path().join("nested").join("mydb");

    let config = Config::builder().data_dir(&data_dir).build();
    let engine = Engine::open(config).unwrap();

    assert!(data_dir.exists());
    assert!(data_dir.join("wal.log").exists());
    assert_eq!(engine.wal_path(), data_dir.join("wal.log"));
    assert_eq!(engine.last_sequence(), 0);
    assert_eq!(engine.memtable_entry_count(), 0);
}

#[test]
fn test_engine_put_get() {
    let (_temp, mut engine) = setup_temp_engine();

    engine.put(b"hello", b"world").unwrap();

    assert_eq!(engine.get(b"hello").unwrap(), Some(b"world".to_vec()));
}

#[test]
fn test_engine_get_nonexistent_key() {
    let (_temp, engine) = setup_temp_engine();

    assert_eq!(engine.get(b"nonexistent").unwrap(), None);
}

#[test]
fn test_engine_put_overwrite() {
    let (_temp, mut engine) = setup_temp_engine();

    engine.put(b"key", b"value1").unwrap();
    engine.put(b"key", b"value2").unwrap();

    assert_eq!(engine.get(b"key").unwrap(), Some(b"value2".to_vec()));
    assert_eq!(engine.memtable_entry_count(), 1);
}

#[test]
fn test_engine_delete() {
    let (_temp, mut engine) = setup_temp_engine();

    engine.put(b"key", b"value").unwrap();
    engine.delete(b"key").unwrap();

    assert_eq!(engine.get(b"key").unwrap(), None);
    assert_eq!(engine.memtable().get_latest(b"key"), Some(MemTableEntry::Tombstone));
}

#[test]
fn test_engine_delete_missing_key_writes_tombstone() {
    let (_temp, mut engine) = setup_temp_engine();

    engine.delete(b"ghost").unwrap();

    assert_eq!(engine.get(b"ghost").unwrap(), None);
    assert_eq!(engine.memtable_entry_count(), 1);
}

#[test]
fn test_engine_sequence_numbers_increase() {
    let (_temp, mut engine) = setup_temp_engine();

    assert_eq!(engine.put(b"a", b"1").unwrap(), 1);
    assert_eq!(engine.put(b"b", b"2").unwrap(), 2);
    assert_eq!(engine.delete(b"a").unwrap(), 3);
    assert_eq!(engine.last_sequence(), 3);
}

#[test]
fn test_engine_scan_skips_tombstones() {
    let (_temp, mut engine) = setup_temp_engine();

    engine.put(b"c", b"3").unwrap();
    engine.put(b"a", b"1").unwrap();
    engine.put(b"b", b"2").unwrap();
    engine.delete(b"b").unwrap();

    assert_eq!(
        engine.scan(),
        vec![(b"a".to_vec(), b"1".to_vec()), (b"c".to_vec(), b"3".to_vec())]
    );

    // The cursor still sees the tombstone
    let mut iter = engine.iter();
    let mut keys = Vec::new();
    iter.seek_to_first();
    while iter.valid() {
        keys.push(iter.key().to_vec());
        iter.next();
    }
    assert_eq!(keys, vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);
}

#[test]
fn test_engine_binary_keys_and_values() {
    let (_temp, mut engine) = setup_temp_engine();
    let key = [0u8, 255, 1, 254];
    let value = [0u8; 300];

    engine.put(&key, &value).unwrap();

    assert_eq!(engine.get(&key).unwrap(), Some(value.to_vec()));
}

#[test]
fn test_engine_oversized_write_rejected_and_not_applied() {
    let (_temp, mut engine) = setup_temp_engine();
    let value = vec![0u8; MAX_RECORD_SIZE];

    let result = engine.put(b"big", &value);

    assert!(matches!(result, Err(MemwalError::RecordTooLarge { .. })));
    assert_eq!(engine.get(b"big").unwrap(), None);
    assert_eq!(engine.last_sequence(), 0);

    // Not a WAL failure: later writes still go through
    engine.put(b"small", b"ok").unwrap();
    assert_eq!(engine.last_sequence(), 1);
}

// =============================================================================
// Write-Ahead Ordering Tests
// =============================================================================

#[test]
fn test_failed_put_leaves_memtable_untouched() {
    let (_temp, faults, mut engine) = setup_faulty_engine(WalSyncStrategy::FlushOnly);
    engine.put(b"k", b"v1").unwrap();

    faults.append.store(true, Ordering::SeqCst);
    let result = engine.put(b"k", b"v2");

    assert!(matches!(result, Err(MemwalError::Io(_))));
    assert_eq!(engine.get(b"k").unwrap(), Some(b"v1".to_vec()));
    assert_eq!(engine.last_sequence(), 1);
}

#[test]
fn test_failed_delete_leaves_memtable_untouched() {
    let (_temp, faults, mut engine) = setup_faulty_engine(WalSyncStrategy::FlushOnly);
    engine.put(b"k", b"v1").unwrap();

    faults.flush.store(true, Ordering::SeqCst);
    assert!(engine.delete(b"k").is_err());

    assert_eq!(engine.get(b"k").unwrap(), Some(b"v1".to_vec()));
    assert_eq!(engine.memtable().get_latest(b"k"), Some(MemTableEntry::Value(b"v1".to_vec())));
}

#[test]
fn test_wal_failure_blocks_later_writes() {
    let (_temp, faults, mut engine) = setup_faulty_engine(WalSyncStrategy::FlushOnly);

    faults.set_all(true);
    assert!(engine.put(b"a", b"1").is_err());

    // The writer was released on failure; the disk being healthy again
    // does not bring it back
    faults.set_all(false);
    let result = engine.put(b"b", b"2");

    assert!(matches!(result, Err(MemwalError::WalWrite(_))));
    assert_eq!(engine.get(b"b").unwrap(), None);

    // Reads keep working
    assert_eq!(engine.get(b"a").unwrap(), None);
}

#[test]
fn test_failed_flush_not_replayed_after_reopen() {
    let (temp, faults, mut engine) = setup_faulty_engine(WalSyncStrategy::EveryWrite);
    engine.put(b"a", b"1").unwrap();
    let acknowledged = engine.wal_offset();

    // Header and payload sit in the write buffer when flush fails
    faults.flush.store(true, Ordering::SeqCst);
    assert!(matches!(engine.put(b"k", b"failed"), Err(MemwalError::Io(_))));
    assert_eq!(engine.get(b"k").unwrap(), None);

    faults.flush.store(false, Ordering::SeqCst);
    assert_eq!(engine.env().get_file_size(engine.wal_path()).unwrap(), acknowledged);
    engine.close().unwrap();

    let mut engine = reopen(&temp);
    assert_eq!(engine.get(b"k").unwrap(), None);
    assert_eq!(engine.get(b"a").unwrap(), Some(b"1".to_vec()));
    assert_eq!(engine.last_sequence(), 1);

    // The reopened store takes writes again
    assert_eq!(engine.put(b"k", b"ok").unwrap(), 2);
}

#[test]
fn test_failed_sync_not_replayed_after_reopen() {
    let (temp, faults, mut engine) = setup_faulty_engine(WalSyncStrategy::EveryWrite);
    engine.put(b"a", b"1").unwrap();
    let acknowledged = engine.wal_offset();

    // The record is already flushed to the file when sync fails
    faults.sync.store(true, Ordering::SeqCst);
    assert!(matches!(engine.put(b"k", b"failed"), Err(MemwalError::Io(_))));
    assert_eq!(engine.get(b"k").unwrap(), None);

    faults.sync.store(false, Ordering::SeqCst);
    assert_eq!(engine.env().get_file_size(engine.wal_path()).unwrap(), acknowledged);
    engine.close().unwrap();

    let engine = reopen(&temp);
    assert_eq!(engine.get(b"k").unwrap(), None);
    assert_eq!(engine.get(b"a").unwrap(), Some(b"1".to_vec()));
    assert_eq!(engine.last_sequence(), 1);
}

#[test]
fn test_failed_delete_not_replayed_after_drop() {
    let (temp, faults, mut engine) = setup_faulty_engine(WalSyncStrategy::FlushOnly);
    engine.put(b"a", b"1").unwrap();

    faults.flush.store(true, Ordering::SeqCst);
    assert!(engine.delete(b"a").is_err());
    faults.flush.store(false, Ordering::SeqCst);

    // No close: dropping must not push the buffered tombstone out either
    drop(engine);

    let engine = reopen(&temp);
    assert_eq!(engine.get(b"a").unwrap(), Some(b"1".to_vec()));
    assert_eq!(engine.last_sequence(), 1);
}

#[test]
fn test_failed_rollback_reported_as_wal_write() {
    let (_temp, faults, mut engine) = setup_faulty_engine(WalSyncStrategy::EveryWrite);
    engine.put(b"a", b"1").unwrap();

    faults.sync.store(true, Ordering::SeqCst);
    faults.truncate.store(true, Ordering::SeqCst);
    let result = engine.put(b"k", b"failed");

    match result {
        Err(MemwalError::WalWrite(reason)) => {
            assert!(reason.contains("injected failure"));
            assert!(reason.contains("rolling the log back"));
        }
        other => panic!("expected WalWrite, got {:?}", other),
    }
    assert_eq!(engine.get(b"k").unwrap(), None);
}

#[test]
fn test_wal_offset_tracks_acknowledged_records() {
    let (temp, mut engine) = setup_temp_engine();
    assert_eq!(engine.wal_offset(), 0);

    engine.put(b"k", b"v").unwrap();
    engine.delete(b"k").unwrap();
    let offset = engine.wal_offset();
    assert_eq!(engine.env().get_file_size(engine.wal_path()).unwrap(), offset);
    engine.close().unwrap();

    // Recovery starts appending where the last record ended
    let engine = reopen(&temp);
    assert_eq!(engine.wal_offset(), offset);
}

// =============================================================================
// Open Options Tests
// =============================================================================

#[test]
fn test_create_if_missing_false() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp_dir.path().join("absent"))
        .create_if_missing(false)
        .build();

    let result = Engine::open(config);

    assert!(matches!(result, Err(MemwalError::InvalidArgument(_))));
    assert!(!temp_dir.path().join("absent").exists());
}

#[test]
fn test_error_if_exists() {
    let temp_dir = TempDir::new().unwrap();
    let data_dir = temp_dir.path().join("db");
    Engine::open_path(&data_dir).unwrap().close().unwrap();

    let config = Config::builder().data_dir(&data_dir).error_if_exists(true).build();

    assert!(matches!(Engine::open(config), Err(MemwalError::InvalidArgument(_))));
}

#[test]
fn test_invalid_config_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp_dir.path().join("db"))
        .wal_sync_strategy(WalSyncStrategy::EveryNEntries { count: 0 })
        .build();

    assert!(matches!(Engine::open(config), Err(MemwalError::Config(_))));
}

#[test]
fn test_destroy_removes_store() {
    let temp_dir = TempDir::new().unwrap();
    let data_dir = temp_dir.path().join("db");
    let config = Config::builder().data_dir(&data_dir).build();

    let mut engine = Engine::open(config.clone()).unwrap();
    engine.put(b"k", b"v").unwrap();
    engine.close().unwrap();

    Engine::destroy(&config).unwrap();

    assert!(!data_dir.exists());
    let engine = Engine::open(config).unwrap();
    assert_eq!(engine.get(b"k").unwrap(), None);
}

#[test]
fn test_sync_and_close() {
    let (_temp, mut engine) = setup_temp_engine();

    engine.put(b"k", b"v").unwrap();
    engine.sync().unwrap();
    engine.close().unwrap();
}
