//! Configuration for memwal
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;
use std::sync::Arc;

use crate::env::{Env, PosixEnv};
use crate::error::{MemwalError, Result};
use crate::key::{BytewiseComparator, Comparator};

/// Main configuration for a memwal store instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Store directory.
    /// Internal structure:
    ///   {data_dir}/
    ///     └── wal.log          (write-ahead log)
    pub data_dir: PathBuf,

    /// Create `data_dir` and a fresh log when no log exists yet
    pub create_if_missing: bool,

    /// Refuse to open a directory that already holds a log
    pub error_if_exists: bool,

    /// File abstraction every I/O goes through
    pub env: Arc<dyn Env>,

    // -------------------------------------------------------------------------
    // WAL Configuration
    // -------------------------------------------------------------------------
    /// Sync strategy: how often to fsync WAL
    pub wal_sync_strategy: WalSyncStrategy,

    // -------------------------------------------------------------------------
    // MemTable Configuration
    // -------------------------------------------------------------------------
    /// Orders user keys inside the memtable
    pub comparator: Arc<dyn Comparator>,
}

/// WAL sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalSyncStrategy {
    /// Flush to the OS after every record, never fsync on our own
    FlushOnly,

    /// fsync after every write (safest, slowest)
    EveryWrite,

    /// fsync after N uncommitted entries (balanced durability/performance)
    EveryNEntries { count: usize },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./memwal_data"),
            create_if_missing: true,
            error_if_exists: false,
            env: Arc::new(PosixEnv),
            wal_sync_strategy: WalSyncStrategy::FlushOnly,
            comparator: Arc::new(BytewiseComparator),
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check the values that `Engine::open` cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(MemwalError::Config("data_dir must not be empty".to_string()));
        }
        if let WalSyncStrategy::EveryNEntries { count: 0 } = self.wal_sync_strategy {
            return Err(MemwalError::Config(
                "EveryNEntries sync strategy needs a count of at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (holds the WAL)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the WAL sync strategy
    pub fn wal_sync_strategy(mut self, strategy: WalSyncStrategy) -> Self {
        self.config.wal_sync_strategy = strategy;
        self
    }

    /// Create the store if no log exists
    pub fn create_if_missing(mut self, yes: bool) -> Self {
        self.config.create_if_missing = yes;
        self
    }

    /// Fail to open if a log already exists
    pub fn error_if_exists(mut self, yes: bool) -> Self {
        self.config.error_if_exists = yes;
        self
    }

    /// Set the user key comparator
    pub fn comparator(mut self, comparator: Arc<dyn Comparator>) -> Self {
        self.config.comparator = comparator;
        self
    }

    /// Set the file environment
    pub fn env(mut self, env: Arc<dyn Env>) -> Self {
        self.config.env = env;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
