//! Error types for memwal
//!
//! Provides a unified error type for all operations.
//!
//! "Not found" is not an error here: absent keys come back as `None`,
//! tombstones as `MemTableEntry::Tombstone`, and the end of a log as
//! `Ok(None)` from the reader.

use thiserror::Error;

/// Result type alias using MemwalError
pub type Result<T> = std::result::Result<T, MemwalError>;

/// Unified error type for memwal operations
#[derive(Debug, Error)]
pub enum MemwalError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // WAL Errors
    // -------------------------------------------------------------------------
    #[error("WAL corruption detected: {0}")]
    WalCorruption(String),

    #[error("WAL write failed: {0}")]
    WalWrite(String),

    #[error("WAL record too large: {size} bytes (max {max})")]
    RecordTooLarge { size: usize, max: usize },

    // -------------------------------------------------------------------------
    // Engine Errors
    // -------------------------------------------------------------------------
    #[error("Sequence number space exhausted")]
    SequenceExhausted,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}
