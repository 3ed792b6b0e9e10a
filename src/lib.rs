//! # memwal
//!
//! The write path and in-memory read path of a single-node key-value store:
//! - Write-Ahead Logging (WAL) for durability
//! - Crash recovery by replaying the log into a fresh MemTable
//! - Versioned internal keys (user key + sequence number + operation tag)
//! - Ordered, arena-backed MemTable with a bidirectional cursor
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Engine                               │
//! │        (open / recover / put / delete / get / close)         │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │  1. log          2. apply
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │     WAL     │          │  MemTable   │
//!   │  (Append)   │          │  (Sorted)   │
//!   └──────┬──────┘          └─────────────┘
//!          │
//!          ▼
//!   ┌─────────────┐
//!   │     Env     │
//!   │ (file I/O)  │
//!   └─────────────┘
//! ```
//!
//! ## Example
//! ```no_run
//! use memwal::Engine;
//!
//! let mut engine = Engine::open_path(std::path::Path::new("./data"))?;
//! engine.put(b"k1", b"v1")?;
//! assert_eq!(engine.get(b"k1")?, Some(b"v1".to_vec()));
//! engine.close()?;
//! # Ok::<(), memwal::MemwalError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod env;
pub mod key;
pub mod wal;
pub mod memtable;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{MemwalError, Result};
pub use config::{Config, WalSyncStrategy};
pub use engine::Engine;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of memwal
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
