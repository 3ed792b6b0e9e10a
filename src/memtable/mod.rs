//! MemTable Module
//!
//! In-memory data structure for the writes of one log segment.
//!
//! ## Responsibilities
//! - Keep one entry per user key, ordered by the configured comparator
//! - Latest write to a key replaces the earlier one in place
//! - Exact-match lookups by internal key, tombstones distinguished from absence
//! - Bidirectional cursor and ordered iteration
//!
//! ## Data Structure Choice
//! A sorted `Vec` of spans into one growing byte arena:
//! - Every key and value is copied into the arena, so callers keep their buffers
//! - No per-entry allocation
//! - The table lives for exactly one log segment and is then dropped whole
//!
//! Single owner, no internal locking. Sharing a `MemTable` across threads
//! needs external synchronization.

mod table;

pub use table::{Iter, MemTable, MemTableIterator};

/// Entry stored in the MemTable
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemTableEntry {
    /// A live value
    Value(Vec<u8>),

    /// A tombstone (deleted key)
    Tombstone,
}
