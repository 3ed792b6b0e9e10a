//! Write-Ahead Log (WAL) Module
//!
//! Provides durability through append-only logging.
//!
//! ## Responsibilities
//! - Frame each payload with a length header and append it
//! - Read framed payloads back in order
//! - Encode/decode the put/delete entries carried in each payload
//! - Replay a log into a fresh memtable on startup
//!
//! ## File Format
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ Record 1                                                 │
//! │ ┌─────────┬────────────────────────────────────────────┐ │
//! │ │ Len (2) │ Payload (Len bytes)                        │ │
//! │ └─────────┴────────────────────────────────────────────┘ │
//! ├──────────────────────────────────────────────────────────┤
//! │ Record 2 ...                                             │
//! └──────────────────────────────────────────────────────────┘
//!
//! Payload:
//! ┌─────────────┬──────────┬────────────────┬─────────┐
//! │ KeyLen (4)  │ User Key │ Seq+Tag (8)    │ Value   │
//! └─────────────┴──────────┴────────────────┴─────────┘
//! ```
//! All integers are little-endian. `KeyLen` counts the user key plus the
//! 8-byte suffix. There is no checksum: a damaged length field is not
//! detected, only a payload that cannot be decoded is.

mod entry;
mod writer;
mod reader;
mod recovery;

pub use entry::WalEntry;
pub use writer::LogWriter;
pub use reader::LogReader;
pub use recovery::{RecoveryResult, WalRecovery};

/// Record header: payload length as a little-endian u16
pub const HEADER_SIZE: usize = 2;

/// Largest payload a single record can carry
pub const MAX_RECORD_SIZE: usize = u16::MAX as usize;
