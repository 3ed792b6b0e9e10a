//! WAL Writer
//!
//! Frames payloads and appends them to the log file.

use tracing::trace;

use crate::config::WalSyncStrategy;
use crate::env::WritableFile;
use crate::error::{MemwalError, Result};

use super::{HEADER_SIZE, MAX_RECORD_SIZE};

/// Appends length-prefixed records to a log file
pub struct LogWriter<W: WritableFile> {
    dest: W,
    sync_strategy: WalSyncStrategy,
    /// Records flushed since the last fsync
    uncommitted: usize,
    records_written: u64,
}

impl<W: WritableFile> LogWriter<W> {
    pub fn new(dest: W, sync_strategy: WalSyncStrategy) -> Self {
        Self {
            dest,
            sync_strategy,
            uncommitted: 0,
            records_written: 0,
        }
    }

    /// Append one record and flush it.
    ///
    /// Writes the 2-byte header, then the payload, then flushes (and fsyncs
    /// if the strategy says so); the first failure is returned. A failure
    /// after the header may leave a torn record at the end of the file, and
    /// the record is not counted.
    pub fn add_record(&mut self, payload: &[u8]) -> Result<()> {
        if payload.len() > MAX_RECORD_SIZE {
            return Err(MemwalError::RecordTooLarge {
                size: payload.len(),
                max: MAX_RECORD_SIZE,
            });
        }

        let header: [u8; HEADER_SIZE] = (payload.len() as u16).to_le_bytes();
        self.dest.append(&header)?;
        self.dest.append(payload)?;
        self.dest.flush()?;

        let sync_due = match self.sync_strategy {
            WalSyncStrategy::FlushOnly => false,
            WalSyncStrategy::EveryWrite => true,
            WalSyncStrategy::EveryNEntries { count } => self.uncommitted + 1 >= count,
        };
        if sync_due {
            self.sync()?;
        } else {
            self.uncommitted += 1;
        }

        self.records_written += 1;
        trace!(len = payload.len(), records = self.records_written, "appended WAL record");
        Ok(())
    }

    /// Force everything written so far to stable storage
    pub fn sync(&mut self) -> Result<()> {
        self.dest.sync()?;
        self.uncommitted = 0;
        Ok(())
    }

    /// Records appended but not yet fsynced
    pub fn uncommitted_count(&self) -> usize {
        self.uncommitted
    }

    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// Flush and release the underlying file
    pub fn close(mut self) -> Result<()> {
        self.dest.close()
    }

    /// Release the underlying file without writing anything still buffered
    ///
    /// Used after a failed append so a half-written record never reaches
    /// the file through a later flush.
    pub fn discard(&mut self) {
        self.dest.discard();
    }

    /// Give back the destination file (used by tests to inspect bytes)
    pub fn into_inner(self) -> W {
        self.dest
    }
}
