//! WAL Reader
//!
//! Reads framed records back out of a log file, one call per record.

use tracing::warn;

use crate::env::SequentialFile;
use crate::error::Result;

use super::HEADER_SIZE;

/// Reads length-prefixed records from a log file
pub struct LogReader<F: SequentialFile> {
    file: F,
    /// End offset of the last complete record
    valid_offset: u64,
    torn_tail: bool,
}

impl<F: SequentialFile> LogReader<F> {
    pub fn new(file: F) -> Self {
        Self {
            file,
            valid_offset: 0,
            torn_tail: false,
        }
    }

    /// Read the next record payload.
    ///
    /// Returns `Ok(None)` at the end of the log. A header or payload cut
    /// short by end of file also ends the log and is reported through
    /// [`LogReader::torn_tail`]. I/O errors propagate.
    pub fn read_record(&mut self) -> Result<Option<Vec<u8>>> {
        if self.torn_tail {
            return Ok(None);
        }

        let mut header = [0u8; HEADER_SIZE];
        let n = self.file.read(&mut header)?;
        if n == 0 {
            return Ok(None);
        }
        if n < HEADER_SIZE {
            warn!(offset = self.valid_offset, "WAL ends inside a record header");
            self.torn_tail = true;
            return Ok(None);
        }

        let len = u16::from_le_bytes(header) as usize;
        let mut payload = vec![0u8; len];
        let n = self.file.read(&mut payload)?;
        if n < len {
            warn!(
                offset = self.valid_offset,
                expected = len,
                got = n,
                "WAL ends inside a record payload"
            );
            self.torn_tail = true;
            return Ok(None);
        }

        self.valid_offset += (HEADER_SIZE + len) as u64;
        Ok(Some(payload))
    }

    /// Byte offset just past the last complete record read so far
    pub fn valid_offset(&self) -> u64 {
        self.valid_offset
    }

    /// Whether the log ended in the middle of a record
    pub fn torn_tail(&self) -> bool {
        self.torn_tail
    }
}
