//! Env Module
//!
//! The file abstraction the WAL and the engine are written against.
//!
//! ## Responsibilities
//! - Sequential reads of an existing log
//! - Truncating and appending writers with flush/sync
//! - Directory and file bookkeeping (exists, create, remove, size, truncate)
//!
//! Nothing above this module touches `std::fs` directly, so tests can swap
//! in an environment that fails on demand.

mod posix;

use std::fmt;
use std::path::Path;

use crate::error::Result;

pub use posix::PosixEnv;

/// A file read front to back
pub trait SequentialFile: Send {
    /// Read up to `buf.len()` bytes into `buf`.
    ///
    /// Returns fewer bytes than requested only at end of file; `Ok(0)` means
    /// the file is exhausted.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;
}

/// A file written by appending
pub trait WritableFile: Send {
    fn append(&mut self, data: &[u8]) -> Result<()>;

    /// Push buffered bytes to the OS
    fn flush(&mut self) -> Result<()>;

    /// Flush, then force the bytes to stable storage
    fn sync(&mut self) -> Result<()>;

    fn close(&mut self) -> Result<()>;

    /// Drop anything still buffered without writing it and release the
    /// handle. Bytes already handed to the OS stay in the file.
    fn discard(&mut self);
}

/// Capability surface over the filesystem
pub trait Env: fmt::Debug + Send + Sync {
    fn new_sequential_file(&self, path: &Path) -> Result<Box<dyn SequentialFile>>;

    /// Create `path`, truncating any existing content
    fn new_writable_file(&self, path: &Path) -> Result<Box<dyn WritableFile>>;

    /// Open `path` for appending, creating it if needed
    fn new_appendable_file(&self, path: &Path) -> Result<Box<dyn WritableFile>>;

    fn file_exists(&self, path: &Path) -> bool;

    /// Create `path` and any missing parents
    fn create_dir(&self, path: &Path) -> Result<()>;

    fn remove_file(&self, path: &Path) -> Result<()>;

    /// Remove an empty directory
    fn remove_dir(&self, path: &Path) -> Result<()>;

    fn get_file_size(&self, path: &Path) -> Result<u64>;

    /// Cut `path` down to `len` bytes
    fn truncate_file(&self, path: &Path, len: u64) -> Result<()>;
}

// =============================================================================
// Forwarding and in-memory impls
// =============================================================================

impl<T: SequentialFile + ?Sized> SequentialFile for Box<T> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read(buf)
    }
}

impl<T: WritableFile + ?Sized> WritableFile for Box<T> {
    fn append(&mut self, data: &[u8]) -> Result<()> {
        (**self).append(data)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }

    fn sync(&mut self) -> Result<()> {
        (**self).sync()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }

    fn discard(&mut self) {
        (**self).discard()
    }
}

/// Reads from a byte slice, consuming it as it goes
impl SequentialFile for &[u8] {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let data: &[u8] = *self;
        let n = buf.len().min(data.len());
        let (head, tail) = data.split_at(n);
        buf[..n].copy_from_slice(head);
        *self = tail;
        Ok(n)
    }
}

/// Collects appended bytes in memory
impl WritableFile for Vec<u8> {
    fn append(&mut self, data: &[u8]) -> Result<()> {
        self.extend_from_slice(data);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn sync(&mut self) -> Result<()> {
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }

    /// Nothing is buffered; every append is already in the vector
    fn discard(&mut self) {}
}
