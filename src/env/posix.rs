//! POSIX Env
//!
//! `std::fs`-backed implementation of the file abstraction.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;

use super::{Env, SequentialFile, WritableFile};

/// Write buffer size for log files
const WRITE_BUFFER_SIZE: usize = 64 * 1024;

/// Env over the local filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct PosixEnv;

/// Buffered sequential reader
struct PosixSequentialFile {
    reader: BufReader<File>,
}

impl SequentialFile for PosixSequentialFile {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        // A single read() may return short; keep going until full or EOF
        let mut filled = 0;
        while filled < buf.len() {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(filled)
    }
}

/// Buffered writer; `sync` flushes before fsync
struct PosixWritableFile {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl PosixWritableFile {
    fn new(path: &Path, file: File) -> Self {
        Self {
            path: path.to_path_buf(),
            writer: Some(BufWriter::with_capacity(WRITE_BUFFER_SIZE, file)),
        }
    }

    fn writer(&mut self) -> Result<&mut BufWriter<File>> {
        self.writer.as_mut().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::Other,
                format!("{} is already closed", self.path.display()),
            )
            .into()
        })
    }
}

impl WritableFile for PosixWritableFile {
    fn append(&mut self, data: &[u8]) -> Result<()> {
        self.writer()?.write_all(data)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer()?.flush()?;
        Ok(())
    }

    fn sync(&mut self) -> Result<()> {
        let writer = self.writer()?;
        writer.flush()?;
        writer.get_ref().sync_data()?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
            debug!(path = %self.path.display(), "closed writable file");
        }
        Ok(())
    }

    fn discard(&mut self) {
        // into_parts hands back the buffer instead of flushing it on drop
        if let Some(writer) = self.writer.take() {
            let (_file, unwritten) = writer.into_parts();
            let dropped = unwritten.map(|buf| buf.len()).unwrap_or(0);
            debug!(path = %self.path.display(), dropped, "discarded writable file");
        }
    }
}

impl Env for PosixEnv {
    fn new_sequential_file(&self, path: &Path) -> Result<Box<dyn SequentialFile>> {
        let file = File::open(path)?;
        Ok(Box::new(PosixSequentialFile {
            reader: BufReader::new(file),
        }))
    }

    fn new_writable_file(&self, path: &Path) -> Result<Box<dyn WritableFile>> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        Ok(Box::new(PosixWritableFile::new(path, file)))
    }

    fn new_appendable_file(&self, path: &Path) -> Result<Box<dyn WritableFile>> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Box::new(PosixWritableFile::new(path, file)))
    }

    fn file_exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn create_dir(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)?;
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        fs::remove_file(path)?;
        Ok(())
    }

    fn remove_dir(&self, path: &Path) -> Result<()> {
        fs::remove_dir(path)?;
        Ok(())
    }

    fn get_file_size(&self, path: &Path) -> Result<u64> {
        Ok(fs::metadata(path)?.len())
    }

    fn truncate_file(&self, path: &Path, len: u64) -> Result<()> {
        let file = OpenOptions::new().write(true).open(path)?;
        file.set_len(len)?;
        file.sync_all()?;
        Ok(())
    }
}

