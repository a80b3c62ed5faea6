//! Database Storage
//!
//! A loaded database lives either in an owned buffer or in a read-only memory
//! map. Files ending in `.gz` (case-insensitive) are decompressed into an owned
//! buffer; they cannot be mapped.

use crate::error::{IpdbError, Result};
use flate2::read::GzDecoder;
use memmap2::Mmap;
use std::fs::File;
use std::io::{self, stdin, BufRead, BufReader, Read};
use std::path::Path;
use tracing::debug;

/// Buffer size for text input (128KB)
const BUFFER_SIZE: usize = 128 * 1024;

/// Bytes backing one loaded snapshot
pub enum DatabaseStorage {
    /// Heap buffer (read or decompressed file, or caller-supplied bytes)
    Owned(Vec<u8>),
    /// Read-only memory map of the file
    Mmap(Mmap),
}

impl DatabaseStorage {
    /// View the whole file
    pub fn as_slice(&self) -> &[u8] {
        match self {
            DatabaseStorage::Owned(v) => v.as_slice(),
            DatabaseStorage::Mmap(m) => &m[..],
        }
    }

    /// True when backed by a memory map
    pub fn is_mapped(&self) -> bool {
        matches!(self, DatabaseStorage::Mmap(_))
    }

    /// Load a database file
    ///
    /// A missing or unreadable file is a `Read` error. With `memory_map` set,
    /// plain files are mapped instead of read.
    pub fn load(path: &Path, memory_map: bool) -> Result<Self> {
        let file = File::open(path).map_err(|e| read_error(path, e))?;

        if is_gzip(path) {
            if memory_map {
                debug!(path = %path.display(), "compressed database is read, not mapped");
            }
            let mut data = Vec::new();
            GzDecoder::new(file)
                .read_to_end(&mut data)
                .map_err(|e| read_error(path, e))?;
            return Ok(DatabaseStorage::Owned(data));
        }

        if memory_map {
            // SAFETY: the file must not be truncated or modified while
            // mapped; updates replace it with an atomic rename. Bounds checks
            // cannot guard against bytes changing under the map.
            let mmap = unsafe { Mmap::map(&file) }.map_err(|e| read_error(path, e))?;
            return Ok(DatabaseStorage::Mmap(mmap));
        }

        let mut data = Vec::new();
        BufReader::with_capacity(BUFFER_SIZE, file)
            .read_to_end(&mut data)
            .map_err(|e| read_error(path, e))?;
        Ok(DatabaseStorage::Owned(data))
    }
}

impl std::fmt::Debug for DatabaseStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatabaseStorage::Owned(v) => write!(f, "Owned({} bytes)", v.len()),
            DatabaseStorage::Mmap(m) => write!(f, "Mmap({} bytes)", m.len()),
        }
    }
}

fn read_error(path: &Path, err: io::Error) -> IpdbError {
    IpdbError::Read(format!("{}: {}", path.display(), err))
}

/// True if the path ends in `.gz` (any case)
pub fn is_gzip(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("gz"))
        .unwrap_or(false)
}

/// Open a text input for line-oriented reading
///
/// `.gz` files are decompressed on the fly; `-` reads stdin.
pub fn open_text<P: AsRef<Path>>(path: P) -> io::Result<Box<dyn BufRead + Send>> {
    let path = path.as_ref();

    if path.to_str() == Some("-") {
        return Ok(Box::new(BufReader::with_capacity(BUFFER_SIZE, stdin())));
    }

    let file = File::open(path)?;
    if is_gzip(path) {
        Ok(Box::new(BufReader::with_capacity(
            BUFFER_SIZE,
            GzDecoder::new(file),
        )))
    } else {
        Ok(Box::new(BufReader::with_capacity(BUFFER_SIZE, file)))
    }
}
