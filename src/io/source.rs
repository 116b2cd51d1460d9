//! Byte Sources
//!
//! Random-access inputs for the reader. A source always supports
//! positioned reads; it may additionally expose a mapped view of its whole
//! content, which the reader prefers when present.

use std::fs::File;
use std::io;
use std::path::Path;

use memmap2::{Mmap, MmapOptions};
use tracing::debug;

use crate::error::Result;

/// Random-access, read-only byte input
pub trait ByteSource {
    /// Total length in bytes
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fill `buf` from `offset`, retrying interrupted reads.
    /// Fails with `UnexpectedEof` if the source ends first.
    fn read_exact_at(&self, buf: &mut [u8], offset: u64) -> io::Result<()>;

    /// Whole-content view for zero-copy reads, if available
    fn mapped(&self) -> Option<&[u8]> {
        None
    }
}

// =============================================================================
// File Source
// =============================================================================

/// A database file, memory-mapped when possible
pub struct FileSource {
    file: File,
    mmap: Option<Mmap>,
    len: u64,
}

impl FileSource {
    /// Open a file; with `use_mmap`, try to map it
    pub fn open(path: &Path, use_mmap: bool) -> Result<Self> {
        let file = File::open(path)?;
        debug!("Opening database: {:?}", path);
        Self::from_file(file, use_mmap)
    }

    /// Wrap an already-open file
    pub fn from_file(file: File, use_mmap: bool) -> Result<Self> {
        let len = file.metadata()?.len();

        // Positions are u32, so larger files are never mapped (or valid)
        let mmap = if use_mmap && len > 0 && len <= u64::from(u32::MAX) {
            // SAFETY: published databases are immutable; replacement happens
            // by rename, which leaves this mapping's inode untouched.
            match unsafe { MmapOptions::new().map(&file) } {
                Ok(mmap) => {
                    debug!("Memory-mapped database ({} bytes)", len);
                    Some(mmap)
                }
                Err(e) => {
                    debug!("Failed to memory-map database, using positioned reads: {}", e);
                    None
                }
            }
        } else {
            None
        };

        Ok(Self { file, mmap, len })
    }

    /// Whether reads go through a memory map
    pub fn is_mapped(&self) -> bool {
        self.mmap.is_some()
    }
}

impl ByteSource for FileSource {
    fn len(&self) -> u64 {
        self.len
    }

    fn read_exact_at(&self, buf: &mut [u8], offset: u64) -> io::Result<()> {
        if let Some(ref mmap) = self.mmap {
            return copy_from(mmap, buf, offset);
        }
        read_file_at(&self.file, buf, offset)
    }

    fn mapped(&self) -> Option<&[u8]> {
        self.mmap.as_deref()
    }
}

#[cfg(unix)]
fn read_file_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<()> {
    use std::os::unix::fs::FileExt;
    // read_exact_at already retries on Interrupted
    file.read_exact_at(buf, offset)
}

#[cfg(windows)]
fn read_file_at(file: &File, mut buf: &mut [u8], mut offset: u64) -> io::Result<()> {
    use std::os::windows::fs::FileExt;
    while !buf.is_empty() {
        match file.seek_read(buf, offset) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "database ended before requested range",
                ));
            }
            Ok(n) => {
                buf = &mut std::mem::take(&mut buf)[n..];
                offset += n as u64;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

// =============================================================================
// In-Memory Source
// =============================================================================

impl ByteSource for Vec<u8> {
    fn len(&self) -> u64 {
        self.as_slice().len() as u64
    }

    fn read_exact_at(&self, buf: &mut [u8], offset: u64) -> io::Result<()> {
        copy_from(self, buf, offset)
    }

    fn mapped(&self) -> Option<&[u8]> {
        Some(self.as_slice())
    }
}

fn copy_from(data: &[u8], buf: &mut [u8], offset: u64) -> io::Result<()> {
    let start = usize::try_from(offset).ok();
    let range = start.and_then(|s| s.checked_add(buf.len()).map(|e| s..e));
    match range.and_then(|r| data.get(r)) {
        Some(src) => {
            buf.copy_from_slice(src);
            Ok(())
        }
        None => Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "database ended before requested range",
        )),
    }
}
