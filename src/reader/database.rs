//! Database Reader
//!
//! Opens a finished database and answers point lookups: one header read,
//! then slot reads within a single bucket's table. A found key costs a
//! record read on top; a miss usually stops at the first empty slot.

use std::io::ErrorKind;
use std::path::Path;

use crate::config::Config;
use crate::error::{Result, ScdbError};
use crate::format::{
    bucket_of, probe_start, unpack_pair, Slot, TableRef, HEADER_SIZE, PAIR_SIZE, RECORD_HEADER_SIZE,
};
use crate::hash::hash;
use crate::io::{ByteSource, FileSource};

use super::cursor::{DataRef, FindCursor, FindIter, Probe, State};
use super::records::Records;

/// Key bytes are compared in chunks of this size when not memory-mapped
const MATCH_CHUNK: usize = 32;

/// Read-only handle on a published database
///
/// Takes `&self` everywhere, so one reader can be shared across threads
/// (when the source is `Sync`) with a separate `FindCursor` per lookup.
pub struct DatabaseReader<S: ByteSource = FileSource> {
    source: S,
}

impl DatabaseReader<FileSource> {
    /// Open the database at `path`, memory-mapped if `config.use_mmap`
    pub fn open(path: impl AsRef<Path>, config: &Config) -> Result<Self> {
        let source = FileSource::open(path.as_ref(), config.use_mmap)?;
        Ok(Self::from_source(source))
    }
}

impl<S: ByteSource> DatabaseReader<S> {
    pub fn from_source(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn into_source(self) -> S {
        self.source
    }

    /// Whether lookups read through a mapped view
    pub fn is_mapped(&self) -> bool {
        self.source.mapped().is_some()
    }

    // =========================================================================
    // Byte Access
    // =========================================================================

    /// Read `len` bytes at `pos`
    pub fn read_at(&self, pos: u32, len: u32) -> Result<Vec<u8>> {
        // A corrupt length must not drive the allocation
        self.check_range(u64::from(pos), u64::from(len))?;

        let mut buf = Vec::new();
        buf.try_reserve_exact(len as usize)?;
        buf.resize(len as usize, 0);
        self.read_into(&mut buf, u64::from(pos))?;
        Ok(buf)
    }

    /// `Truncated` unless `len` bytes at `pos` lie inside the source
    fn check_range(&self, pos: u64, len: u64) -> Result<()> {
        let end = pos.checked_add(len);
        if end.map_or(true, |end| end > self.source.len()) {
            return Err(ScdbError::Truncated(format!(
                "read of {} bytes at {} exceeds database size {}",
                len,
                pos,
                self.source.len()
            )));
        }
        Ok(())
    }

    /// Fill `buf` from `pos`; `Truncated` if the range is outside the source
    pub(super) fn read_into(&self, buf: &mut [u8], pos: u64) -> Result<()> {
        self.check_range(pos, buf.len() as u64)?;

        self.source.read_exact_at(buf, pos).map_err(|e| {
            if e.kind() == ErrorKind::UnexpectedEof {
                ScdbError::Truncated(format!("database ended while reading at {}", pos))
            } else {
                ScdbError::Io(e)
            }
        })
    }

    pub(super) fn read_pair(&self, pos: u64) -> Result<[u8; 8]> {
        let mut buf = [0u8; 8];
        self.read_into(&mut buf, pos)?;
        Ok(buf)
    }

    /// Header entry for `bucket`
    pub fn table(&self, bucket: u8) -> Result<TableRef> {
        let buf = self.read_pair(u64::from(TableRef::position(bucket)))?;
        Ok(TableRef::decode(&buf))
    }

    /// Whether the `key.len()` bytes at `pos` equal `key`
    fn key_matches(&self, key: &[u8], pos: u64) -> Result<bool> {
        if let Some(map) = self.source.mapped() {
            let end = pos + key.len() as u64;
            if end > map.len() as u64 {
                return Err(ScdbError::Truncated(format!(
                    "key at {} runs past end of database",
                    pos
                )));
            }
            return Ok(&map[pos as usize..end as usize] == key);
        }

        let mut buf = [0u8; MATCH_CHUNK];
        let mut pos = pos;
        for chunk in key.chunks(MATCH_CHUNK) {
            let got = &mut buf[..chunk.len()];
            self.read_into(got, pos)?;
            if got != chunk {
                return Ok(false);
            }
            pos += chunk.len() as u64;
        }
        Ok(true)
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Start a fresh lookup of `key` on `cursor`
    pub fn find(&self, cursor: &mut FindCursor, key: &[u8]) -> Result<Option<DataRef>> {
        cursor.reset();
        self.find_next(cursor, key)
    }

    /// Continue a lookup, returning the next record stored under `key`
    ///
    /// Returns `Ok(None)` once the probe reaches an empty slot or has
    /// visited every slot of the bucket's table.
    pub fn find_next(&self, cursor: &mut FindCursor, key: &[u8]) -> Result<Option<DataRef>> {
        cursor.found = None;

        let mut probe = match cursor.state {
            State::Done => return Ok(None),
            State::Probing(probe) => probe,
            State::Fresh => match self.start_probe(key)? {
                Some(probe) => probe,
                None => {
                    cursor.state = State::Done;
                    return Ok(None);
                }
            },
        };

        // Keys longer than any stored length can't match, but the probe still
        // terminates normally
        let key_len = u32::try_from(key.len()).ok();
        let table_end = probe.table_pos + u64::from(probe.slots) * u64::from(PAIR_SIZE);

        while probe.visited < probe.slots {
            let slot = Slot::decode(&self.read_pair(probe.slot_pos)?);
            if slot.is_empty() {
                cursor.state = State::Done;
                return Ok(None);
            }

            probe.visited += 1;
            probe.slot_pos += u64::from(PAIR_SIZE);
            if probe.slot_pos == table_end {
                probe.slot_pos = probe.table_pos;
            }

            if slot.hash != probe.hash {
                continue;
            }

            let record_pos = u64::from(slot.pos);
            let (stored_key_len, data_len) = unpack_pair(&self.read_pair(record_pos)?);
            if Some(stored_key_len) != key_len {
                continue;
            }

            let key_pos = record_pos + u64::from(RECORD_HEADER_SIZE);
            if self.key_matches(key, key_pos)? {
                let data_pos = key_pos + u64::from(stored_key_len);
                let pos = u32::try_from(data_pos).map_err(|_| {
                    ScdbError::Truncated(format!("record at {} points past 4 GiB", record_pos))
                })?;
                let data = DataRef { pos, len: data_len };

                cursor.state = State::Probing(probe);
                cursor.found = Some(data);
                return Ok(Some(data));
            }
        }

        cursor.state = State::Done;
        Ok(None)
    }

    /// Hash the key and locate its starting slot; `None` for an empty bucket
    fn start_probe(&self, key: &[u8]) -> Result<Option<Probe>> {
        let h = hash(key);
        let table = self.table(bucket_of(h) as u8)?;
        if table.slots == 0 {
            return Ok(None);
        }

        let table_pos = u64::from(table.offset);
        let start = u64::from(probe_start(h, table.slots));
        Ok(Some(Probe {
            hash: h,
            table_pos,
            slots: table.slots,
            slot_pos: table_pos + start * u64::from(PAIR_SIZE),
            visited: 0,
        }))
    }

    /// Iterate over every value stored under `key`
    pub fn find_all<'a>(&'a self, key: &'a [u8]) -> FindIter<'a, S> {
        FindIter::new(self, key)
    }

    /// First value stored under `key`
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let mut cursor = FindCursor::new();
        match self.find(&mut cursor, key)? {
            Some(data) => self.read_at(data.pos, data.len).map(Some),
            None => Ok(None),
        }
    }

    /// Whether any record is stored under `key`
    pub fn contains(&self, key: &[u8]) -> Result<bool> {
        let mut cursor = FindCursor::new();
        Ok(self.find(&mut cursor, key)?.is_some())
    }

    // =========================================================================
    // Dump
    // =========================================================================

    /// Iterate over all records in file (insertion) order
    pub fn records(&self) -> Result<Records<'_, S>> {
        // Tables are written straight after the last record, bucket 0 first
        let end = self.table(0)?.offset;
        if end < HEADER_SIZE || u64::from(end) > self.source.len() {
            return Err(ScdbError::Truncated(format!(
                "record area end {} outside database of {} bytes",
                end,
                self.source.len()
            )));
        }
        Ok(Records::new(self, HEADER_SIZE, end))
    }
}

/// Open `path`, look `key` up once, and close it again
pub fn get_from_path(path: impl AsRef<Path>, key: &[u8]) -> Result<Option<Vec<u8>>> {
    DatabaseReader::open(path, &Config::default())?.get(key)
}
