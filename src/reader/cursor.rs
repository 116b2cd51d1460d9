//! Lookup Cursor
//!
//! Per-lookup probe state. A reader can serve any number of cursors at once;
//! cursors share nothing with each other.

use crate::error::Result;
use crate::io::ByteSource;

use super::database::DatabaseReader;

/// Location of a matched record's data within the database
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataRef {
    /// File offset of the first data byte
    pub pos: u32,
    /// Data length in bytes
    pub len: u32,
}

/// Where a probe currently stands within one bucket's table
#[derive(Debug, Clone, Copy)]
pub(super) struct Probe {
    /// Hash of the key being looked up
    pub hash: u32,
    /// File offset of the bucket's table
    pub table_pos: u64,
    /// Number of slots in the table
    pub slots: u32,
    /// File offset of the next slot to read
    pub slot_pos: u64,
    /// Slots read so far; bounds the probe on corrupt files
    pub visited: u32,
}

#[derive(Debug, Clone, Copy, Default)]
pub(super) enum State {
    /// No slot read yet; the next call hashes the key
    #[default]
    Fresh,
    Probing(Probe),
    /// Probe sequence exhausted
    Done,
}

/// Progress of a key lookup across repeated `find_next` calls
///
/// A cursor is bound to one key for its lifetime (until `reset`); passing a
/// different key to `find_next` mid-probe gives meaningless results.
#[derive(Debug, Clone, Default)]
pub struct FindCursor {
    pub(super) state: State,
    pub(super) found: Option<DataRef>,
}

impl FindCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget all progress so the next `find_next` starts over
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// The most recent match, if the last call found one
    pub fn data(&self) -> Option<DataRef> {
        self.found
    }

    /// Number of slots examined so far
    pub fn slots_visited(&self) -> u32 {
        match self.state {
            State::Probing(ref p) => p.visited,
            State::Fresh | State::Done => 0,
        }
    }
}

/// Iterator over every value stored under one key
///
/// Yields values in table probe order, which for a given file is fixed.
/// Stops after the first error.
pub struct FindIter<'a, S: ByteSource> {
    reader: &'a DatabaseReader<S>,
    key: &'a [u8],
    cursor: FindCursor,
    failed: bool,
}

impl<'a, S: ByteSource> FindIter<'a, S> {
    pub(super) fn new(reader: &'a DatabaseReader<S>, key: &'a [u8]) -> Self {
        Self {
            reader,
            key,
            cursor: FindCursor::new(),
            failed: false,
        }
    }
}

impl<'a, S: ByteSource> Iterator for FindIter<'a, S> {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        let found = self
            .reader
            .find_next(&mut self.cursor, self.key)
            .and_then(|found| match found {
                Some(data) => self.reader.read_at(data.pos, data.len).map(Some),
                None => Ok(None),
            });

        match found {
            Ok(value) => value.map(Ok),
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
