//! Database Builder
//!
//! Streams records into a sink and appends the hash index on `finish`.
//! The sink must be seekable: the header is written last, at offset 0.

use std::io::{Seek, SeekFrom, Write};

use tracing::debug;

use crate::config::Config;
use crate::error::{Result, ScdbError};
use crate::format::{checked_pos, to_u32_len, Slot, TableRef, BUCKETS, HEADER_SIZE, PAIR_SIZE, RECORD_HEADER_SIZE};
use crate::hash::hash;
use crate::io::BufferedWriter;

use super::index::{fill_table, Partitioned};

/// Writes a new database into a seekable sink
///
/// Single-writer: one builder owns its sink from `start` to `finish`.
pub struct DatabaseBuilder<W: Write + Seek> {
    /// Buffered output; records and tables are written sequentially
    writer: BufferedWriter<W>,
    /// One `(hash, record_pos)` per added record, in insertion order
    entries: Vec<Slot>,
    /// Position the next byte will be written at
    pos: u32,
    /// Set by the first failed `add`; the output can no longer be trusted
    failed: bool,
}

impl<W: Write + Seek> DatabaseBuilder<W> {
    /// Reserve the header and prepare to accept records
    pub fn start(mut sink: W, config: &Config) -> Result<Self> {
        sink.seek(SeekFrom::Start(u64::from(HEADER_SIZE)))
            .map_err(ScdbError::Seek)?;

        Ok(Self {
            writer: BufferedWriter::with_capacity(config.write_buffer_size, sink),
            entries: Vec::new(),
            pos: HEADER_SIZE,
            failed: false,
        })
    }

    /// Append one record
    ///
    /// Keys need not be unique; every record for a key stays retrievable.
    /// Any error aborts the build: later calls fail with `Aborted`.
    pub fn add(&mut self, key: &[u8], data: &[u8]) -> Result<()> {
        if self.failed {
            return Err(ScdbError::Aborted);
        }
        let result = self.append(key, data);
        if result.is_err() {
            self.failed = true;
        }
        result
    }

    fn append(&mut self, key: &[u8], data: &[u8]) -> Result<()> {
        let key_len = to_u32_len(key.len(), "key")?;
        let data_len = to_u32_len(data.len(), "data")?;

        // Validate the whole record fits before writing any of it
        let new_pos = checked_pos(self.pos, RECORD_HEADER_SIZE)
            .and_then(|p| checked_pos(p, key_len))
            .and_then(|p| checked_pos(p, data_len))?;
        self.entries.try_reserve(1)?;

        self.writer.put(&Slot::new(key_len, data_len).encode())?;
        self.writer.put(key)?;
        self.writer.put(data)?;

        self.entries.push(Slot::new(hash(key), self.pos));
        self.pos = new_pos;
        Ok(())
    }

    /// Number of records added so far
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether an earlier `add` failed
    pub fn is_aborted(&self) -> bool {
        self.failed
    }

    /// Current write position (end of the record area until `finish`)
    pub fn position(&self) -> u32 {
        self.pos
    }

    /// Write the hash tables and header, returning the sink.
    ///
    /// The sink is flushed but not synced; installing it is up to the caller.
    pub fn finish(mut self) -> Result<W> {
        if self.failed {
            return Err(ScdbError::Aborted);
        }
        let parts = Partitioned::new(&self.entries)?;
        // Entry list is no longer needed once partitioned
        self.entries = Vec::new();

        let mut header = Vec::new();
        header.try_reserve_exact(HEADER_SIZE as usize)?;

        let mut table = Vec::new();
        table.try_reserve_exact(parts.max_table_len())?;

        let records_end = self.pos;
        for bucket in 0..BUCKETS {
            fill_table(parts.bucket(bucket), &mut table)?;
            let slots = to_u32_len(table.len(), "hash table")?;

            header.extend_from_slice(&TableRef { offset: self.pos, slots }.encode());

            for slot in &table {
                self.writer.put(&slot.encode())?;
                self.pos = checked_pos(self.pos, PAIR_SIZE)?;
            }
        }

        self.writer.flush()?;
        self.writer
            .get_mut()
            .seek(SeekFrom::Start(0))
            .map_err(ScdbError::Seek)?;
        self.writer.put_flush(&header)?;

        let mut sink = self.writer.into_inner();
        sink.flush()?;

        debug!(
            "Built database: {} records, {} record bytes, {} total bytes",
            parts.len(),
            records_end - HEADER_SIZE,
            self.pos
        );

        Ok(sink)
    }
}
