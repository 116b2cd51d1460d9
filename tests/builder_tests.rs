//! Tests for DatabaseBuilder
//!
//! These tests verify:
//! - Bit-exact on-disk layout (header, records, tables)
//! - Header invariants (even table sizes, 2 × entries in total)
//! - Seek and write failures surface as errors
//! - Any failed add aborts the build; the 32-bit limit is enforced
//! - Small write buffers produce identical files

use std::cell::Cell;
use std::io::{self, Cursor, Seek, SeekFrom, Write};
use std::rc::Rc;

use scdb::format::{probe_start, TableRef, HEADER_SIZE};
use scdb::hash::hash;
use scdb::io::ByteSource;
use scdb::{Config, DatabaseBuilder, DatabaseReader, ScdbError};

// =============================================================================
// Helper Functions
// =============================================================================

fn build_in_memory(config: &Config, entries: &[(&[u8], &[u8])]) -> Vec<u8> {
    let mut builder = DatabaseBuilder::start(Cursor::new(Vec::new()), config).unwrap();
    for (key, data) in entries {
        builder.add(key, data).unwrap();
    }
    builder.finish().unwrap().into_inner()
}

fn u32_at(bytes: &[u8], pos: usize) -> u32 {
    u32::from_le_bytes(bytes[pos..pos + 4].try_into().unwrap())
}

/// Sink whose every seek fails
struct Unseekable(Vec<u8>);

impl Write for Unseekable {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for Unseekable {
    fn seek(&mut self, _pos: SeekFrom) -> io::Result<u64> {
        Err(io::Error::new(io::ErrorKind::Unsupported, "pipe"))
    }
}

/// Sink that accepts seeks but fails every write
struct Full;

impl Write for Full {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::Other, "no space left on device"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for Full {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match pos {
            SeekFrom::Start(p) => Ok(p),
            _ => Ok(0),
        }
    }
}

/// In-memory sink whose first write fails, then recovers
struct FailsOnce {
    inner: Cursor<Vec<u8>>,
    tripped: bool,
}

impl Write for FailsOnce {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.tripped {
            self.tripped = true;
            return Err(io::Error::new(io::ErrorKind::Other, "no space left on device"));
        }
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for FailsOnce {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}

/// Sink that drops everything, counting the bytes it was handed
struct Discard(Rc<Cell<u64>>);

impl Write for Discard {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.set(self.0.get() + buf.len() as u64);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for Discard {
    fn seek(&mut self, _pos: SeekFrom) -> io::Result<u64> {
        Ok(0)
    }
}

// =============================================================================
// Layout Tests
// =============================================================================

#[test]
fn test_empty_database_layout() {
    let bytes = build_in_memory(&Config::default(), &[]);

    // Header only: every bucket points at the (empty) table area at 2048
    assert_eq!(bytes.len(), HEADER_SIZE as usize);
    for bucket in 0..256 {
        assert_eq!(u32_at(&bytes, bucket * 8), HEADER_SIZE);
        assert_eq!(u32_at(&bytes, bucket * 8 + 4), 0);
    }
}

#[test]
fn test_single_record_layout() {
    let bytes = build_in_memory(&Config::default(), &[(&b"a"[..], &b"1"[..])]);

    // header + record (8 + 1 + 1) + one table of 2 slots
    assert_eq!(bytes.len(), 2048 + 10 + 16);

    // Record area
    assert_eq!(&bytes[2048..2058], &[1, 0, 0, 0, 1, 0, 0, 0, b'a', b'1']);

    let h = hash(b"a");
    let bucket = (h & 0xff) as usize;
    let table_pos = 2058usize;

    for b in 0..256 {
        let offset = u32_at(&bytes, b * 8);
        let slots = u32_at(&bytes, b * 8 + 4);
        if b < bucket {
            assert_eq!((offset, slots), (2058, 0));
        } else if b == bucket {
            assert_eq!((offset, slots), (2058, 2));
        } else {
            assert_eq!((offset, slots), (2074, 0));
        }
    }

    let slot = probe_start(h, 2) as usize;
    let filled = table_pos + slot * 8;
    let empty = table_pos + (1 - slot) * 8;
    assert_eq!(u32_at(&bytes, filled), h);
    assert_eq!(u32_at(&bytes, filled + 4), 2048);
    assert_eq!(u32_at(&bytes, empty), 0);
    assert_eq!(u32_at(&bytes, empty + 4), 0);
}

#[test]
fn test_header_invariants() {
    let keys: Vec<String> = (0..3000).map(|i| format!("key-{}", i)).collect();
    let entries: Vec<(&[u8], &[u8])> = keys
        .iter()
        .map(|k| (k.as_bytes(), b"v".as_slice()))
        .collect();
    let bytes = build_in_memory(&Config::default(), &entries);
    let reader = DatabaseReader::from_source(bytes);

    let mut total_slots = 0u64;
    let mut expected_offset = reader.table(0).unwrap().offset;
    for bucket in 0..=255u8 {
        let table = reader.table(bucket).unwrap();
        assert_eq!(table.slots % 2, 0, "bucket {} has odd table size", bucket);
        // Tables are contiguous, in bucket order
        assert_eq!(table.offset, expected_offset);
        expected_offset += table.slots * 8;
        total_slots += u64::from(table.slots);
    }

    assert_eq!(total_slots, 2 * keys.len() as u64);
    assert_eq!(u64::from(expected_offset), ByteSource::len(reader.source()));
}

#[test]
fn test_table_counts_match_bucket_populations() {
    let keys: Vec<String> = (0..500).map(|i| format!("{:x}", i * 7919)).collect();
    let entries: Vec<(&[u8], &[u8])> = keys
        .iter()
        .map(|k| (k.as_bytes(), b"".as_slice()))
        .collect();
    let reader = DatabaseReader::from_source(build_in_memory(&Config::default(), &entries));

    let mut counts = [0u32; 256];
    for key in &keys {
        counts[(hash(key.as_bytes()) & 0xff) as usize] += 1;
    }
    for bucket in 0..=255u8 {
        let TableRef { slots, .. } = reader.table(bucket).unwrap();
        assert_eq!(slots, 2 * counts[bucket as usize]);
    }
}

#[test]
fn test_buffer_size_does_not_change_output() {
    let entries: Vec<(&[u8], &[u8])> = vec![
        (&b"alpha"[..], &b"first value"[..]),
        (&b"beta"[..], &[0u8; 300][..]),
        (&b""[..], &b"empty key"[..]),
        (&b"gamma"[..], &b""[..]),
    ];
    let tiny = Config::builder().write_buffer_size(3).build().unwrap();
    assert_eq!(
        build_in_memory(&tiny, &entries),
        build_in_memory(&Config::default(), &entries)
    );
}

#[test]
fn test_len_and_position_track_records() {
    let mut builder = DatabaseBuilder::start(Cursor::new(Vec::new()), &Config::default()).unwrap();
    assert!(builder.is_empty());
    assert_eq!(builder.position(), 2048);

    builder.add(b"abc", b"defgh").unwrap();
    builder.add(b"abc", b"").unwrap();
    assert_eq!(builder.len(), 2);
    assert_eq!(builder.position(), 2048 + 16 + 11);
}

// =============================================================================
// Failure Tests
// =============================================================================

#[test]
fn test_start_fails_on_unseekable_sink() {
    let result = DatabaseBuilder::start(Unseekable(Vec::new()), &Config::default());
    assert!(matches!(result, Err(ScdbError::Seek(_))));
}

#[test]
fn test_write_failure_surfaces_as_io_error() {
    let config = Config::builder().write_buffer_size(16).build().unwrap();
    let mut builder = DatabaseBuilder::start(Full, &config).unwrap();

    // Fits in the buffer: nothing reaches the sink yet
    builder.add(b"k", b"v").unwrap();

    let err = builder.add(b"a longer key", b"and a longer value").unwrap_err();
    assert!(matches!(err, ScdbError::Io(_)));
}

#[test]
fn test_finish_failure_surfaces_as_io_error() {
    let mut builder = DatabaseBuilder::start(Full, &Config::default()).unwrap();
    builder.add(b"k", b"v").unwrap();
    assert!(matches!(builder.finish(), Err(ScdbError::Io(_))));
}

#[test]
fn test_failed_add_aborts_build() {
    let config = Config::builder().write_buffer_size(16).build().unwrap();
    let sink = FailsOnce {
        inner: Cursor::new(Vec::new()),
        tripped: false,
    };
    let mut builder = DatabaseBuilder::start(sink, &config).unwrap();

    // Buffered; lost when the flush below fails
    builder.add(b"a", b"1").unwrap();
    assert!(matches!(builder.add(b"bbbb", b"2222"), Err(ScdbError::Io(_))));
    assert!(builder.is_aborted());

    // The sink works again, but the build must not continue
    assert!(matches!(builder.add(b"c", b"3"), Err(ScdbError::Aborted)));
    assert_eq!(builder.len(), 1);
    assert!(matches!(builder.finish(), Err(ScdbError::Aborted)));
}

#[test]
fn test_add_past_32_bit_limit_is_overflow() {
    let written = Rc::new(Cell::new(0u64));
    let mut builder =
        DatabaseBuilder::start(Discard(Rc::clone(&written)), &Config::default()).unwrap();
    let data = vec![0u8; 1 << 24];

    let err = loop {
        let before = builder.position();
        match builder.add(b"k", &data) {
            Ok(()) => assert!(builder.position() > before),
            Err(e) => break e,
        }
    };
    assert!(matches!(err, ScdbError::Overflow(_)));

    // 255 records of 8 + 1 + 2^24 bytes fit below 4 GiB, the 256th does not
    let records = builder.len() as u64;
    assert_eq!(records, 255);
    assert_eq!(u64::from(builder.position()), 2048 + records * (9 + (1 << 24)));

    // Large data bypasses the buffer, so every accepted byte reached the
    // sink and nothing of the rejected record did
    assert_eq!(written.get(), u64::from(builder.position()) - 2048);

    assert!(matches!(builder.add(b"k", b"small"), Err(ScdbError::Aborted)));
    assert_eq!(written.get(), u64::from(builder.position()) - 2048);
}
