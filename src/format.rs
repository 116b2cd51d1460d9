//! On-disk format constants and helpers.
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ Header (2048 bytes)                                     │
//! │   256 × [TableOffset: u32][TableSlots: u32]             │
//! ├─────────────────────────────────────────────────────────┤
//! │ Record Area (variable, starts at 2048)                  │
//! │   [KeyLen: u32][DataLen: u32][Key][Data]                │
//! │   ... repeated for each record, no padding ...          │
//! ├─────────────────────────────────────────────────────────┤
//! │ Hash Table Area (variable)                              │
//! │   256 tables in bucket order,                           │
//! │   each TableSlots × [Hash: u32][RecordPos: u32]         │
//! │   (RecordPos = 0 marks an empty slot)                   │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! All integers are little-endian. Every position fits in a `u32`.

use crate::error::{Result, ScdbError};

/// Number of buckets (one per low hash byte)
pub const BUCKETS: usize = 256;

/// Size of one header entry or hash slot: two u32 fields
pub const PAIR_SIZE: u32 = 8;

/// Header size: 256 × 8 = 2048 bytes; the record area starts here
pub const HEADER_SIZE: u32 = BUCKETS as u32 * PAIR_SIZE;

/// Size of a record's length prefix: KeyLen (4) + DataLen (4)
pub const RECORD_HEADER_SIZE: u32 = 8;

// =============================================================================
// Pair Encoding
// =============================================================================

/// Encode two u32 values as 8 little-endian bytes
#[inline]
pub fn pack_pair(first: u32, second: u32) -> [u8; 8] {
    let mut buf = [0u8; 8];
    buf[..4].copy_from_slice(&first.to_le_bytes());
    buf[4..].copy_from_slice(&second.to_le_bytes());
    buf
}

/// Decode 8 little-endian bytes into two u32 values
#[inline]
pub fn unpack_pair(buf: &[u8; 8]) -> (u32, u32) {
    let first = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
    let second = u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]);
    (first, second)
}

// =============================================================================
// Header Entry / Slot
// =============================================================================

/// One header entry: where a bucket's hash table lives and how many slots it has
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TableRef {
    pub offset: u32,
    pub slots: u32,
}

impl TableRef {
    pub fn encode(&self) -> [u8; 8] {
        pack_pair(self.offset, self.slots)
    }

    pub fn decode(buf: &[u8; 8]) -> Self {
        let (offset, slots) = unpack_pair(buf);
        Self { offset, slots }
    }

    /// File offset of the header entry for `bucket`
    pub fn position(bucket: u8) -> u32 {
        u32::from(bucket) * PAIR_SIZE
    }
}

/// One hash-table cell; also the builder's `(hash, record_pos)` entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Slot {
    pub hash: u32,
    pub pos: u32,
}

impl Slot {
    pub fn new(hash: u32, pos: u32) -> Self {
        Self { hash, pos }
    }

    /// Empty slots have position 0, which no record can occupy
    pub fn is_empty(&self) -> bool {
        self.pos == 0
    }

    pub fn encode(&self) -> [u8; 8] {
        pack_pair(self.hash, self.pos)
    }

    pub fn decode(buf: &[u8; 8]) -> Self {
        let (hash, pos) = unpack_pair(buf);
        Self { hash, pos }
    }

    /// Bucket index: low 8 bits of the hash
    #[inline]
    pub fn bucket(&self) -> usize {
        bucket_of(self.hash)
    }
}

/// Bucket index for a hash
#[inline]
pub fn bucket_of(hash: u32) -> usize {
    (hash & 0xff) as usize
}

/// Starting slot of a probe within a table of `slots` cells
#[inline]
pub fn probe_start(hash: u32, slots: u32) -> u32 {
    (hash >> 8) % slots
}

// =============================================================================
// Checked Arithmetic
// =============================================================================

/// Add to a file position, failing with `Overflow` past `u32::MAX`
#[inline]
pub fn checked_pos(pos: u32, len: u32) -> Result<u32> {
    pos.checked_add(len)
        .ok_or_else(|| ScdbError::Overflow(format!("position {} + {} exceeds u32", pos, len)))
}

/// Convert an in-memory length to an on-disk u32 length
#[inline]
pub fn to_u32_len(len: usize, what: &str) -> Result<u32> {
    u32::try_from(len)
        .map_err(|_| ScdbError::Overflow(format!("{} length {} exceeds u32", what, len)))
}
