//! Hash Index Construction
//!
//! The index is built in two passes once every record is known:
//!
//! 1. Count entries per bucket and stably partition the entry list into 256
//!    contiguous runs (a counting sort, so each bucket keeps insertion order).
//! 2. For each bucket, lay its run out in a table of `2 × count` slots by
//!    linear probing from `(hash >> 8) % len`.
//!
//! Table sizes depend on final counts, so nothing is sized up front.

use crate::error::Result;
use crate::format::{probe_start, to_u32_len, Slot, BUCKETS};

/// Entry list reordered so that each bucket's entries are contiguous
pub struct Partitioned {
    entries: Vec<Slot>,
    /// `starts[b]..starts[b + 1]` is bucket `b`'s run
    starts: [usize; BUCKETS + 1],
}

impl Partitioned {
    /// Count pass + partition pass over `entries` (in insertion order)
    pub fn new(entries: &[Slot]) -> Result<Self> {
        let mut counts = [0usize; BUCKETS];
        for entry in entries {
            counts[entry.bucket()] += 1;
        }

        let mut starts = [0usize; BUCKETS + 1];
        for b in 0..BUCKETS {
            starts[b + 1] = starts[b] + counts[b];
        }

        let mut sorted = Vec::new();
        sorted.try_reserve_exact(entries.len())?;
        sorted.resize(entries.len(), Slot::default());

        let mut next = starts;
        for entry in entries {
            let b = entry.bucket();
            sorted[next[b]] = *entry;
            next[b] += 1;
        }

        Ok(Self {
            entries: sorted,
            starts,
        })
    }

    /// Entries whose hash falls in `bucket`, in insertion order
    pub fn bucket(&self, bucket: usize) -> &[Slot] {
        &self.entries[self.starts[bucket]..self.starts[bucket + 1]]
    }

    /// Largest table any bucket needs (in slots)
    pub fn max_table_len(&self) -> usize {
        (0..BUCKETS)
            .map(|b| self.bucket(b).len() * 2)
            .max()
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Lay out one bucket's entries into `table`, reusing its allocation.
///
/// The table ends up with `2 × entries.len()` slots; empty ones stay zeroed.
pub fn fill_table(entries: &[Slot], table: &mut Vec<Slot>) -> Result<()> {
    let len = entries.len() * 2;
    let slots = to_u32_len(len, "hash table")?;

    table.clear();
    table.try_reserve_exact(len)?;
    table.resize(len, Slot::default());

    for entry in entries {
        let mut at = probe_start(entry.hash, slots) as usize;
        // Half the slots stay empty, so this always terminates
        while !table[at].is_empty() {
            at += 1;
            if at == len {
                at = 0;
            }
        }
        table[at] = *entry;
    }

    Ok(())
}
