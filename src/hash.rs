//! Key hash used for bucketing at build time and probing at lookup time.
//!
//! `h = 5381; for each byte c: h = (h + (h << 5)) ^ c`, wrapping at 32 bits.

/// Initial hash value (also the hash of the empty key)
pub const HASH_START: u32 = 5381;

/// Fold one byte into a running hash
#[inline]
pub fn hash_add(h: u32, c: u8) -> u32 {
    h.wrapping_add(h << 5) ^ u32::from(c)
}

/// Hash a whole key
#[inline]
pub fn hash(key: &[u8]) -> u32 {
    key.iter().fold(HASH_START, |h, &c| hash_add(h, c))
}
