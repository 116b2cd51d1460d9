//! Reader Module
//!
//! The read path: lookups against a published database.
//!
//! ## Lookup
//! ```text
//!  hash(key) ──► header[hash & 0xff] = (table_pos, slots)
//!            ──► probe slots from (hash >> 8) % slots, wrapping
//!                  empty slot        → miss
//!                  hash + key match  → (data_pos, data_len)
//! ```

mod cursor;
mod database;
mod records;

pub use cursor::{DataRef, FindCursor, FindIter};
pub use database::{get_from_path, DatabaseReader};
pub use records::Records;
