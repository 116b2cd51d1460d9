//! Make Module
//!
//! The write path: records in, finished database file out.
//!
//! ## Flow
//! ```text
//!  add(key, data) ──► record area (buffered, sequential)
//!        │
//!        └─► (hash, record_pos) entry list
//!
//!  finish() ──► count + partition entries by bucket
//!           ──► one probed hash table per bucket, appended in order
//!           ──► seek 0, write header
//!
//!  install  ──► fsync temp file, rename over destination
//! ```

mod builder;
mod index;
mod ingest;
mod install;

pub use builder::DatabaseBuilder;
pub use ingest::{ingest_lines, make_from_file};
pub use install::{install, temp_path_for, DatabaseWriter};
