//! # scdb
//!
//! A constant database: key/value files that are built once, read many
//! times, and replaced whole. Suited to configuration snapshots, routing
//! tables and similar data.
//!
//! - Fast lookups: a found key takes two random reads, a miss usually one
//! - Low overhead: 2048 bytes of header plus 24 bytes per record
//! - Files up to 4 GiB, with records streamed to disk as they are added
//! - Crash-safe atomic replacement; readers never pause during rewrites
//!
//! ## Architecture Overview
//!
//! ```text
//!   key/value pairs
//!         │
//! ┌───────▼──────────────┐      ┌───────────────────────┐
//! │   DatabaseBuilder    │      │    DatabaseReader     │
//! │ records → 256 tables │      │  header → table probe │
//! └───────┬──────────────┘      └───────────▲───────────┘
//!         │ <db>.tmp                        │ mmap / pread
//!         ▼                                 │
//!   fsync + rename ───────► published <db> ─┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use scdb::{Config, DatabaseReader, DatabaseWriter};
//!
//! fn main() -> scdb::Result<()> {
//!     let config = Config::default();
//!
//!     let mut writer = DatabaseWriter::create("routes.cdb", &config)?;
//!     writer.add(b"eu", b"10.0.0.1")?;
//!     writer.add(b"us", b"10.0.0.2")?;
//!     writer.finish()?;
//!
//!     let reader = DatabaseReader::open("routes.cdb", &config)?;
//!     assert_eq!(reader.get(b"eu")?, Some(b"10.0.0.1".to_vec()));
//!     Ok(())
//! }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod hash;
pub mod format;
pub mod io;
pub mod make;
pub mod reader;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{ScdbError, Result};
pub use config::Config;
pub use make::{DatabaseBuilder, DatabaseWriter};
pub use reader::{get_from_path, DataRef, DatabaseReader, FindCursor};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of scdb
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
