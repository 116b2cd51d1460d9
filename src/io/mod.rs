//! I/O Module
//!
//! The byte-level collaborators of the builder and reader.
//!
//! ## Responsibilities
//! - Buffered, interrupt-safe sequential output for the builder
//! - Random-access input for the reader, memory-mapped when possible

mod buffer;
mod source;

pub use buffer::BufferedWriter;
pub use source::{ByteSource, FileSource};
