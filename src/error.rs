//! Error types for scdb
//!
//! Provides a unified error type for building and reading databases.
//! A lookup miss is not an error; it is reported as `Ok(None)`.

use std::collections::TryReserveError;

use thiserror::Error;

/// Result type alias using ScdbError
pub type Result<T> = std::result::Result<T, ScdbError>;

/// Unified error type for scdb operations
#[derive(Debug, Error)]
pub enum ScdbError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Seek failed: {0}")]
    Seek(#[source] std::io::Error),

    // -------------------------------------------------------------------------
    // Format Errors
    // -------------------------------------------------------------------------
    #[error("Truncated database: {0}")]
    Truncated(String),

    #[error("32-bit limit exceeded: {0}")]
    Overflow(String),

    // -------------------------------------------------------------------------
    // Resource Errors
    // -------------------------------------------------------------------------
    #[error("Allocation failed: {0}")]
    Alloc(#[from] TryReserveError),

    // -------------------------------------------------------------------------
    // Builder State Errors
    // -------------------------------------------------------------------------
    #[error("Build aborted: an earlier add or finish failed")]
    Aborted,

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}
