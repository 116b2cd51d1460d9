//! Configuration for scdb
//!
//! Settings shared by the builder and the reader, passed explicitly into
//! their constructors.

use crate::error::{Result, ScdbError};

/// Main configuration for building and opening databases
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Write Path
    // -------------------------------------------------------------------------
    /// Capacity of the builder's output buffer (in bytes)
    pub write_buffer_size: usize,

    /// fsync the temp file and its directory around the install rename
    pub sync_on_install: bool,

    /// Appended to the destination file name to form the private temp path
    pub temp_suffix: String,

    // -------------------------------------------------------------------------
    // Read Path
    // -------------------------------------------------------------------------
    /// Try to memory-map databases on open (falls back to positioned reads)
    pub use_mmap: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            write_buffer_size: 8192,
            sync_on_install: true,
            temp_suffix: ".tmp".to_string(),
            use_mmap: true,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the builder's output buffer capacity (in bytes)
    pub fn write_buffer_size(mut self, size: usize) -> Self {
        self.config.write_buffer_size = size;
        self
    }

    /// Enable or disable fsync around installs
    pub fn sync_on_install(mut self, sync: bool) -> Self {
        self.config.sync_on_install = sync;
        self
    }

    /// Set the temp file suffix
    pub fn temp_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.config.temp_suffix = suffix.into();
        self
    }

    /// Enable or disable memory-mapped reads
    pub fn use_mmap(mut self, enabled: bool) -> Self {
        self.config.use_mmap = enabled;
        self
    }

    pub fn build(self) -> Result<Config> {
        if self.config.write_buffer_size == 0 {
            return Err(ScdbError::Config(
                "write_buffer_size must be greater than zero".to_string(),
            ));
        }
        if self.config.temp_suffix.is_empty() {
            return Err(ScdbError::Config(
                "temp_suffix must not be empty".to_string(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::builder().build().unwrap();
        assert_eq!(config.write_buffer_size, 8192);
        assert!(config.use_mmap);
        assert!(config.sync_on_install);
        assert_eq!(config.temp_suffix, ".tmp");
    }

    #[test]
    fn test_rejects_zero_buffer() {
        let err = Config::builder().write_buffer_size(0).build().unwrap_err();
        assert!(matches!(err, ScdbError::Config(_)));
    }

    #[test]
    fn test_rejects_empty_suffix() {
        let err = Config::builder().temp_suffix("").build().unwrap_err();
        assert!(matches!(err, ScdbError::Config(_)));
    }
}
