//! Atomic Install
//!
//! Databases are built into a private temp file next to the destination,
//! synced, and renamed over it. Readers holding the old file keep their
//! snapshot; a crash or error before the rename leaves the destination
//! untouched.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::Config;
use crate::error::Result;

use super::builder::DatabaseBuilder;

/// Temp path for `path`: the same name with `suffix` appended
pub fn temp_path_for(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Sync `file` (when `sync`), then rename `temp_path` over `final_path`
pub fn install(file: File, temp_path: &Path, final_path: &Path, sync: bool) -> Result<()> {
    if sync {
        file.sync_all()?;
    }
    drop(file);

    fs::rename(temp_path, final_path)?;

    // A crash after rename but before the directory entry is durable can
    // lose the rename on ext4/XFS
    if sync {
        if let Some(parent) = final_path.parent() {
            let dir = if parent.as_os_str().is_empty() {
                Path::new(".")
            } else {
                parent
            };
            if let Ok(dir) = File::open(dir) {
                let _ = dir.sync_all();
            }
        }
    }

    info!("Installed database {:?}", final_path);
    Ok(())
}

/// Removes a temp file on drop unless disarmed
struct TempGuard {
    path: PathBuf,
    armed: bool,
}

impl TempGuard {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for TempGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Err(e) = fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove temp file {:?}: {}", self.path, e);
            }
        }
    }
}

/// Builds a database at a path, publishing it only on a successful `finish`
///
/// Dropping the writer without finishing (or any failure along the way)
/// removes the temp file and leaves the destination as it was.
pub struct DatabaseWriter {
    // Field order matters: the file closes before the guard removes it
    builder: DatabaseBuilder<File>,
    temp: TempGuard,
    final_path: PathBuf,
    sync: bool,
}

impl DatabaseWriter {
    /// Create the temp file and start a builder over it
    pub fn create(path: impl AsRef<Path>, config: &Config) -> Result<Self> {
        let final_path = path.as_ref().to_path_buf();
        let temp_path = temp_path_for(&final_path, &config.temp_suffix);

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&temp_path)?;
        let temp = TempGuard {
            path: temp_path,
            armed: true,
        };

        Ok(Self {
            builder: DatabaseBuilder::start(file, config)?,
            temp,
            final_path,
            sync: config.sync_on_install,
        })
    }

    /// Append one record
    pub fn add(&mut self, key: &[u8], data: &[u8]) -> Result<()> {
        self.builder.add(key, data)
    }

    /// Number of records added so far
    pub fn len(&self) -> usize {
        self.builder.len()
    }

    pub fn is_empty(&self) -> bool {
        self.builder.is_empty()
    }

    pub fn temp_path(&self) -> &Path {
        &self.temp.path
    }

    pub fn final_path(&self) -> &Path {
        &self.final_path
    }

    /// Write the index, then atomically install over the destination
    pub fn finish(self) -> Result<()> {
        let Self {
            builder,
            mut temp,
            final_path,
            sync,
        } = self;

        let file = builder.finish()?;
        install(file, &temp.path, &final_path, sync)?;
        temp.disarm();
        Ok(())
    }
}
