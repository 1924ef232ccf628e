use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use log::{debug, error, info};
use tempfile::NamedTempFile;

use crate::error_handling::types::StorageError;
use crate::storage::storage_trait::Slot;

/// Name of the durable history slot.
pub const HISTORY_SLOT_NAME: &str = "file-analysis-history";

/// Environment variable naming the directory that holds the history slot.
pub const HISTORY_DIR_ENV: &str = "CYBERVELI_HISTORY_DIR";

/// Slot persisted as one JSON file inside a storage directory.
///
/// Writes go to a temporary file in the same directory which is then renamed
/// over the slot, so readers in other processes see either the old or the new
/// collection, never a partial one.
#[derive(Debug, Clone)]
pub struct FileSlot {
    path: PathBuf,
}

impl FileSlot {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Result<Self, StorageError> {
        let base_path = base_path.as_ref();
        fs::create_dir_all(base_path).map_err(|e| {
            error!("Failed to create storage dir {}: {}", base_path.display(), e);
            StorageError::WriteFailed(e.to_string())
        })?;
        let path = base_path.join(format!("{}.json", HISTORY_SLOT_NAME));
        info!("FileSlot initialized at {}", path.display());
        Ok(Self { path })
    }

    /// Uses `CYBERVELI_HISTORY_DIR` if set, otherwise the current directory.
    pub fn new_default() -> Result<Self, StorageError> {
        if let Ok(dir) = std::env::var(HISTORY_DIR_ENV) {
            info!("Using history directory from {}: {}", HISTORY_DIR_ENV, dir);
            return Self::new(PathBuf::from(dir));
        }
        let cwd = std::env::current_dir().map_err(|e| {
            error!("Failed to get current dir: {}", e);
            StorageError::ReadFailed(e.to_string())
        })?;
        info!("Using history directory at current directory: {}", cwd.display());
        Self::new(cwd)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Slot for FileSlot {
    fn read(&self) -> Result<Option<String>, StorageError> {
        match fs::read(&self.path) {
            Ok(bytes) => {
                debug!("Read {} byte(s) from {}", bytes.len(), self.path.display());
                // Invalid UTF-8 is left for the JSON parser to reject.
                Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => {
                error!("Read failed {}: {}", self.path.display(), e);
                Err(StorageError::ReadFailed(e.to_string()))
            }
        }
    }

    fn write(&self, contents: &str) -> Result<(), StorageError> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let write_failed = |e: std::io::Error| {
            error!("Write failed {}: {}", self.path.display(), e);
            StorageError::WriteFailed(e.to_string())
        };

        let mut tmp = NamedTempFile::new_in(dir).map_err(write_failed)?;
        tmp.write_all(contents.as_bytes()).map_err(write_failed)?;
        tmp.as_file().sync_all().map_err(write_failed)?;
        tmp.persist(&self.path).map_err(|e| write_failed(e.error))?;
        debug!("Wrote {} byte(s) to {}", contents.len(), self.path.display());
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
