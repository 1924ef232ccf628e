use std::sync::{Mutex, PoisonError};

use crate::error_handling::types::StorageError;
use crate::storage::storage_trait::Slot;

/// Slot kept in process memory; nothing survives the process.
#[derive(Debug, Default)]
pub struct MemorySlot {
    contents: Mutex<Option<String>>,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            contents: Mutex::new(Some(contents.into())),
        }
    }

    pub fn contents(&self) -> Option<String> {
        self.contents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Slot for MemorySlot {
    fn read(&self) -> Result<Option<String>, StorageError> {
        Ok(self.contents())
    }

    fn write(&self, contents: &str) -> Result<(), StorageError> {
        *self.contents.lock().unwrap_or_else(PoisonError::into_inner) = Some(contents.to_string());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
