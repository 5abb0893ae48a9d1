//! In-memory session storage.
//!
//! Used as the ephemeral backend: its contents live exactly as long as the process, which is
//! the lifetime the resolved account identifier is memoized for.

use std::collections::HashMap;
use std::sync::Mutex;

use super::{SessionStorage, StorageError, StorageResult};

/// Session storage backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    slots: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Creates a new empty memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Poisoned` if the lock is poisoned.
    pub fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.slots.lock().map_err(|_| StorageError::Poisoned)?.is_empty())
    }
}

impl SessionStorage for MemoryStorage {
    fn read(&self, key: String) -> StorageResult<Option<String>> {
        let guard = self.slots.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(guard.get(&key).cloned())
    }

    fn write(&self, key: String, value: String) -> StorageResult<()> {
        self.slots
            .lock()
            .map_err(|_| StorageError::Poisoned)?
            .insert(key, value);
        Ok(())
    }

    fn delete(&self, key: String) -> StorageResult<()> {
        self.slots
            .lock()
            .map_err(|_| StorageError::Poisoned)?
            .remove(&key);
        Ok(())
    }
}
