//! Directory-backed durable session storage.

use std::fs;
use std::io::{ErrorKind, Write};

use super::{SessionStorage, StorageError, StorageResult, StoragePaths};

/// Durable session storage keeping one file per slot under [`StoragePaths::sessionkit_dir`].
///
/// Writes use the write-to-temp-then-rename pattern so a slot is always either its complete
/// old content or its complete new content.
#[derive(Debug, Clone)]
pub struct FileStorage {
    paths: StoragePaths,
}

impl FileStorage {
    /// Opens (creating if needed) the storage directory under `paths`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(paths: StoragePaths) -> StorageResult<Self> {
        fs::create_dir_all(paths.sessionkit_dir())?;
        Ok(Self { paths })
    }

    /// Returns the paths this store writes to.
    #[must_use]
    pub const fn paths(&self) -> &StoragePaths {
        &self.paths
    }
}

fn validate_slot(key: &str) -> StorageResult<()> {
    if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
        return Err(StorageError::Backend(format!("invalid slot name: {key:?}")));
    }
    Ok(())
}

impl SessionStorage for FileStorage {
    fn read(&self, key: String) -> StorageResult<Option<String>> {
        validate_slot(&key)?;
        match fs::read_to_string(self.paths.slot_path(&key)) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn write(&self, key: String, value: String) -> StorageResult<()> {
        validate_slot(&key)?;
        let temp_path = self.paths.slot_temp_path(&key);
        {
            let mut file = fs::File::create(&temp_path)?;
            file.write_all(value.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&temp_path, self.paths.slot_path(&key))?;
        Ok(())
    }

    fn delete(&self, key: String) -> StorageResult<()> {
        validate_slot(&key)?;
        match fs::remove_file(self.paths.slot_path(&key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStorage::open(StoragePaths::new(dir.path())).unwrap();
        store
            .write("session-credential".to_string(), "abc".to_string())
            .unwrap();
        drop(store);

        let reopened = FileStorage::open(StoragePaths::new(dir.path())).unwrap();
        assert_eq!(
            reopened.read("session-credential".to_string()).unwrap().as_deref(),
            Some("abc")
        );
        assert!(!reopened
            .paths()
            .slot_temp_path("session-credential")
            .exists());
    }

    #[test]
    fn test_delete_missing_slot_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStorage::open(StoragePaths::new(dir.path())).unwrap();
        store.delete("session-credential".to_string()).unwrap();
        assert_eq!(store.read("session-credential".to_string()).unwrap(), None);
    }

    #[test]
    fn test_rejects_path_like_slot_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStorage::open(StoragePaths::new(dir.path())).unwrap();
        assert!(matches!(
            store.write("../escape".to_string(), "x".to_string()),
            Err(StorageError::Backend(_))
        ));
    }
}
