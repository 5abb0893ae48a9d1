//! Storage path helpers.

use std::path::{Path, PathBuf};

const SESSIONKIT_DIRNAME: &str = "sessionkit";
const TEMP_SUFFIX: &str = "tmp";

/// Paths for durable session artifacts under `<root>/sessionkit`.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    root: PathBuf,
    sessionkit_dir: PathBuf,
}

impl StoragePaths {
    /// Builds storage paths rooted at `root`.
    #[must_use]
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        let sessionkit_dir = root.join(SESSIONKIT_DIRNAME);
        Self {
            root,
            sessionkit_dir,
        }
    }

    /// Returns the storage root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the `SessionKit` storage directory.
    #[must_use]
    pub fn sessionkit_dir(&self) -> &Path {
        &self.sessionkit_dir
    }

    /// Returns the path of the file holding `slot`.
    #[must_use]
    pub fn slot_path(&self, slot: &str) -> PathBuf {
        self.sessionkit_dir.join(slot)
    }

    /// Returns the temporary path used while atomically replacing `slot`.
    #[must_use]
    pub fn slot_temp_path(&self, slot: &str) -> PathBuf {
        self.sessionkit_dir.join(format!("{slot}.{TEMP_SUFFIX}"))
    }
}
