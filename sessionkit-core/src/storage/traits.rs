//! Platform interface for session storage.

use super::error::StorageResult;

/// Key-value backend holding one session slot per key.
///
/// A backend only persists strings; it knows nothing about credentials, JSON or the network.
/// Its lifetime scope (durable across restarts, or tied to the current page/process) is chosen
/// by whoever constructs the [`super::CredentialStore`].
#[cfg_attr(feature = "ffi", uniffi::export(with_foreign))]
pub trait SessionStorage: Send + Sync {
    /// Reads the value stored under `key`, if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails. A missing key is `Ok(None)`.
    fn read(&self, key: String) -> StorageResult<Option<String>>;

    /// Writes `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn write(&self, key: String, value: String) -> StorageResult<()>;

    /// Deletes the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `Ok(())` even if the key doesn't exist.
    /// Only returns an error for actual backend failures.
    fn delete(&self, key: String) -> StorageResult<()>;
}
