//! Error types for session storage backends.

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors raised by session storage backends.
#[derive(Debug, Error)]
#[cfg_attr(feature = "ffi", derive(uniffi::Error))]
pub enum StorageError {
    /// Filesystem failures from the file-backed store.
    #[error("storage io error: {0}")]
    Io(String),

    /// Errors reported by a host-provided backend.
    #[error("storage backend error: {0}")]
    Backend(String),

    /// A lock guarding in-memory state was poisoned.
    #[error("storage lock poisoned")]
    Poisoned,

    /// Unexpected `UniFFI` callback error.
    #[error("unexpected uniffi callback error: {0}")]
    UnexpectedUniFFICallbackError(String),
}

impl From<std::io::Error> for StorageError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

#[cfg(feature = "ffi")]
impl From<uniffi::UnexpectedUniFFICallbackError> for StorageError {
    fn from(error: uniffi::UnexpectedUniFFICallbackError) -> Self {
        Self::UnexpectedUniFFICallbackError(error.reason)
    }
}
