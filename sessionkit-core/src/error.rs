use thiserror::Error;

use crate::storage::StorageError;

/// Result type for session and account data operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Error outputs from `SessionKit`.
///
/// Every public operation is fallible; callers are expected to match on the kind where
/// behavior differs (e.g. "not logged in" versus "network down").
#[derive(Debug, Error)]
#[cfg_attr(feature = "ffi", derive(uniffi::Error))]
#[cfg_attr(feature = "ffi", uniffi(flat_error))]
pub enum SessionError {
    /// A durable credential is required and none is stored.
    #[error("not_logged_in")]
    NotLoggedIn,
    /// Landing capture was invoked on a URL without a `key` query parameter.
    #[error("missing_landing_credential")]
    MissingLandingCredential,
    /// `add` was called for a name already present in the local cache.
    #[error("duplicate_key: {name}")]
    DuplicateKey {
        /// The colliding value name.
        name: String,
    },
    /// A wire value could not be decoded.
    #[error("malformed_encoding: {reason}")]
    MalformedEncoding {
        /// Why decoding failed.
        reason: String,
    },
    /// The service answered with a non-success HTTP status.
    #[error("service_response: {url} returned {status} {status_text}")]
    ServiceResponse {
        /// The requested URL.
        url: String,
        /// The HTTP status code.
        status: u16,
        /// The canonical reason phrase for the status.
        status_text: String,
    },
    /// The request failed before a status was obtained, or the body was unreadable.
    #[error("transport: {url}: {error}")]
    Transport {
        /// The requested URL.
        url: String,
        /// The underlying failure.
        error: String,
    },
    /// The service reported an application-level `error`, or a mutating data operation failed remotely.
    #[error("remote_operation_failed: {message}")]
    RemoteOperationFailed {
        /// The service-reported message.
        message: String,
    },
    /// The storage backend failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// A value could not be serialized to JSON.
    #[error("serialization_error: {0}")]
    Serialization(String),
    /// The provided configuration is not usable.
    #[error("invalid_config: {attribute}: {reason}")]
    InvalidConfig {
        /// The offending attribute.
        attribute: String,
        /// Why it was rejected.
        reason: String,
    },
}

impl SessionError {
    /// Folds any remote failure into `RemoteOperationFailed`, keeping local errors as they are.
    pub(crate) fn into_remote_failure(self) -> Self {
        match self {
            Self::ServiceResponse { .. } | Self::Transport { .. } => {
                Self::RemoteOperationFailed {
                    message: self.to_string(),
                }
            }
            other => other,
        }
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}
