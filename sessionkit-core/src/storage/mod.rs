//! Session storage: the durable credential slot and the ephemeral account identifier slot.
//!
//! The two slots deliberately live in separate backends with different lifetimes. The
//! credential survives restarts; the account identifier is a per-lifetime memo of a remote
//! lookup and disappears with the ephemeral backend.

mod error;
mod file;
mod memory;
mod paths;
mod traits;

use std::sync::Arc;

pub use error::{StorageError, StorageResult};
pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use paths::StoragePaths;
pub use traits::SessionStorage;

use crate::types::{AccountId, Credential};

/// Durable slot holding the session credential.
pub const CREDENTIAL_SLOT: &str = "session-credential";
/// Ephemeral slot holding the resolved account identifier.
pub const ACCOUNT_ID_SLOT: &str = "session-account-id";

/// Persistence for session state, split across a durable and an ephemeral backend.
#[derive(Clone)]
pub struct CredentialStore {
    durable: Arc<dyn SessionStorage>,
    ephemeral: Arc<dyn SessionStorage>,
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore").finish_non_exhaustive()
    }
}

impl CredentialStore {
    /// Creates a store over the given backends.
    #[must_use]
    pub fn new(
        durable: Arc<dyn SessionStorage>,
        ephemeral: Arc<dyn SessionStorage>,
    ) -> Self {
        Self { durable, ephemeral }
    }

    /// Creates a store with a durable backend and a fresh in-memory ephemeral backend.
    #[must_use]
    pub fn with_durable(durable: Arc<dyn SessionStorage>) -> Self {
        Self::new(durable, Arc::new(MemoryStorage::new()))
    }

    /// Overwrites the durable credential.
    ///
    /// # Errors
    ///
    /// Returns an error if the durable backend fails.
    pub fn save_credential(&self, credential: &Credential) -> StorageResult<()> {
        self.durable
            .write(CREDENTIAL_SLOT.to_string(), credential.expose().to_string())
    }

    /// Loads the durable credential; `Ok(None)` when no session was captured.
    ///
    /// # Errors
    ///
    /// Returns an error if the durable backend fails.
    pub fn load_credential(&self) -> StorageResult<Option<Credential>> {
        Ok(self
            .durable
            .read(CREDENTIAL_SLOT.to_string())?
            .filter(|token| !token.is_empty())
            .map(Credential::new))
    }

    /// Removes both the durable credential and the ephemeral account identifier.
    ///
    /// Both deletes are always attempted; the first failure is reported.
    ///
    /// # Errors
    ///
    /// Returns an error if either backend fails.
    pub fn clear_credential(&self) -> StorageResult<()> {
        let durable = self.durable.delete(CREDENTIAL_SLOT.to_string());
        let ephemeral = self.clear_account_id();
        durable.and(ephemeral)
    }

    /// Caches the resolved account identifier for the current lifetime.
    ///
    /// # Errors
    ///
    /// Returns an error if the ephemeral backend fails.
    pub fn save_account_id(&self, account_id: &AccountId) -> StorageResult<()> {
        self.ephemeral
            .write(ACCOUNT_ID_SLOT.to_string(), account_id.as_str().to_string())
    }

    /// Loads the cached account identifier, if resolved during this lifetime.
    ///
    /// # Errors
    ///
    /// Returns an error if the ephemeral backend fails.
    pub fn load_account_id(&self) -> StorageResult<Option<AccountId>> {
        Ok(self
            .ephemeral
            .read(ACCOUNT_ID_SLOT.to_string())?
            .filter(|uid| !uid.is_empty())
            .map(AccountId::new))
    }

    /// Forgets the cached account identifier only.
    ///
    /// # Errors
    ///
    /// Returns an error if the ephemeral backend fails.
    pub fn clear_account_id(&self) -> StorageResult<()> {
        self.ephemeral.delete(ACCOUNT_ID_SLOT.to_string())
    }
}
