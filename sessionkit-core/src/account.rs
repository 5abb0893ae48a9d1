//! Per-account named values, cached locally and stored remotely in wire form.
//!
//! The cache is optimistic: mutating operations update it before the request goes out and
//! never roll it back. After an observed error, cached state is best-effort only.
//!
//! Entries belong to the credential they were read or written under. When the stored
//! credential changes (a logout followed by a landing for another account), the cache is
//! dropped on the next operation.
//!
//! `add` checks for duplicates against the local cache alone. With a cold cache it cannot see
//! a value that already exists remotely, so the service's own uniqueness rule is what applies.

use std::collections::HashMap;

use reqwest::Method;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use tokio::sync::Mutex;

use crate::codec;
use crate::error::{SessionError, SessionResult};
use crate::request::{into_service_result, Request, ACCOUNT_DATA_ENDPOINT};
use crate::storage::CredentialStore;
use crate::types::Credential;

#[derive(Debug, Clone, PartialEq)]
enum CachedValue {
    Present(Value),
    /// Removed during this lifetime; the next read goes back to the service.
    Removed,
}

#[derive(Debug, Default)]
struct DataCache {
    owner: Option<Credential>,
    entries: HashMap<String, CachedValue>,
}

impl DataCache {
    /// Returns the entries for `credential`, discarding any held for a different one.
    fn scoped_to(&mut self, credential: &Credential) -> &mut HashMap<String, CachedValue> {
        let same_owner = self
            .owner
            .as_ref()
            .is_some_and(|owner| owner.expose() == credential.expose());
        if !same_owner {
            if !self.entries.is_empty() {
                log::debug!("credential changed, dropping cached account data");
            }
            self.entries.clear();
            self.owner = Some(Credential::new(credential.expose()));
        }
        &mut self.entries
    }
}

/// CRUD over the authenticated account's named values.
#[derive(Debug)]
pub struct AccountDataClient {
    request: Request,
    store: CredentialStore,
    cache: Mutex<DataCache>,
}

impl AccountDataClient {
    /// Creates a client with an empty cache.
    #[must_use]
    pub fn new(request: Request, store: CredentialStore) -> Self {
        Self {
            request,
            store,
            cache: Mutex::new(DataCache::default()),
        }
    }

    fn credential(&self) -> SessionResult<Credential> {
        self.store
            .load_credential()?
            .ok_or(SessionError::NotLoggedIn)
    }

    /// Creates a new named value.
    ///
    /// # Errors
    /// - `SessionError::NotLoggedIn` if no credential is stored.
    /// - `SessionError::DuplicateKey` if `name` is already cached.
    /// - `SessionError::Serialization` if `value` is not representable as JSON.
    /// - `SessionError::RemoteOperationFailed` if the service call fails.
    pub async fn add<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> SessionResult<()> {
        let credential = self.credential()?;
        let value = serde_json::to_value(value)?;
        let wire = codec::encode(&value)?;

        {
            let mut cache = self.cache.lock().await;
            let entries = cache.scoped_to(&credential);
            if matches!(entries.get(name), Some(CachedValue::Present(_))) {
                return Err(SessionError::DuplicateKey {
                    name: name.to_string(),
                });
            }
            entries.insert(name.to_string(), CachedValue::Present(value));
        }

        self.write(Method::POST, &credential, name, wire).await
    }

    /// Reads a named value, from the cache when it has already been seen this lifetime.
    ///
    /// Returns `Ok(None)` when the service holds no value under `name`.
    ///
    /// # Errors
    /// - `SessionError::NotLoggedIn` if no credential is stored.
    /// - `SessionError::ServiceResponse` / `SessionError::Transport` if the request fails.
    /// - `SessionError::RemoteOperationFailed` if the service reports an error.
    /// - `SessionError::MalformedEncoding` if the stored value cannot be decoded.
    pub async fn get(&self, name: &str) -> SessionResult<Option<Value>> {
        let credential = self.credential()?;

        if let Some(CachedValue::Present(value)) =
            self.cache.lock().await.scoped_to(&credential).get(name)
        {
            return Ok(Some(value.clone()));
        }

        let response = self
            .request
            .execute(
                ACCOUNT_DATA_ENDPOINT,
                Method::GET,
                &[("key", credential.expose()), ("name", name)],
                None,
            )
            .await
            .and_then(into_service_result)?;

        let value = match response.get("value") {
            None | Some(Value::Null) => return Ok(None),
            Some(Value::String(wire)) => codec::decode(wire)?,
            Some(other) => {
                return Err(SessionError::MalformedEncoding {
                    reason: format!("expected a hex string, got {other}"),
                })
            }
        };

        self.cache
            .lock()
            .await
            .scoped_to(&credential)
            .insert(name.to_string(), CachedValue::Present(value.clone()));
        Ok(Some(value))
    }

    /// Reads a named value and deserializes it into `T`.
    ///
    /// # Errors
    /// See [`AccountDataClient::get`]. A value that does not match `T` is a
    /// `SessionError::Serialization` error.
    pub async fn get_as<T: DeserializeOwned>(&self, name: &str) -> SessionResult<Option<T>> {
        match self.get(name).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Creates or overwrites a named value.
    ///
    /// # Errors
    /// - `SessionError::NotLoggedIn` if no credential is stored.
    /// - `SessionError::Serialization` if `value` is not representable as JSON.
    /// - `SessionError::RemoteOperationFailed` if the service call fails.
    pub async fn set<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> SessionResult<()> {
        let credential = self.credential()?;
        let value = serde_json::to_value(value)?;
        let wire = codec::encode(&value)?;

        self.cache
            .lock()
            .await
            .scoped_to(&credential)
            .insert(name.to_string(), CachedValue::Present(value));

        self.write(Method::PUT, &credential, name, wire).await
    }

    /// Deletes a named value, returning the service's success flag.
    ///
    /// # Errors
    /// - `SessionError::NotLoggedIn` if no credential is stored.
    /// - `SessionError::RemoteOperationFailed` if the service call fails.
    pub async fn remove(&self, name: &str) -> SessionResult<bool> {
        let credential = self.credential()?;

        self.cache
            .lock()
            .await
            .scoped_to(&credential)
            .insert(name.to_string(), CachedValue::Removed);

        let response = self
            .request
            .execute(
                ACCOUNT_DATA_ENDPOINT,
                Method::DELETE,
                &[("key", credential.expose()), ("name", name)],
                None,
            )
            .await
            .and_then(into_service_result)
            .map_err(SessionError::into_remote_failure)?;

        Ok(response
            .get("success")
            .and_then(Value::as_bool)
            .unwrap_or(false))
    }

    /// Names currently cached with a value for the stored credential, sorted.
    ///
    /// Empty when no credential is stored.
    pub async fn cached_names(&self) -> Vec<String> {
        let Ok(Some(credential)) = self.store.load_credential() else {
            return Vec::new();
        };
        let mut cache = self.cache.lock().await;
        let mut names: Vec<String> = cache
            .scoped_to(&credential)
            .iter()
            .filter(|(_, entry)| matches!(entry, CachedValue::Present(_)))
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    async fn write(
        &self,
        method: Method,
        credential: &Credential,
        name: &str,
        wire: String,
    ) -> SessionResult<()> {
        let body = json!({
            "key": credential.expose(),
            "name": name,
            "value": wire,
        });

        self.request
            .execute(ACCOUNT_DATA_ENDPOINT, method, &[], Some(&body))
            .await
            .and_then(into_service_result)
            .map(|_| ())
            .map_err(SessionError::into_remote_failure)
    }
}
