//! Foreign-language surface over `UniFFI`.
//!
//! Values cross the boundary as JSON strings; storage and navigation are implemented by the
//! host through the exported callback traits.

use std::sync::Arc;

use serde_json::Value;

use crate::{
    AccountDataClient, CredentialStore, Environment, NavigationContext, Request,
    ServiceConfig, SessionError, SessionManager, SessionStorage,
};

/// A session bound to host-provided durable and ephemeral storage.
#[derive(Debug, uniffi::Object)]
pub struct Session(SessionManager);

#[uniffi::export(async_runtime = "tokio")]
impl Session {
    /// Creates a session from a JSON service configuration (see [`ServiceConfig::from_json`]).
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    #[uniffi::constructor]
    pub fn new(
        config: &str,
        durable: Arc<dyn SessionStorage>,
        ephemeral: Arc<dyn SessionStorage>,
    ) -> Result<Self, SessionError> {
        let config = ServiceConfig::from_json(config)?;
        Ok(Self::build(config, durable, ephemeral))
    }

    /// Creates a session against the default service of `environment`.
    ///
    /// # Errors
    /// Returns an error if the environment's service address is invalid.
    #[uniffi::constructor]
    pub fn with_environment(
        environment: Environment,
        durable: Arc<dyn SessionStorage>,
        ephemeral: Arc<dyn SessionStorage>,
    ) -> Result<Self, SessionError> {
        let config = ServiceConfig::from_environment(environment)?;
        Ok(Self::build(config, durable, ephemeral))
    }

    /// See [`SessionManager::capture_landing`].
    ///
    /// # Errors
    /// See [`SessionManager::capture_landing`].
    pub fn capture_landing(
        &self,
        navigation: Arc<dyn NavigationContext>,
        redirect_to: Option<String>,
    ) -> Result<(), SessionError> {
        self.0
            .capture_landing(navigation.as_ref(), redirect_to.as_deref())
    }

    /// See [`SessionManager::ensure_authenticated`]; returns the account identifier.
    ///
    /// # Errors
    /// See [`SessionManager::ensure_authenticated`].
    pub async fn ensure_authenticated(&self) -> Result<Option<String>, SessionError> {
        Ok(self.0.ensure_authenticated().await?.map(String::from))
    }

    /// See [`SessionManager::logout`].
    ///
    /// # Errors
    /// See [`SessionManager::logout`].
    pub async fn logout(&self) -> Result<(), SessionError> {
        self.0.logout().await
    }

    /// Returns `true` if a durable credential is stored.
    ///
    /// # Errors
    /// Returns an error if the durable backend fails.
    pub fn is_logged_in(&self) -> Result<bool, SessionError> {
        self.0.is_logged_in()
    }

    /// Returns a data handle sharing this session's storage. Each handle has its own cache.
    #[must_use]
    pub fn data(&self) -> Arc<AccountData> {
        Arc::new(AccountData(self.0.data_client()))
    }
}

impl Session {
    fn build(
        config: ServiceConfig,
        durable: Arc<dyn SessionStorage>,
        ephemeral: Arc<dyn SessionStorage>,
    ) -> Self {
        Self(SessionManager::new(
            Request::new(config),
            CredentialStore::new(durable, ephemeral),
        ))
    }
}

/// Named account values, exchanged as JSON strings.
#[derive(Debug, uniffi::Object)]
pub struct AccountData(AccountDataClient);

#[uniffi::export(async_runtime = "tokio")]
impl AccountData {
    /// See [`AccountDataClient::add`].
    ///
    /// # Errors
    /// Returns `SessionError::Serialization` if `value_json` is not valid JSON, otherwise see
    /// [`AccountDataClient::add`].
    pub async fn add(&self, name: String, value_json: String) -> Result<(), SessionError> {
        let value: Value = serde_json::from_str(&value_json)?;
        self.0.add(&name, &value).await
    }

    /// See [`AccountDataClient::get`]; the value is returned as a JSON string.
    ///
    /// # Errors
    /// See [`AccountDataClient::get`].
    pub async fn get(&self, name: String) -> Result<Option<String>, SessionError> {
        Ok(self.0.get(&name).await?.map(|value| value.to_string()))
    }

    /// See [`AccountDataClient::set`].
    ///
    /// # Errors
    /// Returns `SessionError::Serialization` if `value_json` is not valid JSON, otherwise see
    /// [`AccountDataClient::set`].
    pub async fn set(&self, name: String, value_json: String) -> Result<(), SessionError> {
        let value: Value = serde_json::from_str(&value_json)?;
        self.0.set(&name, &value).await
    }

    /// See [`AccountDataClient::remove`].
    ///
    /// # Errors
    /// See [`AccountDataClient::remove`].
    pub async fn remove(&self, name: String) -> Result<bool, SessionError> {
        self.0.remove(&name).await
    }
}
