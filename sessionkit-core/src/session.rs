//! Session lifecycle: landing capture, account resolution and logout.

use std::sync::Mutex;

use reqwest::{Method, Url};
use serde_json::Value;

use crate::account::AccountDataClient;
use crate::error::{SessionError, SessionResult};
use crate::request::{into_service_result, Request, ACCOUNT_UID_ENDPOINT, AUTHENTICATION_ENDPOINT};
use crate::storage::CredentialStore;
use crate::types::{AccountId, Credential};

/// Query parameter carrying the credential on the landing URL.
pub const LANDING_KEY_PARAM: &str = "key";

/// Where a session currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No durable credential is stored.
    NoCredential,
    /// A credential is stored but the account has not been resolved in this lifetime.
    CredentialUnresolved,
    /// The account identifier is resolved and cached.
    Authenticated(AccountId),
}

/// The navigation context a landing credential is read from.
///
/// In a browser host this is the current location; `replace` swaps the current history entry
/// so the credential-bearing URL does not linger.
#[cfg_attr(feature = "ffi", uniffi::export(with_foreign))]
pub trait NavigationContext: Send + Sync {
    /// Returns the full current URL, query string included.
    fn current_url(&self) -> String;

    /// Replaces the current location with `destination`.
    fn replace(&self, destination: String);
}

/// A fixed navigation context, for hosts that receive the landing URL out of band (a CLI, a
/// deep link handler). Redirects are recorded rather than performed.
#[derive(Debug)]
pub struct StaticNavigation {
    url: String,
    replaced_with: Mutex<Option<String>>,
}

impl StaticNavigation {
    /// Creates a context positioned at `url`.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            replaced_with: Mutex::new(None),
        }
    }

    /// Returns the last destination passed to [`NavigationContext::replace`].
    #[must_use]
    pub fn replaced_with(&self) -> Option<String> {
        self.replaced_with
            .lock()
            .ok()
            .and_then(|guard| guard.clone())
    }
}

impl NavigationContext for StaticNavigation {
    fn current_url(&self) -> String {
        self.url.clone()
    }

    fn replace(&self, destination: String) {
        if let Ok(mut guard) = self.replaced_with.lock() {
            *guard = Some(destination);
        }
    }
}

/// Orchestrates the session lifecycle on top of a [`CredentialStore`] and a [`Request`].
#[derive(Debug, Clone)]
pub struct SessionManager {
    request: Request,
    store: CredentialStore,
}

impl SessionManager {
    /// Creates a manager over the given executor and storage.
    #[must_use]
    pub const fn new(request: Request, store: CredentialStore) -> Self {
        Self { request, store }
    }

    /// Returns a data client sharing this manager's executor and storage.
    #[must_use]
    pub fn data_client(&self) -> AccountDataClient {
        AccountDataClient::new(self.request.clone(), self.store.clone())
    }

    /// Derives the current state from storage, without touching the network.
    ///
    /// # Errors
    /// Returns `SessionError::Storage` if a backend fails.
    pub fn state(&self) -> SessionResult<SessionState> {
        if self.store.load_credential()?.is_none() {
            return Ok(SessionState::NoCredential);
        }
        Ok(match self.store.load_account_id()? {
            Some(account_id) => SessionState::Authenticated(account_id),
            None => SessionState::CredentialUnresolved,
        })
    }

    /// Returns `true` if a durable credential is stored.
    ///
    /// # Errors
    /// Returns `SessionError::Storage` if the durable backend fails.
    pub fn is_logged_in(&self) -> SessionResult<bool> {
        Ok(self.store.load_credential()?.is_some())
    }

    /// Returns the account identifier cached for this lifetime, if any.
    ///
    /// # Errors
    /// Returns `SessionError::Storage` if the ephemeral backend fails.
    pub fn account_id(&self) -> SessionResult<Option<AccountId>> {
        Ok(self.store.load_account_id()?)
    }

    /// Captures the landing credential from the navigation context's `key` query parameter.
    ///
    /// Always starts a fresh session: any stored credential is overwritten and the cached
    /// account identifier is dropped. When `redirect_to` is given, the navigation context is
    /// replaced with it once the credential is stored.
    ///
    /// # Errors
    /// - `SessionError::MissingLandingCredential` if the URL has no non-empty `key`; nothing is written.
    /// - `SessionError::Storage` if a backend fails.
    pub fn capture_landing(
        &self,
        navigation: &dyn NavigationContext,
        redirect_to: Option<&str>,
    ) -> SessionResult<()> {
        let credential = landing_credential(&navigation.current_url())
            .ok_or(SessionError::MissingLandingCredential)?;

        self.store.clear_account_id()?;
        self.store.save_credential(&credential)?;
        log::debug!("captured landing credential, session reset");

        if let Some(destination) = redirect_to {
            navigation.replace(destination.to_string());
        }
        Ok(())
    }

    /// Makes sure the account identifier is resolved, resolving it at most once per lifetime.
    ///
    /// Returns `Ok(None)` when no credential is stored; that is a valid unauthenticated state,
    /// not an error.
    ///
    /// # Errors
    /// - `SessionError::ServiceResponse` / `SessionError::Transport` if resolution fails; the
    ///   session stays `CredentialUnresolved`.
    /// - `SessionError::RemoteOperationFailed` if the service rejects the credential.
    /// - `SessionError::Storage` if a backend fails.
    pub async fn ensure_authenticated(&self) -> SessionResult<Option<AccountId>> {
        if let Some(account_id) = self.store.load_account_id()? {
            return Ok(Some(account_id));
        }
        let Some(credential) = self.store.load_credential()? else {
            return Ok(None);
        };

        let account_id = self.resolve_account_id(&credential).await?;
        self.store.save_account_id(&account_id)?;
        log::debug!("session authenticated");
        Ok(Some(account_id))
    }

    async fn resolve_account_id(&self, credential: &Credential) -> SessionResult<AccountId> {
        let response = self
            .request
            .execute(
                ACCOUNT_UID_ENDPOINT,
                Method::GET,
                &[("key", credential.expose())],
                None,
            )
            .await
            .and_then(into_service_result)?;

        match response.get("uid") {
            Some(Value::String(uid)) if !uid.is_empty() => Ok(AccountId::new(uid.as_str())),
            Some(Value::Number(uid)) => Ok(AccountId::new(uid.to_string())),
            _ => Err(SessionError::Transport {
                url: self.request.endpoint_url(ACCOUNT_UID_ENDPOINT)?.to_string(),
                error: "malformed response: missing uid".to_string(),
            }),
        }
    }

    /// Ends the session remotely and locally.
    ///
    /// Local state is always cleared before the remote outcome is reported, so after this call
    /// the session is `NoCredential` whether or not the service acknowledged the logout.
    ///
    /// # Errors
    /// - `SessionError::NotLoggedIn` if no credential is stored.
    /// - Any remote failure, raised after local state has been cleared.
    pub async fn logout(&self) -> SessionResult<()> {
        let credential = self
            .store
            .load_credential()?
            .ok_or(SessionError::NotLoggedIn)?;

        let remote = self
            .request
            .execute(
                AUTHENTICATION_ENDPOINT,
                Method::DELETE,
                &[("key", credential.expose())],
                None,
            )
            .await
            .and_then(into_service_result);

        let cleared = self.store.clear_credential();

        match remote {
            Ok(_) => {
                cleared?;
                log::debug!("logged out");
                Ok(())
            }
            Err(err) => {
                if let Err(clear_err) = cleared {
                    log::error!("failed to clear session after failed logout: {clear_err}");
                }
                log::warn!("remote logout failed, local session cleared: {err}");
                Err(err)
            }
        }
    }
}

fn landing_credential(url: &str) -> Option<Credential> {
    let url = Url::parse(url).ok()?;
    url.query_pairs()
        .find(|(name, _)| name == LANDING_KEY_PARAM)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
        .map(Credential::new)
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;
    use serde_json::json;

    use super::*;
    use crate::config::ServiceConfig;
    use crate::storage::test_support::TestStore;

    fn manager_for(server: &mockito::Server, test: &TestStore) -> SessionManager {
        let request = Request::new(ServiceConfig::new(&server.url()).unwrap());
        SessionManager::new(request, test.store.clone())
    }

    fn offline_manager(test: &TestStore) -> SessionManager {
        let request = Request::new(ServiceConfig::new("http://127.0.0.1:1").unwrap());
        SessionManager::new(request, test.store.clone())
    }

    #[test]
    fn test_capture_landing_stores_credential_and_redirects() {
        let test = TestStore::new();
        let manager = offline_manager(&test);
        let navigation = StaticNavigation::new("https://app.example/landing?key=abc%20123&x=1");

        manager
            .capture_landing(&navigation, Some("/dashboard"))
            .unwrap();

        assert_eq!(
            test.store.load_credential().unwrap().unwrap().expose(),
            "abc 123"
        );
        assert_eq!(navigation.replaced_with().as_deref(), Some("/dashboard"));
        assert_eq!(manager.state().unwrap(), SessionState::CredentialUnresolved);
    }

    #[test]
    fn test_capture_landing_without_key_writes_nothing() {
        let test = TestStore::new();
        let manager = offline_manager(&test);

        for url in [
            "https://app.example/landing",
            "https://app.example/landing?other=1",
            "https://app.example/landing?key=",
            "not a url",
        ] {
            let navigation = StaticNavigation::new(url);
            let result = manager.capture_landing(&navigation, Some("/home"));
            assert!(matches!(result, Err(SessionError::MissingLandingCredential)));
            assert!(navigation.replaced_with().is_none());
        }

        assert!(test.durable.is_empty().unwrap());
        assert!(test.ephemeral.is_empty().unwrap());
    }

    #[test]
    fn test_capture_landing_starts_fresh_session() {
        let test = TestStore::new();
        test.store.save_credential(&Credential::new("old")).unwrap();
        test.store.save_account_id(&AccountId::new("old-uid")).unwrap();
        let manager = offline_manager(&test);

        manager
            .capture_landing(&StaticNavigation::new("https://app.example/?key=new"), None)
            .unwrap();

        assert_eq!(test.store.load_credential().unwrap().unwrap().expose(), "new");
        assert!(manager.account_id().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ensure_authenticated_without_credential_is_not_an_error() {
        let test = TestStore::new();
        let manager = offline_manager(&test);

        assert_eq!(manager.ensure_authenticated().await.unwrap(), None);
        assert_eq!(manager.state().unwrap(), SessionState::NoCredential);
    }

    #[tokio::test]
    async fn test_ensure_authenticated_resolves_once() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/account/uid")
            .match_query(Matcher::UrlEncoded("key".into(), "cred".into()))
            .with_status(200)
            .with_body(r#"{"uid":"user-7"}"#)
            .expect(1)
            .create_async()
            .await;

        let test = TestStore::new();
        test.store.save_credential(&Credential::new("cred")).unwrap();
        let manager = manager_for(&server, &test);

        let first = manager.ensure_authenticated().await.unwrap();
        let second = manager.ensure_authenticated().await.unwrap();

        mock.assert_async().await;
        assert_eq!(first, Some(AccountId::new("user-7")));
        assert_eq!(second, first);
        assert_eq!(
            manager.state().unwrap(),
            SessionState::Authenticated(AccountId::new("user-7"))
        );
    }

    #[tokio::test]
    async fn test_ensure_authenticated_failure_leaves_credential_unresolved() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/account/uid")
            .match_query(Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        let test = TestStore::new();
        test.store.save_credential(&Credential::new("cred")).unwrap();
        let manager = manager_for(&server, &test);

        let result = manager.ensure_authenticated().await;

        assert!(matches!(
            result,
            Err(SessionError::ServiceResponse { status: 500, .. })
        ));
        assert_eq!(manager.state().unwrap(), SessionState::CredentialUnresolved);
    }

    #[tokio::test]
    async fn test_ensure_authenticated_rejected_credential() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/account/uid")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(json!({"error": "session expired"}).to_string())
            .create_async()
            .await;

        let test = TestStore::new();
        test.store.save_credential(&Credential::new("cred")).unwrap();
        let manager = manager_for(&server, &test);

        match manager.ensure_authenticated().await {
            Err(SessionError::RemoteOperationFailed { message }) => {
                assert_eq!(message, "session expired");
            }
            other => panic!("Expected RemoteOperationFailed, got: {other:?}"),
        }
        assert!(manager.account_id().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_logout_requires_credential() {
        let test = TestStore::new();
        let manager = offline_manager(&test);

        assert!(matches!(
            manager.logout().await,
            Err(SessionError::NotLoggedIn)
        ));
    }

    #[tokio::test]
    async fn test_logout_clears_both_slots() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("DELETE", "/authentication")
            .match_query(Matcher::UrlEncoded("key".into(), "cred".into()))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let test = TestStore::new();
        test.store.save_credential(&Credential::new("cred")).unwrap();
        test.store.save_account_id(&AccountId::new("uid")).unwrap();
        let manager = manager_for(&server, &test);

        manager.logout().await.unwrap();

        mock.assert_async().await;
        assert_eq!(manager.state().unwrap(), SessionState::NoCredential);
        assert!(test.ephemeral.is_empty().unwrap());
    }

    #[tokio::test]
    async fn test_logout_clears_state_even_when_service_fails() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("DELETE", "/authentication")
            .match_query(Matcher::Any)
            .with_status(503)
            .create_async()
            .await;

        let test = TestStore::new();
        test.store.save_credential(&Credential::new("cred")).unwrap();
        test.store.save_account_id(&AccountId::new("uid")).unwrap();
        let manager = manager_for(&server, &test);

        let result = manager.logout().await;

        assert!(matches!(
            result,
            Err(SessionError::ServiceResponse { status: 503, .. })
        ));
        assert_eq!(manager.state().unwrap(), SessionState::NoCredential);
        assert!(!manager.is_logged_in().unwrap());
        assert!(test.durable.is_empty().unwrap());
        assert!(test.ephemeral.is_empty().unwrap());
    }

    #[tokio::test]
    async fn test_logout_clears_state_when_service_reports_error() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("DELETE", "/authentication")
            .match_query(Matcher::UrlEncoded("key".into(), "cred".into()))
            .with_status(200)
            .with_body(r#"{"error":"session already ended"}"#)
            .expect(1)
            .create_async()
            .await;

        let test = TestStore::new();
        test.store.save_credential(&Credential::new("cred")).unwrap();
        test.store.save_account_id(&AccountId::new("uid")).unwrap();
        let manager = manager_for(&server, &test);

        match manager.logout().await {
            Err(SessionError::RemoteOperationFailed { message }) => {
                assert_eq!(message, "session already ended");
            }
            other => panic!("Expected RemoteOperationFailed, got: {other:?}"),
        }
        mock.assert_async().await;
        assert_eq!(manager.state().unwrap(), SessionState::NoCredential);
        assert!(test.durable.is_empty().unwrap());
        assert!(test.ephemeral.is_empty().unwrap());
    }

    #[tokio::test]
    async fn test_missing_uid_reports_full_endpoint_url() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/account/uid")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let test = TestStore::new();
        test.store.save_credential(&Credential::new("cred")).unwrap();
        let manager = manager_for(&server, &test);

        match manager.ensure_authenticated().await {
            Err(SessionError::Transport { url, error }) => {
                assert_eq!(url, format!("{}/account/uid", server.url()));
                assert!(error.contains("missing uid"));
            }
            other => panic!("Expected Transport, got: {other:?}"),
        }
        assert_eq!(manager.state().unwrap(), SessionState::CredentialUnresolved);
    }

    #[tokio::test]
    async fn test_logout_clears_state_when_service_is_unreachable() {
        let test = TestStore::new();
        test.store.save_credential(&Credential::new("cred")).unwrap();
        let manager = offline_manager(&test);

        assert!(matches!(
            manager.logout().await,
            Err(SessionError::Transport { .. })
        ));
        assert!(!manager.is_logged_in().unwrap());
    }
}
