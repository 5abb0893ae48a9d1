use reqwest::{Method, RequestBuilder};
use serde_json::Value;

use crate::config::ServiceConfig;
use crate::error::{SessionError, SessionResult};

pub(crate) const ACCOUNT_UID_ENDPOINT: &str = "account/uid";
pub(crate) const ACCOUNT_DATA_ENDPOINT: &str = "account/data";
pub(crate) const AUTHENTICATION_ENDPOINT: &str = "authentication";

/// A simple wrapper on an HTTP client for talking to the authentication service. Sets the
/// timeout and user-agent, resolves endpoints against the configured base address and maps
/// failures into [`SessionError`]. It never retries and never caches.
#[derive(Debug, Clone)]
pub struct Request {
    client: reqwest::Client,
    config: ServiceConfig,
}

impl Request {
    /// Initializes a new `Request` instance for the given service.
    #[must_use]
    pub fn new(config: ServiceConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Returns the service configuration in use.
    #[must_use]
    pub const fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Creates a request builder with defaults applied.
    fn req(&self, method: Method, url: reqwest::Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .timeout(self.config.timeout())
            .header(
                "User-Agent",
                format!("sessionkit-core/{}", env!("CARGO_PKG_VERSION")),
            )
    }

    /// Resolves `endpoint` against the configured base URL, without any query.
    ///
    /// # Errors
    /// Returns `SessionError::InvalidConfig` if the endpoint cannot be joined to the base.
    pub(crate) fn endpoint_url(&self, endpoint: &str) -> SessionResult<reqwest::Url> {
        self.config
            .base_url()
            .join(endpoint)
            .map_err(|e| SessionError::InvalidConfig {
                attribute: "endpoint".to_string(),
                reason: format!("{endpoint}: {e}"),
            })
    }

    /// Sends one request to `endpoint` and returns the parsed JSON body unmodified.
    ///
    /// An application-level `error` field is left for the caller to inspect, see
    /// [`into_service_result`].
    ///
    /// # Errors
    /// - `SessionError::ServiceResponse` for any non-success status.
    /// - `SessionError::Transport` if the request cannot be sent or the body is not JSON.
    pub async fn execute(
        &self,
        endpoint: &str,
        method: Method,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> SessionResult<Value> {
        let url = self.endpoint_url(endpoint)?;
        // The query carries the credential, so only the bare URL is ever logged or reported.
        let display_url = url.to_string();
        log::debug!("{method} {display_url}");

        let mut builder = self.req(method, url);
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|err| SessionError::Transport {
            url: display_url.clone(),
            error: format!("request failed: {}", err.without_url()),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SessionError::ServiceResponse {
                url: display_url,
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let bytes = response.bytes().await.map_err(|err| SessionError::Transport {
            url: display_url.clone(),
            error: format!("failed to read response body: {}", err.without_url()),
        })?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }

        serde_json::from_slice(&bytes).map_err(|err| SessionError::Transport {
            url: display_url,
            error: format!("malformed response: {err}"),
        })
    }
}

/// Turns a successful response carrying an `error` field into `RemoteOperationFailed`.
///
/// # Errors
/// Returns `SessionError::RemoteOperationFailed` with the service-reported message.
pub fn into_service_result(response: Value) -> SessionResult<Value> {
    match response.get("error") {
        None | Some(Value::Null) => Ok(response),
        Some(Value::String(message)) => Err(SessionError::RemoteOperationFailed {
            message: message.clone(),
        }),
        Some(other) => Err(SessionError::RemoteOperationFailed {
            message: other.to_string(),
        }),
    }
}
