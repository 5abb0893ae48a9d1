//! Service configuration.

use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;
use strum::EnumString;

use crate::error::{SessionError, SessionResult};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Deployment the client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
#[strum(serialize_all = "lowercase")]
pub enum Environment {
    /// Pre-production service.
    Staging,
    /// Production service.
    Production,
}

impl Environment {
    /// Base address of the authentication service for this environment.
    #[must_use]
    pub const fn base_url(self) -> &'static str {
        match self {
            Self::Staging => "https://auth.stage.sessionkit.dev/",
            Self::Production => "https://auth.sessionkit.dev/",
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawServiceConfig {
    base_url: String,
    timeout_ms: Option<u64>,
}

/// Where and how the remote service is reached.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    base_url: Url,
    timeout: Duration,
}

impl ServiceConfig {
    /// Builds a configuration for an explicit base address.
    ///
    /// # Errors
    /// Returns `SessionError::InvalidConfig` if `base_url` is not an absolute `http(s)` URL.
    pub fn new(base_url: &str) -> SessionResult<Self> {
        let mut url = Url::parse(base_url).map_err(|e| SessionError::InvalidConfig {
            attribute: "base_url".to_string(),
            reason: e.to_string(),
        })?;

        match url.scheme() {
            "https" => {}
            "http" => log::warn!("service base url {url} is not using https"),
            scheme => {
                return Err(SessionError::InvalidConfig {
                    attribute: "base_url".to_string(),
                    reason: format!("unsupported scheme {scheme}"),
                })
            }
        }

        // Endpoints are joined relative to the base, which needs a trailing slash to keep its last segment.
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        Ok(Self {
            base_url: url,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Builds the default configuration for an environment.
    ///
    /// # Errors
    /// See [`ServiceConfig::new`].
    pub fn from_environment(environment: Environment) -> SessionResult<Self> {
        Self::new(environment.base_url())
    }

    /// Parses a configuration from JSON (`{"baseUrl": "...", "timeoutMs": 5000}`).
    ///
    /// # Errors
    /// Returns `SessionError::InvalidConfig` if the JSON or the base address is invalid.
    pub fn from_json(json: &str) -> SessionResult<Self> {
        let raw: RawServiceConfig =
            serde_json::from_str(json).map_err(|e| SessionError::InvalidConfig {
                attribute: "config".to_string(),
                reason: e.to_string(),
            })?;
        let config = Self::new(&raw.base_url)?;
        Ok(match raw.timeout_ms {
            Some(ms) => config.with_timeout(Duration::from_millis(ms)),
            None => config,
        })
    }

    /// Overrides the per-request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the base address endpoints are resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Returns the per-request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_environment_from_str() {
        assert_eq!(Environment::from_str("staging").unwrap(), Environment::Staging);
        assert_eq!(
            Environment::from_str("production").unwrap(),
            Environment::Production
        );
        assert!(Environment::from_str("dev").is_err());
    }

    #[test]
    fn test_environment_urls_parse() {
        for env in [Environment::Staging, Environment::Production] {
            let config = ServiceConfig::from_environment(env).unwrap();
            assert_eq!(config.base_url().scheme(), "https");
            assert_eq!(config.timeout(), DEFAULT_TIMEOUT);
        }
    }

    #[test]
    fn test_new_appends_trailing_slash() {
        let config = ServiceConfig::new("https://example.com/api").unwrap();
        assert_eq!(config.base_url().as_str(), "https://example.com/api/");
        assert_eq!(
            config.base_url().join("account/uid").unwrap().as_str(),
            "https://example.com/api/account/uid"
        );
    }

    #[test]
    fn test_new_rejects_bad_urls() {
        assert!(matches!(
            ServiceConfig::new("not a url"),
            Err(SessionError::InvalidConfig { .. })
        ));
        assert!(matches!(
            ServiceConfig::new("ftp://example.com"),
            Err(SessionError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_from_json() {
        let config =
            ServiceConfig::from_json(r#"{"baseUrl": "http://localhost:8080", "timeoutMs": 2500}"#)
                .unwrap();
        assert_eq!(config.base_url().as_str(), "http://localhost:8080/");
        assert_eq!(config.timeout(), Duration::from_millis(2500));

        assert!(matches!(
            ServiceConfig::from_json(r#"{"timeoutMs": 1}"#),
            Err(SessionError::InvalidConfig { .. })
        ));
    }
}
