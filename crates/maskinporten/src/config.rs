//! Handler configuration.
//!
//! [`HandlerConfig`] is a plain value object. The core never reads
//! configuration files itself; a collaborator (the `maskinporten` CLI, or
//! any embedding application) deserializes or builds it and hands it to
//! [`Handler::new`](crate::Handler::new).
//!
//! # Example (YAML)
//!
//! ```yaml
//! private_key: /etc/maskinporten/key.pem
//! public_key: /etc/maskinporten/cert.pem
//! token_endpoint: https://maskinporten.no/token
//! scope: "nav:example/read"
//! aud: https://maskinporten.no/
//! iss: 0ab12c34-5678-90de-f123-456789abcdef
//! request_timeout: 30s
//! ```
//!
//! The camelCase keys of the older YAML format (`privateKey`, `publicKey`,
//! `tokenEndpoint`, `Debug`) are accepted as aliases.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

/// Default timeout for a single token request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for a [`Handler`](crate::Handler).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct HandlerConfig {
    /// Path to the PEM-encoded RSA private key (PKCS#1 or PKCS#8).
    #[serde(alias = "privateKey", alias = "privatekey")]
    pub private_key: PathBuf,

    /// Path to the PEM-encoded certificate chain, leaf first.
    #[serde(alias = "publicKey", alias = "publickey")]
    pub public_key: PathBuf,

    /// Token endpoint of the authorization server.
    #[serde(alias = "tokenEndpoint", alias = "tokenendpoint")]
    pub token_endpoint: String,

    /// Space-separated scopes requested in the assertion.
    pub scope: String,

    /// Audience claim, normally the authorization server's issuer URL.
    #[serde(alias = "audience")]
    pub aud: String,

    /// Issuer claim, the client identifier registered with the server.
    #[serde(alias = "issuer")]
    pub iss: String,

    /// Verbose logging. Only the CLI layer looks at this.
    #[serde(alias = "Debug")]
    pub debug: bool,

    /// Timeout for a single token request.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Accept a plain `http` token endpoint. Meant for local mocks only.
    pub allow_insecure_http: bool,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            private_key: PathBuf::new(),
            public_key: PathBuf::new(),
            token_endpoint: String::new(),
            scope: String::new(),
            aud: String::new(),
            iss: String::new(),
            debug: false,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            allow_insecure_http: false,
        }
    }
}

impl HandlerConfig {
    /// Creates a configuration with the required fields set and defaults
    /// for everything else.
    #[must_use]
    pub fn new(
        private_key: impl Into<PathBuf>,
        public_key: impl Into<PathBuf>,
        token_endpoint: impl Into<String>,
        scope: impl Into<String>,
        aud: impl Into<String>,
        iss: impl Into<String>,
    ) -> Self {
        Self {
            private_key: private_key.into(),
            public_key: public_key.into(),
            token_endpoint: token_endpoint.into(),
            scope: scope.into(),
            aud: aud.into(),
            iss: iss.into(),
            ..Self::default()
        }
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Allows a plain `http` token endpoint.
    #[must_use]
    pub fn with_allow_insecure_http(mut self, allow: bool) -> Self {
        self.allow_insecure_http = allow;
        self
    }

    /// Sets the debug flag.
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Parses the token endpoint and checks its scheme.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the endpoint is not a URL, or
    /// is not `https` (plain `http` only when `allow_insecure_http` is set).
    pub fn token_endpoint_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.token_endpoint).map_err(|e| {
            ConfigError::InvalidValue(format!(
                "token_endpoint '{}' is not a valid URL: {}",
                self.token_endpoint, e
            ))
        })?;

        match url.scheme() {
            "https" => Ok(url),
            "http" if self.allow_insecure_http => Ok(url),
            other => Err(ConfigError::InvalidValue(format!(
                "token_endpoint must use https, got '{}'",
                other
            ))),
        }
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` for an empty required field and
    /// `ConfigError::InvalidValue` for a malformed one.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.private_key.as_os_str().is_empty() {
            return Err(ConfigError::Missing("private_key".to_string()));
        }
        if self.public_key.as_os_str().is_empty() {
            return Err(ConfigError::Missing("public_key".to_string()));
        }
        if self.token_endpoint.is_empty() {
            return Err(ConfigError::Missing("token_endpoint".to_string()));
        }

        for (name, value) in [("scope", &self.scope), ("aud", &self.aud), ("iss", &self.iss)] {
            if value.trim().is_empty() {
                return Err(ConfigError::Missing(name.to_string()));
            }
        }

        if self.request_timeout.is_zero() {
            return Err(ConfigError::InvalidValue(
                "request_timeout must be > 0".to_string(),
            ));
        }

        self.token_endpoint_url()?;
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// An invalid configuration value was provided.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// A required configuration value is missing.
    #[error("Missing required configuration: {0}")]
    Missing(String),
}
