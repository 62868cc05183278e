//! Error types for the assertion grant pipeline.
//!
//! Every failure the core can produce is a [`MaskinportenError`]. Each variant
//! names the stage that failed and keeps the underlying cause, so a caller can
//! diagnose a failure from the message alone.

use std::fmt;
use std::path::PathBuf;

use crate::config::ConfigError;

/// Errors that can occur while loading credentials or fetching a token.
#[derive(Debug, thiserror::Error)]
pub enum MaskinportenError {
    /// The private key file could not be read.
    #[error("Failed to read private key file {}: {source}", .path.display())]
    KeyRead {
        /// Path of the private key file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The private key file is not a usable PEM-encoded RSA private key.
    #[error("Failed to parse private key: {message}")]
    KeyParse {
        /// Description of the parse failure.
        message: String,
    },

    /// The certificate file could not be read.
    #[error("Failed to read certificate file {}: {source}", .path.display())]
    CertRead {
        /// Path of the certificate file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The certificate file could not be converted to an `x5c` chain.
    #[error("Failed to parse certificate chain: {message}")]
    CertParse {
        /// Description of the parse failure.
        message: String,
    },

    /// Computing the assertion signature failed.
    #[error("Failed to create signed assertion: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    /// The token request or the HTTP client could not be built.
    #[error("Failed to build token request: {message}")]
    RequestBuild {
        /// Description of the build failure.
        message: String,
    },

    /// The token request failed at the transport level (DNS, TLS, connect, timeout).
    #[error("Token request failed: {0}")]
    Request(#[source] reqwest::Error),

    /// The token endpoint answered with a status other than 200.
    #[error(
        "Token endpoint returned status {status}, expected 200. Response body was: {}",
        String::from_utf8_lossy(.body)
    )]
    TokenEndpoint {
        /// HTTP status code.
        status: u16,
        /// Response body exactly as received.
        body: Vec<u8>,
    },

    /// The 200 response body is not a valid token response.
    #[error("Failed to decode token response: {0}")]
    ResponseDecode(#[source] serde_json::Error),

    /// A token was requested before the handler was initialized.
    #[error("Handler is not initialized: call init() before requesting tokens")]
    NotInitialized,

    /// The handler configuration is invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// The caller cancelled the token request.
    #[error("Token request was cancelled")]
    Cancelled,
}

impl MaskinportenError {
    /// Creates a new `KeyParse` error.
    #[must_use]
    pub fn key_parse(message: impl Into<String>) -> Self {
        Self::KeyParse {
            message: message.into(),
        }
    }

    /// Creates a new `CertParse` error.
    #[must_use]
    pub fn cert_parse(message: impl Into<String>) -> Self {
        Self::CertParse {
            message: message.into(),
        }
    }

    /// Creates a new `RequestBuild` error.
    #[must_use]
    pub fn request_build(message: impl Into<String>) -> Self {
        Self::RequestBuild {
            message: message.into(),
        }
    }

    /// Creates a new `TokenEndpoint` error.
    #[must_use]
    pub fn token_endpoint(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self::TokenEndpoint {
            status,
            body: body.into(),
        }
    }

    /// Returns `true` if loading the key or the certificate chain failed.
    #[must_use]
    pub fn is_credential_error(&self) -> bool {
        matches!(
            self,
            Self::KeyRead { .. } | Self::KeyParse { .. } | Self::CertRead { .. } | Self::CertParse { .. }
        )
    }

    /// Returns `true` if the token request never got an HTTP response.
    #[must_use]
    pub fn is_transport_error(&self) -> bool {
        matches!(self, Self::Request(_))
    }

    /// Returns `true` if the request failed because the timeout elapsed.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Request(e) if e.is_timeout())
    }

    /// Returns the HTTP status for `TokenEndpoint` errors.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::TokenEndpoint { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the response body of a `TokenEndpoint` error as text, if it
    /// is valid UTF-8.
    #[must_use]
    pub fn response_body(&self) -> Option<&str> {
        match self {
            Self::TokenEndpoint { body, .. } => std::str::from_utf8(body).ok(),
            _ => None,
        }
    }

    /// Returns the error category for logging purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::KeyRead { .. } => ErrorCategory::Credentials,
            Self::KeyParse { .. } => ErrorCategory::Credentials,
            Self::CertRead { .. } => ErrorCategory::Credentials,
            Self::CertParse { .. } => ErrorCategory::Credentials,
            Self::Signing(_) => ErrorCategory::Signing,
            Self::RequestBuild { .. } => ErrorCategory::Configuration,
            Self::Request(_) => ErrorCategory::Transport,
            Self::TokenEndpoint { .. } => ErrorCategory::Protocol,
            Self::ResponseDecode(_) => ErrorCategory::Protocol,
            Self::NotInitialized => ErrorCategory::State,
            Self::InvalidConfig(_) => ErrorCategory::Configuration,
            Self::Cancelled => ErrorCategory::State,
        }
    }
}

/// Categories of errors for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Reading or parsing the key or certificate files.
    Credentials,
    /// Producing the assertion signature.
    Signing,
    /// Network-level failures talking to the token endpoint.
    Transport,
    /// The token endpoint answered, but not with a usable token.
    Protocol,
    /// Invalid configuration.
    Configuration,
    /// Handler lifecycle misuse or cancellation.
    State,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Credentials => write!(f, "credentials"),
            Self::Signing => write!(f, "signing"),
            Self::Transport => write!(f, "transport"),
            Self::Protocol => write!(f, "protocol"),
            Self::Configuration => write!(f, "configuration"),
            Self::State => write!(f, "state"),
        }
    }
}
