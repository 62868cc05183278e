//! # maskinporten
//!
//! OAuth 2.0 JWT-Bearer assertion grant client for Maskinporten-style
//! authorization servers.
//!
//! A client holding an RSA private key and its X.509 certificate chain signs
//! a short-lived JWT assertion (with the chain in the `x5c` header) and
//! exchanges it at the token endpoint for an access token.
//!
//! ## Modules
//!
//! - [`config`] - Handler configuration value object
//! - [`credentials`] - Private key and certificate chain loading
//! - [`assertion`] - Assertion claims and RS256 signing
//! - [`exchange`] - Token endpoint client
//! - [`handler`] - The handler tying it all together
//! - [`error`] - Error types
//!
//! ## Example
//!
//! ```ignore
//! use maskinporten::{Handler, HandlerConfig};
//!
//! let config = HandlerConfig::new(
//!     "key.pem",
//!     "cert.pem",
//!     "https://maskinporten.no/token",
//!     "example:read",
//!     "https://maskinporten.no/",
//!     "my-client-id",
//! );
//!
//! let mut handler = Handler::new(config);
//! handler.init()?;
//! let token = handler.create_access_token().await?;
//! ```

pub mod assertion;
pub mod config;
pub mod credentials;
pub mod error;
pub mod exchange;
pub mod handler;

pub use assertion::{ASSERTION_LIFETIME_SECS, AssertionClaims, SignedAssertion, sign_assertion};
pub use config::{ConfigError, DEFAULT_REQUEST_TIMEOUT, HandlerConfig};
pub use credentials::{CertificateChain, Credentials, SigningKey};
pub use error::{ErrorCategory, MaskinportenError};
pub use exchange::{JWT_BEARER_GRANT_TYPE, TokenClient, TokenResponse};
pub use handler::Handler;

/// Type alias for results of this crate.
pub type MaskinportenResult<T> = Result<T, MaskinportenError>;
