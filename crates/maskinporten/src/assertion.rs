//! JWT assertion construction and signing.
//!
//! An assertion is a short-lived RS256 JWT that identifies the client to the
//! authorization server. The certificate chain goes into the `x5c` header
//! so the server can validate the signer without a separate key lookup.
//!
//! ```ignore
//! let claims = AssertionClaims::new("example:read", "https://maskinporten.no/", "client-id");
//! let assertion = sign_assertion(&credentials.signing_key, &credentials.chain, &claims)?;
//! ```

use std::fmt;

use jsonwebtoken::{Algorithm, Header};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::MaskinportenResult;
use crate::credentials::{CertificateChain, SigningKey};
use crate::error::MaskinportenError;

/// Lifetime of an assertion in seconds (`exp - iat`).
pub const ASSERTION_LIFETIME_SECS: i64 = 120;

/// Claims carried by a JWT-Bearer assertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionClaims {
    /// Space-separated scopes requested.
    pub scope: String,

    /// Audience (the authorization server).
    pub aud: String,

    /// Issuer (the client identifier).
    pub iss: String,

    /// Unique assertion identifier, used by the server to reject replays.
    pub jti: String,

    /// Expiration time (Unix timestamp).
    pub exp: i64,

    /// Issued at (Unix timestamp).
    pub iat: i64,
}

impl AssertionClaims {
    /// Creates claims issued now with a fresh `jti`.
    #[must_use]
    pub fn new(scope: impl Into<String>, aud: impl Into<String>, iss: impl Into<String>) -> Self {
        Self::issued_at(scope, aud, iss, OffsetDateTime::now_utc())
    }

    /// Creates claims issued at the given instant with a fresh `jti`.
    #[must_use]
    pub fn issued_at(
        scope: impl Into<String>,
        aud: impl Into<String>,
        iss: impl Into<String>,
        issued_at: OffsetDateTime,
    ) -> Self {
        let iat = issued_at.unix_timestamp();
        Self {
            scope: scope.into(),
            aud: aud.into(),
            iss: iss.into(),
            jti: uuid::Uuid::new_v4().to_string(),
            exp: iat + ASSERTION_LIFETIME_SECS,
            iat,
        }
    }
}

/// A signed assertion in compact serialization.
///
/// Meant to be sent once and dropped. `Debug` does not print the token.
#[derive(Clone)]
pub struct SignedAssertion {
    token: String,
    jti: String,
    expires_at: i64,
}

impl SignedAssertion {
    /// Returns the compact JWT.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.token
    }

    /// Returns the `jti` of this assertion.
    #[must_use]
    pub fn jti(&self) -> &str {
        &self.jti
    }

    /// Returns the `exp` claim (Unix timestamp).
    #[must_use]
    pub fn expires_at(&self) -> i64 {
        self.expires_at
    }

    /// Consumes the assertion and returns the compact JWT.
    #[must_use]
    pub fn into_string(self) -> String {
        self.token
    }
}

impl fmt::Debug for SignedAssertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignedAssertion")
            .field("jti", &self.jti)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

/// Signs `claims` with RS256, embedding `chain` as the `x5c` header.
///
/// # Errors
///
/// Returns `Signing` if the signature cannot be computed.
pub fn sign_assertion(
    key: &SigningKey,
    chain: &CertificateChain,
    claims: &AssertionClaims,
) -> MaskinportenResult<SignedAssertion> {
    let mut header = Header::new(Algorithm::RS256);
    header.x5c = Some(chain.to_x5c());

    let token = jsonwebtoken::encode(&header, claims, key.encoding_key())
        .map_err(MaskinportenError::Signing)?;

    tracing::trace!(jti = %claims.jti, exp = claims.exp, "Signed assertion");

    Ok(SignedAssertion {
        token,
        jti: claims.jti.clone(),
        expires_at: claims.exp,
    })
}
