//! Token endpoint client.
//!
//! Posts a signed assertion to the token endpoint as a JWT-Bearer grant
//! (RFC 7523 §2.1) and decodes the JSON token response.
//!
//! # Wire format
//!
//! ```text
//! POST /token HTTP/1.1
//! Content-Type: application/x-www-form-urlencoded
//!
//! grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer&assertion=<jwt>
//! ```
//!
//! Only status 200 is a success. Any other status is surfaced with the body
//! bytes as received; authorization servers put their diagnostics there.

use std::fmt;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::MaskinportenResult;
use crate::assertion::SignedAssertion;
use crate::error::MaskinportenError;

/// The JWT-Bearer grant type.
pub const JWT_BEARER_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// A successful token endpoint response.
///
/// Unknown fields are ignored and missing fields default to empty/zero.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenResponse {
    /// The access token.
    pub access_token: String,

    /// Lifetime of the access token in seconds.
    pub expires_in: i64,

    /// Scopes granted.
    pub scope: String,
}

impl fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"[REDACTED]")
            .field("expires_in", &self.expires_in)
            .field("scope", &self.scope)
            .finish()
    }
}

/// HTTP client bound to one token endpoint.
///
/// Cheap to share: the inner `reqwest::Client` pools connections and is
/// safe to use from concurrent tasks.
#[derive(Debug, Clone)]
pub struct TokenClient {
    http_client: reqwest::Client,
    endpoint: Url,
}

impl TokenClient {
    /// Creates a client for `endpoint` with a per-request `timeout`.
    ///
    /// # Errors
    ///
    /// Returns `RequestBuild` if the HTTP client cannot be constructed.
    pub fn new(endpoint: Url, timeout: Duration) -> MaskinportenResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                MaskinportenError::request_build(format!("failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            http_client,
            endpoint,
        })
    }

    /// Returns the token endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Exchanges `assertion` for an access token.
    ///
    /// # Errors
    ///
    /// - `Request` if the request fails before a response arrives, or the
    ///   body cannot be read
    /// - `TokenEndpoint` if the status is not 200
    /// - `ResponseDecode` if a 200 body is not a token response
    pub async fn exchange(&self, assertion: &SignedAssertion) -> MaskinportenResult<TokenResponse> {
        tracing::debug!(
            endpoint = %self.endpoint,
            jti = %assertion.jti(),
            "Requesting access token"
        );

        let response = self
            .http_client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .header(ACCEPT, "application/json")
            .body(form_body(assertion))
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(endpoint = %self.endpoint, error = %e, "Token request failed");
                if e.is_builder() {
                    MaskinportenError::request_build(e.to_string())
                } else {
                    MaskinportenError::Request(e)
                }
            })?;

        // Reading the whole body releases the connection back to the pool on
        // every path below.
        let status = response.status();
        let body = response.bytes().await.map_err(MaskinportenError::Request)?;

        if status != StatusCode::OK {
            tracing::warn!(
                endpoint = %self.endpoint,
                status = status.as_u16(),
                "Token endpoint rejected the assertion"
            );
            return Err(MaskinportenError::token_endpoint(status.as_u16(), body.to_vec()));
        }

        let token: TokenResponse =
            serde_json::from_slice(&body).map_err(MaskinportenError::ResponseDecode)?;

        tracing::debug!(
            expires_in = token.expires_in,
            scope = %token.scope,
            "Received access token"
        );

        Ok(token)
    }
}

/// Encodes the grant form body.
fn form_body(assertion: &SignedAssertion) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .append_pair("grant_type", JWT_BEARER_GRANT_TYPE)
        .append_pair("assertion", assertion.as_str())
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assertion::{AssertionClaims, sign_assertion};
    use crate::credentials::{CertificateChain, SigningKey};

    fn assertion() -> SignedAssertion {
        let key =
            SigningKey::from_pem(include_bytes!("../tests/fixtures/client_key_pkcs8.pem")).unwrap();
        let chain =
            CertificateChain::from_pem(include_bytes!("../tests/fixtures/client_cert.pem")).unwrap();
        sign_assertion(&key, &chain, &AssertionClaims::new("s", "a", "i")).unwrap()
    }

    #[test]
    fn test_form_body() {
        let assertion = assertion();
        let body = form_body(&assertion);
        assert_eq!(
            body,
            format!(
                "grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer&assertion={}",
                assertion.as_str()
            )
        );
    }

    #[test]
    fn test_token_response_decoding() {
        let json = r#"{"access_token":"abc","expires_in":120,"scope":"x","token_type":"Bearer"}"#;
        let token: TokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(token.access_token, "abc");
        assert_eq!(token.expires_in, 120);
        assert_eq!(token.scope, "x");
    }

    #[test]
    fn test_token_response_missing_fields_default() {
        let token: TokenResponse = serde_json::from_str(r#"{"access_token":"abc"}"#).unwrap();
        assert_eq!(token.access_token, "abc");
        assert_eq!(token.expires_in, 0);
        assert_eq!(token.scope, "");

        assert!(serde_json::from_str::<TokenResponse>(r#"{"expires_in":"soon"}"#).is_err());
        assert!(serde_json::from_str::<TokenResponse>("not json").is_err());
    }

    #[test]
    fn test_token_response_debug_redacts_token() {
        let token = TokenResponse {
            access_token: "secret-token".to_string(),
            expires_in: 120,
            scope: "x".to_string(),
        };
        let debug = format!("{token:?}");
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_client_keeps_endpoint() {
        let endpoint = Url::parse("https://maskinporten.example/token").unwrap();
        let client = TokenClient::new(endpoint.clone(), Duration::from_secs(30)).unwrap();
        assert_eq!(client.endpoint(), &endpoint);
    }
}
