//! The token handler.
//!
//! [`Handler`] ties configuration, credentials and the token client
//! together. It starts uninitialized; [`Handler::init`] loads the key and
//! certificate chain and builds the HTTP client, after which
//! [`Handler::create_access_token`] can be called any number of times,
//! concurrently if the handler is shared behind an `Arc`.
//!
//! ```ignore
//! let mut handler = Handler::new(config);
//! handler.init()?;
//! let token = handler.create_access_token().await?;
//! println!("{}", token.access_token);
//! ```

use tokio_util::sync::CancellationToken;

use crate::MaskinportenResult;
use crate::assertion::{AssertionClaims, SignedAssertion, sign_assertion};
use crate::config::HandlerConfig;
use crate::credentials::{CertificateChain, Credentials};
use crate::error::MaskinportenError;
use crate::exchange::{TokenClient, TokenResponse};

/// Loaded credentials plus the client that uses them.
#[derive(Debug)]
struct Ready {
    credentials: Credentials,
    client: TokenClient,
}

/// Issues assertions and exchanges them for access tokens.
#[derive(Debug)]
pub struct Handler {
    config: HandlerConfig,
    state: Option<Ready>,
}

impl Handler {
    /// Creates an uninitialized handler.
    #[must_use]
    pub fn new(config: HandlerConfig) -> Self {
        Self {
            config,
            state: None,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &HandlerConfig {
        &self.config
    }

    /// Returns `true` once [`init`](Self::init) has succeeded.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state.is_some()
    }

    /// Returns the loaded certificate chain, if initialized.
    #[must_use]
    pub fn certificate_chain(&self) -> Option<&CertificateChain> {
        self.state.as_ref().map(|ready| &ready.credentials.chain)
    }

    /// Validates the configuration, loads the key and certificate chain,
    /// and builds the HTTP client.
    ///
    /// Calling it again reloads everything. If a reload fails the handler
    /// keeps its previous state.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig`, `KeyRead`, `KeyParse`, `CertRead`,
    /// `CertParse` or `RequestBuild`.
    pub fn init(&mut self) -> MaskinportenResult<()> {
        self.config.validate()?;
        let endpoint = self.config.token_endpoint_url()?;

        let credentials = Credentials::load(&self.config.private_key, &self.config.public_key)?;
        let client = TokenClient::new(endpoint, self.config.request_timeout)?;

        tracing::info!(
            issuer = %self.config.iss,
            endpoint = %client.endpoint(),
            certificates = credentials.chain.len(),
            "Maskinporten handler initialized"
        );

        self.state = Some(Ready {
            credentials,
            client,
        });
        Ok(())
    }

    fn ready(&self) -> MaskinportenResult<&Ready> {
        self.state.as_ref().ok_or(MaskinportenError::NotInitialized)
    }

    /// Builds and signs a fresh assertion without contacting the server.
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` before `init`, or `Signing`.
    pub fn create_assertion(&self) -> MaskinportenResult<SignedAssertion> {
        let ready = self.ready()?;
        let claims = AssertionClaims::new(&self.config.scope, &self.config.aud, &self.config.iss);
        sign_assertion(
            &ready.credentials.signing_key,
            &ready.credentials.chain,
            &claims,
        )
    }

    /// Creates an assertion and exchanges it for an access token.
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` before `init`, otherwise the first error of
    /// the signing or exchange step.
    pub async fn create_access_token(&self) -> MaskinportenResult<TokenResponse> {
        let ready = self.ready()?;
        let assertion = self.create_assertion()?;
        ready.client.exchange(&assertion).await
    }

    /// Like [`create_access_token`](Self::create_access_token), but gives up
    /// with `Cancelled` as soon as `cancel` fires.
    ///
    /// # Errors
    ///
    /// Same as `create_access_token`, plus `Cancelled`.
    pub async fn create_access_token_with_cancel(
        &self,
        cancel: &CancellationToken,
    ) -> MaskinportenResult<TokenResponse> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                tracing::debug!("Token request cancelled");
                Err(MaskinportenError::Cancelled)
            }
            result = self.create_access_token() => result,
        }
    }
}
