//! Async client for the Gatehouse authentication service.
//!
//! Wraps the service's HTTP/GraphQL API behind one facade. Every operation
//! is single-shot (no hidden retries) and returns a two-tier outcome:
//! a coherent refusal from the service is an [`ApiResult::Err`] value you
//! branch on, while "could not reach or understand the service" is a raised
//! [`ClientError`].
//!
//! # Example
//!
//! ```rust,ignore
//! use gatehouse_client::{ClientConfig, GatehouseClient};
//!
//! let config = ClientConfig::new(
//!     "https://auth.example.com",
//!     "https://app.example.com/callback",
//! )?;
//! let client = GatehouseClient::new(config)?;
//!
//! match client.sign_in("ada@example.com", "hunter2").await? {
//!     ApiResult::Ok(session) => println!("signed in as {}", session.user.email),
//!     ApiResult::Err(errors) => eprintln!("refused: {}", errors[0].message),
//! }
//!
//! // Later: cookie first, stored-token fallback on cross-domain cookie loss.
//! let session = client.session().await?;
//! ```
//!
//! # Cancellation
//!
//! The stateful operations have `*_with_cancel` variants taking a
//! `CancellationToken`; cancelling aborts the in-flight HTTP call and fails
//! with [`ClientError::Cancelled`]. Token-store writes happen strictly after
//! the awaited call completes, so a cancelled operation never partially
//! updates credentials.

pub mod config;
pub mod error;
pub mod normalize;
pub mod result;
pub mod tokens;
pub mod transport;
pub mod types;

mod graphql;
mod session;

pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use normalize::{normalize, CROSS_DOMAIN_HINT};
pub use result::{ApiResult, ErrorDetail};
pub use tokens::{Credentials, TokenStore};
pub use transport::{RawResponse, Transport};
pub use types::{AuthorizePayload, OauthTokens, Session, SignUpInput, UserProfile};

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use session::SessionResolver;

/// Client facade for the Gatehouse authentication service.
///
/// Cheap to clone; clones share the same token store and connection pool.
#[derive(Debug, Clone)]
pub struct GatehouseClient {
    transport: Transport,
    tokens: Arc<TokenStore>,
    config: Arc<ClientConfig>,
}

impl GatehouseClient {
    /// Build a client from a configuration, validating it once.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let config = Arc::new(config);
        Ok(Self {
            transport: Transport::new(config.clone())?,
            tokens: Arc::new(TokenStore::new()),
            config,
        })
    }

    /// The token store backing this client's fallback identity.
    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Register a new account. On success the returned tokens are stored.
    pub async fn sign_up(&self, input: SignUpInput) -> Result<ApiResult<Session>> {
        if input.email.trim().is_empty() || input.password.is_empty() {
            return Err(ClientError::InvalidArgument(
                "email and password are required".into(),
            ));
        }

        let raw = self
            .transport
            .graphql(
                graphql::SIGN_UP,
                Some(graphql::sign_up_variables(&input)),
                None,
            )
            .await?;
        let result =
            normalize::<graphql::SignUpData>(raw.status, &raw.body).map(|data| data.sign_up);
        self.remember_session(&result);
        Ok(result)
    }

    /// Sign-up with cooperative cancellation.
    pub async fn sign_up_with_cancel(
        &self,
        input: SignUpInput,
        cancel: CancellationToken,
    ) -> Result<ApiResult<Session>> {
        tokio::select! {
            result = self.sign_up(input) => result,
            _ = cancel.cancelled() => Err(ClientError::Cancelled),
        }
    }

    /// Authenticate with email and password. On success the returned tokens
    /// are stored.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<ApiResult<Session>> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(ClientError::InvalidArgument(
                "email and password are required".into(),
            ));
        }

        let raw = self
            .transport
            .graphql(
                graphql::SIGN_IN,
                Some(graphql::sign_in_variables(email, password)),
                None,
            )
            .await?;
        let result =
            normalize::<graphql::SignInData>(raw.status, &raw.body).map(|data| data.sign_in);
        self.remember_session(&result);
        Ok(result)
    }

    /// Sign-in with cooperative cancellation.
    pub async fn sign_in_with_cancel(
        &self,
        email: &str,
        password: &str,
        cancel: CancellationToken,
    ) -> Result<ApiResult<Session>> {
        tokio::select! {
            result = self.sign_in(email, password) => result,
            _ = cancel.cancelled() => Err(ClientError::Cancelled),
        }
    }

    /// End the current session. On success the stored tokens are cleared.
    pub async fn sign_out(&self) -> Result<ApiResult<bool>> {
        let bearer = self.tokens.access_token();
        let raw = self
            .transport
            .graphql(graphql::SIGN_OUT, None, bearer.as_deref())
            .await?;
        let result =
            normalize::<graphql::SignOutData>(raw.status, &raw.body).map(|data| data.sign_out);
        if result.is_ok() {
            self.tokens.clear_all();
            info!("Signed out, credentials cleared");
        }
        Ok(result)
    }

    /// Resolve the current session: cookie identification first, stored-token
    /// fallback on the recognized cookie-identity failure (when enabled in
    /// the configuration).
    pub async fn session(&self) -> Result<ApiResult<Session>> {
        SessionResolver::new(&self.transport, &self.tokens, self.config.token_fallback)
            .resolve()
            .await
    }

    /// Session resolution with cooperative cancellation.
    pub async fn session_with_cancel(
        &self,
        cancel: CancellationToken,
    ) -> Result<ApiResult<Session>> {
        tokio::select! {
            result = self.session() => result,
            _ = cancel.cancelled() => Err(ClientError::Cancelled),
        }
    }

    /// Validate exactly the supplied access token and synthesize a session
    /// view from the profile it resolves. Never consults the token store.
    pub async fn session_with_token(&self, token: &str) -> Result<ApiResult<Session>> {
        if token.trim().is_empty() {
            return Err(ClientError::InvalidArgument(
                "access token must not be empty".into(),
            ));
        }
        SessionResolver::new(&self.transport, &self.tokens, false)
            .resolve_with_token(token)
            .await
    }

    /// Fetch the profile behind a bearer token; falls back to the stored
    /// access token when none is supplied.
    pub async fn profile(&self, bearer: Option<&str>) -> Result<ApiResult<UserProfile>> {
        let stored;
        let bearer = match bearer {
            Some(token) => Some(token),
            None => {
                stored = self.tokens.access_token();
                stored.as_deref()
            }
        };
        let raw = self.transport.graphql(graphql::VIEWER, None, bearer).await?;
        Ok(
            normalize::<graphql::ViewerData>(raw.status, &raw.body)
                .map(|data| data.viewer.unwrap_or_default()),
        )
    }

    /// Start a provider OAuth flow: `POST /oauth/authorize` with the
    /// configured redirect URL.
    pub async fn oauth_authorize(&self, provider: &str) -> Result<ApiResult<AuthorizePayload>> {
        if provider.trim().is_empty() {
            return Err(ClientError::InvalidArgument(
                "provider must not be empty".into(),
            ));
        }
        let redirect = self.config.redirect_url.to_string();
        let raw = self
            .transport
            .form_post(
                "/oauth/authorize",
                &[("provider", provider), ("redirect_uri", redirect.as_str())],
                None,
            )
            .await?;
        Ok(normalize::<AuthorizePayload>(raw.status, &raw.body))
    }

    /// Exchange an authorization code for tokens: `POST /oauth/token`. On
    /// success the returned tokens are stored.
    pub async fn oauth_token(&self, code: &str) -> Result<ApiResult<OauthTokens>> {
        if code.trim().is_empty() {
            return Err(ClientError::InvalidArgument(
                "authorization code must not be empty".into(),
            ));
        }
        let redirect = self.config.redirect_url.to_string();
        let raw = self
            .transport
            .form_post(
                "/oauth/token",
                &[
                    ("grant_type", "authorization_code"),
                    ("code", code),
                    ("redirect_uri", redirect.as_str()),
                ],
                None,
            )
            .await?;
        let result = normalize::<OauthTokens>(raw.status, &raw.body);
        self.remember_oauth(&result);
        Ok(result)
    }

    /// Exchange a refresh token for a fresh token pair: `POST /oauth/token`
    /// with `grant_type=refresh_token`. On success the returned tokens are
    /// stored.
    pub async fn refresh_session(&self, refresh_token: &str) -> Result<ApiResult<OauthTokens>> {
        if refresh_token.trim().is_empty() {
            return Err(ClientError::InvalidArgument(
                "refresh token must not be empty".into(),
            ));
        }
        let raw = self
            .transport
            .form_post(
                "/oauth/token",
                &[
                    ("grant_type", "refresh_token"),
                    ("refresh_token", refresh_token),
                ],
                None,
            )
            .await?;
        let result = normalize::<OauthTokens>(raw.status, &raw.body);
        self.remember_oauth(&result);
        Ok(result)
    }

    /// Store the tokens from a successful session response. Writes are
    /// whole-value overwrites after the call has completed.
    fn remember_session(&self, result: &ApiResult<Session>) {
        if let ApiResult::Ok(session) = result {
            if !session.access_token.is_empty() {
                self.tokens.store(
                    Some(session.access_token.clone()),
                    session.refresh_token.clone(),
                );
                info!(user = %session.user.id, "Authenticated, credentials stored");
            }
        }
    }

    /// Store the tokens from a successful OAuth exchange.
    fn remember_oauth(&self, result: &ApiResult<OauthTokens>) {
        if let ApiResult::Ok(tokens) = result {
            if !tokens.access_token.is_empty() {
                self.tokens.store(
                    Some(tokens.access_token.clone()),
                    tokens.refresh_token.clone(),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> GatehouseClient {
        let config =
            ClientConfig::new("https://auth.example.com", "https://app.example.com/cb").unwrap();
        GatehouseClient::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_sign_in_rejects_empty_credentials() {
        let client = test_client();
        let err = client.sign_in("", "pw").await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidArgument(_)));

        let err = client.sign_in("a@b.c", "").await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_session_with_token_rejects_empty_token() {
        let client = test_client();
        let err = client.session_with_token("  ").await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_oauth_token_rejects_empty_code() {
        let client = test_client();
        let err = client.oauth_token("").await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidArgument(_)));
    }

    #[test]
    fn test_invalid_timeout_rejected_at_construction() {
        let config =
            ClientConfig::new("https://auth.example.com", "https://app.example.com/cb")
                .unwrap()
                .with_timeout(std::time::Duration::ZERO);
        assert!(GatehouseClient::new(config).is_err());
    }

    #[test]
    fn test_clones_share_token_store() {
        let client = test_client();
        let clone = client.clone();
        client.tokens().set_access_token("at-1");
        assert_eq!(clone.tokens().access_token().as_deref(), Some("at-1"));
    }
}
