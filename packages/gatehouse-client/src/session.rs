//! Session resolution.
//!
//! "What is the current session?" has two answers: the cookie the service
//! set during an interactive sign-in, or the access token this process
//! stored after its own authentication call. The resolver tries the cookie
//! first and falls back to the stored token only on the recognized
//! cookie-identity failure class:
//!
//! `TryCookie → {Resolved, TryTokenFallback}`,
//! `TryTokenFallback → {Resolved, Failed}`.
//!
//! On any non-recognized failure, or when no fallback is available, the
//! original cookie-query errors are returned unchanged.

use tracing::debug;

use crate::error::Result;
use crate::graphql;
use crate::normalize::{normalize, CROSS_DOMAIN_HINT};
use crate::result::{ApiResult, ErrorDetail};
use crate::tokens::TokenStore;
use crate::transport::Transport;
use crate::types::Session;

pub(crate) struct SessionResolver<'a> {
    transport: &'a Transport,
    tokens: &'a TokenStore,
    token_fallback: bool,
}

impl<'a> SessionResolver<'a> {
    pub fn new(transport: &'a Transport, tokens: &'a TokenStore, token_fallback: bool) -> Self {
        Self {
            transport,
            tokens,
            token_fallback,
        }
    }

    /// Automatic variant: cookie first, stored-token fallback on the
    /// recognized failure class.
    pub async fn resolve(&self) -> Result<ApiResult<Session>> {
        let raw = self
            .transport
            .graphql(graphql::CURRENT_SESSION, None, None)
            .await?;
        let cookie_result =
            normalize::<graphql::SessionData>(raw.status, &raw.body).map(|data| data.session);

        let errors = match cookie_result {
            ApiResult::Ok(session) => return Ok(ApiResult::Ok(session)),
            ApiResult::Err(errors) => errors,
        };

        if !self.token_fallback || !is_cookie_identity_failure(&errors) {
            return Ok(ApiResult::Err(errors));
        }
        let Some(token) = self.tokens.access_token().filter(|t| !t.is_empty()) else {
            debug!("Cookie session failed and no stored access token, not falling back");
            return Ok(ApiResult::Err(errors));
        };

        debug!("Cookie session failed with identity signature, trying stored access token");
        match self.validate_token(&token).await? {
            Some(mut session) => {
                // Token fields come from the store, not the profile response.
                session.refresh_token = self.tokens.refresh_token();
                Ok(ApiResult::Ok(session))
            }
            None => Ok(ApiResult::Err(errors)),
        }
    }

    /// Explicit variant: validate exactly the token the caller supplied.
    /// Never consults the store.
    pub async fn resolve_with_token(&self, token: &str) -> Result<ApiResult<Session>> {
        let raw = self.transport.graphql(graphql::VIEWER, None, Some(token)).await?;
        match normalize::<graphql::ViewerData>(raw.status, &raw.body) {
            ApiResult::Ok(graphql::ViewerData { viewer: Some(user) }) => {
                Ok(ApiResult::Ok(Session {
                    access_token: token.to_string(),
                    refresh_token: None,
                    id_token: None,
                    expires_in: None,
                    user,
                }))
            }
            ApiResult::Ok(graphql::ViewerData { viewer: None }) => Ok(ApiResult::Err(vec![
                ErrorDetail::new(
                    "Authentication failed. Check your credentials and try again.",
                )
                .with_code("Unauthorized"),
            ])),
            ApiResult::Err(errors) => Ok(ApiResult::Err(errors)),
        }
    }

    /// Profile lookup with a bearer token, synthesizing a session view on
    /// success. `None` means the token did not resolve a user.
    async fn validate_token(&self, token: &str) -> Result<Option<Session>> {
        let raw = self.transport.graphql(graphql::VIEWER, None, Some(token)).await?;
        match normalize::<graphql::ViewerData>(raw.status, &raw.body) {
            ApiResult::Ok(graphql::ViewerData { viewer: Some(user) }) => Ok(Some(Session {
                access_token: token.to_string(),
                refresh_token: None,
                id_token: None,
                expires_in: None,
                user,
            })),
            _ => Ok(None),
        }
    }
}

/// Does this error list look like "could not establish identity from request
/// cookies"? Matches the service's 422 signature in any of the shapes the
/// normalizer produces.
pub(crate) fn is_cookie_identity_failure(errors: &[ErrorDetail]) -> bool {
    errors.iter().any(|error| {
        error.code.as_deref() == Some("UnprocessableEntity")
            || error.message == CROSS_DOMAIN_HINT
            || error.message.contains("422")
            || error.message.contains("Unprocessable")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_matches_code() {
        let errors = vec![ErrorDetail::new("anything").with_code("UnprocessableEntity")];
        assert!(is_cookie_identity_failure(&errors));
    }

    #[test]
    fn test_signature_matches_hint_message() {
        let errors = vec![ErrorDetail::new(CROSS_DOMAIN_HINT)];
        assert!(is_cookie_identity_failure(&errors));
    }

    #[test]
    fn test_signature_matches_raw_422_text() {
        let errors = vec![ErrorDetail::new("upstream said 422, giving up")];
        assert!(is_cookie_identity_failure(&errors));

        let errors = vec![ErrorDetail::new("Unprocessable Entity")];
        assert!(is_cookie_identity_failure(&errors));
    }

    #[test]
    fn test_signature_rejects_ordinary_failures() {
        let errors = vec![
            ErrorDetail::new("Authentication failed.").with_code("Unauthorized"),
            ErrorDetail::new("wrong password"),
        ];
        assert!(!is_cookie_identity_failure(&errors));
    }

    #[test]
    fn test_signature_any_error_suffices() {
        let errors = vec![
            ErrorDetail::new("wrong password"),
            ErrorDetail::new("status 422"),
        ];
        assert!(is_cookie_identity_failure(&errors));
    }
}
