//! Client configuration.
//!
//! An immutable value built once, validated once, and shared by reference
//! with every component that needs it. Nothing mutates it after
//! construction.
//!
//! # Example
//!
//! ```rust,ignore
//! use gatehouse_client::ClientConfig;
//! use std::time::Duration;
//!
//! let config = ClientConfig::new(
//!     "https://auth.example.com",
//!     "https://app.example.com/callback",
//! )?
//! .with_api_key("gh-live-123")
//! .with_timeout(Duration::from_secs(10))
//! .with_header("X-Client-Version", "1.4.2");
//! ```

use std::time::Duration;

use url::Url;

use crate::error::{ClientError, Result};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Immutable configuration for a [`GatehouseClient`](crate::GatehouseClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base address of the authentication service. Absolute, no trailing path
    /// requirements; endpoints are appended verbatim.
    pub base_url: Url,
    /// Where OAuth flows send the browser back to. Absolute.
    pub redirect_url: Url,
    /// Service API key, sent as `X-Api-Key` on every request when present.
    pub api_key: Option<String>,
    /// Per-request deadline. Must be positive.
    pub timeout: Duration,
    /// Extra headers attached to every request.
    pub extra_headers: Vec<(String, String)>,
    /// Whether `session()` may fall back to the stored access token when the
    /// cookie-based query fails with the recognized 422 signature.
    pub token_fallback: bool,
}

impl ClientConfig {
    /// Build a configuration from the two required URLs.
    ///
    /// Both URLs must be absolute `http`/`https` addresses.
    pub fn new(base_url: &str, redirect_url: &str) -> Result<Self> {
        Ok(Self {
            base_url: parse_absolute(base_url, "base URL")?,
            redirect_url: parse_absolute(redirect_url, "redirect URL")?,
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
            extra_headers: Vec::new(),
            token_fallback: true,
        })
    }

    /// Set the service API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the per-request timeout (default: 30s).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Attach an extra header to every request.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.push((name.into(), value.into()));
        self
    }

    /// Enable or disable the stored-token session fallback (default: enabled).
    pub fn with_token_fallback(mut self, enabled: bool) -> Self {
        self.token_fallback = enabled;
        self
    }

    /// Validate the assembled configuration. Called once at client
    /// construction; the value is immutable afterwards.
    pub fn validate(&self) -> Result<()> {
        if self.timeout.is_zero() {
            return Err(ClientError::Config("timeout must be positive".into()));
        }
        Ok(())
    }

    /// Absolute URL for a service endpoint such as `/graphql`.
    pub(crate) fn endpoint_url(&self, endpoint: &str) -> String {
        format!(
            "{}{}",
            self.base_url.as_str().trim_end_matches('/'),
            endpoint
        )
    }
}

fn parse_absolute(raw: &str, what: &str) -> Result<Url> {
    let url = Url::parse(raw)
        .map_err(|e| ClientError::Config(format!("{} is not an absolute URL: {}", what, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ClientError::Config(format!(
            "{} must use http or https, got {}",
            what, other
        ))),
    }
}
