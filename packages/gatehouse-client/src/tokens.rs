//! In-memory token store.
//!
//! Holds the most recent access/refresh token pair as a best-effort fallback
//! identity source. Last-write-wins, process-lifetime only, never persisted.
//! Writes are whole-value overwrites; there is no read-modify-write, so no
//! versioning is needed under concurrent authentication calls.

use std::sync::{PoisonError, RwLock};

/// The credential pair owned by the store.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

/// In-memory holder for the most recent credentials.
#[derive(Debug, Default)]
pub struct TokenStore {
    inner: RwLock<Credentials>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the access token.
    pub fn set_access_token(&self, token: impl Into<String>) {
        self.write().access_token = Some(token.into());
    }

    /// The current access token, if any.
    pub fn access_token(&self) -> Option<String> {
        self.read().access_token.clone()
    }

    /// Overwrite the refresh token.
    pub fn set_refresh_token(&self, token: impl Into<String>) {
        self.write().refresh_token = Some(token.into());
    }

    /// The current refresh token, if any.
    pub fn refresh_token(&self) -> Option<String> {
        self.read().refresh_token.clone()
    }

    /// Replace both tokens at once.
    pub fn store(&self, access_token: Option<String>, refresh_token: Option<String>) {
        *self.write() = Credentials {
            access_token,
            refresh_token,
        };
    }

    /// Drop both tokens.
    pub fn clear_all(&self) {
        *self.write() = Credentials::default();
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Credentials> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Credentials> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}
