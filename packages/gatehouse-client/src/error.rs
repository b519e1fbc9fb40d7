//! Raised errors for the Gatehouse client.
//!
//! These errors cover the transport tier only: conditions where the
//! operation could not be carried out at all. A response the service
//! actually produced, even a refusal, is never a `ClientError`; it is
//! carried in [`ApiResult`](crate::ApiResult) instead.

use thiserror::Error;

/// Result type for Gatehouse client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors raised when an operation cannot be carried out.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Configuration error (invalid base URL, bad header value)
    #[error("configuration error: {0}")]
    Config(String),

    /// Caller misuse (empty required token or argument), checked before any I/O
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Connection-level failure (DNS, refused, reset)
    #[error("network error: {0}")]
    Network(String),

    /// Configured deadline exceeded
    #[error("request timed out")]
    Timeout,

    /// Response could not be read or decoded at the transport level
    #[error("malformed response: {0}")]
    Malformed(String),

    /// Operation was cancelled
    #[error("operation cancelled")]
    Cancelled,
}
