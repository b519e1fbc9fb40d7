//! Service-valued results.
//!
//! Any condition where the service responded coherently but signaled failure
//! (validation, auth, not-found) is carried in [`ApiResult`], never raised.
//! Transport-tier failures live in [`ClientError`](crate::ClientError).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Outcome of a service call: a value, or an ordered list of service errors.
///
/// Exactly one variant is populated; "success" means errors are absent.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResult<T> {
    /// The service produced a value.
    Ok(T),
    /// The service answered but signaled failure.
    Err(Vec<ErrorDetail>),
}

impl<T> ApiResult<T> {
    /// True when the service produced a value.
    pub fn is_ok(&self) -> bool {
        matches!(self, ApiResult::Ok(_))
    }

    /// True when the service signaled failure.
    pub fn is_err(&self) -> bool {
        matches!(self, ApiResult::Err(_))
    }

    /// The value, if any.
    pub fn ok(self) -> Option<T> {
        match self {
            ApiResult::Ok(value) => Some(value),
            ApiResult::Err(_) => None,
        }
    }

    /// The service errors; empty on success.
    pub fn errors(&self) -> &[ErrorDetail] {
        match self {
            ApiResult::Ok(_) => &[],
            ApiResult::Err(errors) => errors,
        }
    }

    /// Map the success value, leaving errors untouched.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResult<U> {
        match self {
            ApiResult::Ok(value) => ApiResult::Ok(f(value)),
            ApiResult::Err(errors) => ApiResult::Err(errors),
        }
    }

    /// Convert into a standard `Result`.
    pub fn into_result(self) -> std::result::Result<T, Vec<ErrorDetail>> {
        match self {
            ApiResult::Ok(value) => Ok(value),
            ApiResult::Err(errors) => Err(errors),
        }
    }
}

/// One structured service error.
///
/// Used for branching and display only; not an identity key. `message` is
/// always present, `code` is the machine-readable discriminator when the
/// service supplies one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Map<String, Value>>,
}

impl ErrorDetail {
    /// Create an error with only a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
            path: None,
            extensions: None,
        }
    }

    /// Attach a machine-readable code.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}
