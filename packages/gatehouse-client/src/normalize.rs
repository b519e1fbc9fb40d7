//! Response normalization.
//!
//! Converts a raw HTTP status + body into one uniform [`ApiResult`]. The
//! service speaks two success shapes (the GraphQL `{"data": …, "errors": …}`
//! envelope and bare JSON objects) and several failure shapes; this module is
//! the single place that decides between them, producing a tagged union
//! immediately instead of shape-probing at call sites.
//!
//! [`normalize`] is pure: identical `(status, body)` inputs always yield
//! equal results, and it never panics or raises.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use crate::result::{ApiResult, ErrorDetail};

/// Fixed replacement message for every 422 error.
///
/// The service signals "could not establish identity from request cookies"
/// with a generic 422, indistinguishable from ordinary validation failures.
/// Every 422 message is overwritten with this hint; the original detail is
/// deliberately lost in exchange for an actionable message.
pub const CROSS_DOMAIN_HINT: &str = "The authentication service could not read a session cookie \
from this request (HTTP 422 Unprocessable). When the client and the service run on different \
domains, browsers withhold the session cookie; sign in again on this domain or validate the \
session with a bearer token.";

/// Normalize a raw response into an [`ApiResult`].
pub fn normalize<T>(status: StatusCode, body: &str) -> ApiResult<T>
where
    T: DeserializeOwned + Default,
{
    if status.is_success() {
        normalize_success(status, body)
    } else {
        normalize_failure(status, body)
    }
}

fn normalize_success<T>(status: StatusCode, body: &str) -> ApiResult<T>
where
    T: DeserializeOwned + Default,
{
    if body.trim().is_empty() {
        return ApiResult::Ok(T::default());
    }

    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => {
            warn!(status = %status, error = %e, "Non-JSON body on successful response, returning default");
            return ApiResult::Ok(T::default());
        }
    };

    // Envelope vs bare object: one explicit two-branch decision.
    let is_envelope = value
        .as_object()
        .is_some_and(|obj| obj.contains_key("data") || obj.contains_key("errors"));

    if is_envelope {
        if let Some(errors) = envelope_errors(&value) {
            return ApiResult::Err(errors);
        }
        let data = value.get("data").cloned().unwrap_or(Value::Null);
        return deserialize_lenient(status, data);
    }

    deserialize_lenient(status, value)
}

fn normalize_failure<T>(status: StatusCode, body: &str) -> ApiResult<T> {
    if body.trim().is_empty() {
        return ApiResult::Err(vec![
            ErrorDetail::new(status_message(status, "")).with_code(status_name(status)),
        ]);
    }

    if let Ok(value) = serde_json::from_str::<Value>(body) {
        if let Some(mut errors) = envelope_errors(&value) {
            if status == StatusCode::UNPROCESSABLE_ENTITY {
                for error in &mut errors {
                    error.message = CROSS_DOMAIN_HINT.to_string();
                }
            }
            return ApiResult::Err(errors);
        }

        // Generic single-field shape: {"error": "<string>"}
        if let Some(message) = value.get("error").and_then(Value::as_str) {
            let message = if status == StatusCode::UNPROCESSABLE_ENTITY {
                CROSS_DOMAIN_HINT.to_string()
            } else {
                message.to_string()
            };
            return ApiResult::Err(vec![
                ErrorDetail::new(message).with_code(status_name(status)),
            ]);
        }
    }

    ApiResult::Err(vec![
        ErrorDetail::new(status_message(status, body)).with_code(status_name(status)),
    ])
}

/// Non-empty `errors` array from an envelope, if the body carries one.
fn envelope_errors(value: &Value) -> Option<Vec<ErrorDetail>> {
    let errors = value.get("errors")?;
    let list: Vec<ErrorDetail> = serde_json::from_value(errors.clone()).ok()?;
    if list.is_empty() {
        None
    } else {
        Some(list)
    }
}

fn deserialize_lenient<T>(status: StatusCode, value: Value) -> ApiResult<T>
where
    T: DeserializeOwned + Default,
{
    match serde_json::from_value::<T>(value) {
        Ok(parsed) => ApiResult::Ok(parsed),
        Err(e) => {
            warn!(status = %status, error = %e, "Successful response did not match the expected shape, returning default");
            ApiResult::Ok(T::default())
        }
    }
}

/// CamelCase status name used as the machine code for status-derived errors.
pub(crate) fn status_name(status: StatusCode) -> String {
    match status.as_u16() {
        400 => "BadRequest".to_string(),
        401 => "Unauthorized".to_string(),
        403 => "Forbidden".to_string(),
        404 => "NotFound".to_string(),
        422 => "UnprocessableEntity".to_string(),
        500 => "InternalServerError".to_string(),
        code => status
            .canonical_reason()
            .map(|reason| reason.split_whitespace().collect::<String>())
            .unwrap_or_else(|| format!("Http{}", code)),
    }
}

/// Fixed status-derived message table. Not configurable.
fn status_message(status: StatusCode, body: &str) -> String {
    match status.as_u16() {
        400 => "The request was malformed or missing required fields.".to_string(),
        401 => "Authentication failed. Check your credentials and try again.".to_string(),
        403 => {
            "Access denied. The current identity is not allowed to perform this operation."
                .to_string()
        }
        422 => CROSS_DOMAIN_HINT.to_string(),
        500 => {
            "The authentication service returned HTTP 500. This is usually transient; try again later."
                .to_string()
        }
        code => {
            if body.trim().is_empty() {
                format!("HTTP {} {}", code, status_name(status))
            } else {
                format!("HTTP {} {}: {}", code, status_name(status), body)
            }
        }
    }
}
