//! Interpretation of backend response bodies.

use hyper::StatusCode;
use serde_json::Value;

use crate::BackendError;

/// Build the typed error for a non-2xx response.
///
/// The message is taken from the body's `error` field, then its `message`
/// field, and falls back to `HTTP <code>: <reason>`.
pub(crate) fn status_error(status: StatusCode, body: &[u8]) -> BackendError {
    let details: Option<Value> = serde_json::from_slice(body).ok();
    let message = details
        .as_ref()
        .and_then(|d| text_field(d, "error").or_else(|| text_field(d, "message")))
        .unwrap_or_else(|| {
            format!(
                "HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown Status")
            )
        });
    BackendError::Status { status, message, details }
}

/// Parse a 2xx body. An empty body is `null`.
pub(crate) fn parse_success(body: &[u8]) -> Result<Value, BackendError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body).map_err(|e| BackendError::Decode(e.to_string()))
}

fn text_field(body: &Value, key: &str) -> Option<String> {
    body.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}
