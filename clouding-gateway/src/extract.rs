//! Request extractors with JSON error rejections.

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::StatusCode,
};
use serde_json::Value;

use crate::error::ApiError;

/// An arbitrary JSON request body. An empty body reads as `null`.
///
/// Bodies are subject to axum's `DefaultBodyLimit`; an oversized body is
/// rejected with [`ApiError::PayloadTooLarge`].
#[derive(Debug, Clone)]
pub struct JsonBody(pub Value);

impl JsonBody {
    /// The body to forward, or `None` for an empty request body.
    #[must_use]
    pub fn forwardable(&self) -> Option<&Value> {
        (!self.0.is_null()).then_some(&self.0)
    }
}

impl<S> FromRequest<S> for JsonBody
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await.map_err(|e| {
            if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                ApiError::PayloadTooLarge(e.body_text())
            } else {
                ApiError::InvalidBody(e.body_text())
            }
        })?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(JsonBody(Value::Null));
        }
        serde_json::from_slice(&bytes)
            .map(JsonBody)
            .map_err(|e| ApiError::InvalidBody(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;

    use super::*;

    async fn extract(body: impl Into<Body>) -> Result<JsonBody, ApiError> {
        let req = match Request::builder().method("POST").uri("/").body(body.into()) {
            Ok(r) => r,
            Err(e) => panic!("failed to build request: {e}"),
        };
        JsonBody::from_request(req, &()).await
    }

    #[tokio::test]
    async fn json_body_empty_reads_as_null() {
        match extract("  \n").await {
            Ok(body) => assert!(body.forwardable().is_none()),
            Err(e) => panic!("empty body rejected: {e}"),
        }
    }

    #[tokio::test]
    async fn json_body_malformed_is_invalid_body() {
        assert!(matches!(extract("{nope").await, Err(ApiError::InvalidBody(_))));
    }

    #[tokio::test]
    async fn json_body_over_default_limit_is_payload_too_large() {
        // axum's default limit is 2 MiB.
        let padding = "a".repeat(3 * 1024 * 1024);
        let body = format!(r#"{{"name":"{padding}"}}"#);
        assert!(matches!(extract(body).await, Err(ApiError::PayloadTooLarge(_))));
    }
}
