//! Error normalization for route handlers.
//!
//! A typed backend failure is surfaced with the backend's own status and
//! body. Every other failure becomes an opaque 500 whose detail is logged but
//! never sent to the client.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use clouding_client::BackendError;
use clouding_core::CoreError;
use serde_json::json;

use crate::auth::AuthError;

/// Fixed message of every opaque 500 response.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Errors that can occur during gateway request handling.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ApiError {
    /// A backend call failed while performing `context`.
    #[error("error {context}: {source}")]
    Backend {
        /// The operation, e.g. `"getting blueprints"`.
        context: &'static str,
        #[source]
        source: BackendError,
    },

    /// The caller could not be authenticated.
    #[error(transparent)]
    Unauthorized(#[from] AuthError),

    /// A path parameter is not a valid resource ID.
    #[error("invalid resource id: {0}")]
    InvalidId(String),

    /// `/deployments/type/:type` named an unknown type.
    #[error("invalid deployment type: {0}")]
    InvalidDeploymentType(String),

    /// The request body is not JSON.
    #[error("invalid JSON body: {0}")]
    InvalidBody(String),

    /// The request body exceeds the configured body limit.
    #[error("request body too large: {0}")]
    PayloadTooLarge(String),

    /// A streamed upstream answered with a non-2xx status.
    #[error("upstream error: HTTP {status}")]
    Upstream { status: StatusCode },

    /// Any other failure while performing `context`.
    #[error("error {context}: {reason}")]
    Internal { context: &'static str, reason: String },
}

impl ApiError {
    /// Wrap a backend failure with the operation it interrupted.
    #[must_use]
    pub fn backend(context: &'static str, source: BackendError) -> Self {
        Self::Backend { context, source }
    }

    /// An opaque internal failure.
    pub fn internal(context: &'static str, reason: impl Into<String>) -> Self {
        Self::Internal { context, reason: reason.into() }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidResourceId { value } => ApiError::InvalidId(value),
            CoreError::InvalidDeploymentType { value } => ApiError::InvalidDeploymentType(value),
            other => ApiError::internal("validating request", other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Backend {
                context,
                source: BackendError::Status { status, message, details },
            } => {
                tracing::error!(status = status.as_u16(), "error {context}: {message}");
                (status, Json(json!({"error": message, "details": details}))).into_response()
            }
            ApiError::Unauthorized(AuthError::MissingToken) => (
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": "No authenticated user found"})),
            )
                .into_response(),
            ApiError::Unauthorized(err) => (
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": "Authentication error", "details": err.to_string()})),
            )
                .into_response(),
            ApiError::InvalidId(value) => {
                tracing::warn!(id = %value, "rejected malformed resource id");
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"error": "Invalid resource ID format"})),
                )
                    .into_response()
            }
            ApiError::InvalidDeploymentType(value) => {
                tracing::warn!(deployment_type = %value, "rejected unknown deployment type");
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "error": "Validation failed",
                        "message": "Invalid deployment type. Must be \"plan\" or \"deploy\"."
                    })),
                )
                    .into_response()
            }
            ApiError::InvalidBody(reason) => {
                tracing::warn!(reason = %reason, "rejected request body");
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"error": "Invalid JSON body", "details": reason})),
                )
                    .into_response()
            }
            ApiError::PayloadTooLarge(reason) => {
                tracing::warn!(reason = %reason, "rejected oversized request body");
                (
                    StatusCode::PAYLOAD_TOO_LARGE,
                    Json(json!({"error": "Payload too large"})),
                )
                    .into_response()
            }
            ApiError::Upstream { status } => {
                tracing::error!(status = status.as_u16(), "upstream event stream refused");
                (
                    StatusCode::BAD_GATEWAY,
                    Json(json!({"error": "Upstream error", "status": status.as_u16()})),
                )
                    .into_response()
            }
            other => {
                tracing::error!(error = %other, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"error": INTERNAL_ERROR_MESSAGE})),
                )
                    .into_response()
            }
        }
    }
}

/// Convenience alias for handler results.
pub type ApiResult<T> = Result<T, ApiError>;

/// Attach an operation context to backend results.
pub trait BackendContext<T> {
    /// Map a [`BackendError`] to [`ApiError::Backend`] tagged with `context`.
    ///
    /// # Errors
    /// Returns the wrapped error unchanged in meaning.
    fn context(self, context: &'static str) -> ApiResult<T>;
}

impl<T> BackendContext<T> for Result<T, BackendError> {
    fn context(self, context: &'static str) -> ApiResult<T> {
        self.map_err(|source| ApiError::backend(context, source))
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use serde_json::Value;

    use super::*;

    fn body_of(resp: Response) -> Value {
        let rt = match tokio::runtime::Builder::new_current_thread().build() {
            Ok(rt) => rt,
            Err(e) => panic!("failed to build runtime: {e}"),
        };
        let bytes = match rt.block_on(axum::body::to_bytes(resp.into_body(), 64 * 1024)) {
            Ok(b) => b,
            Err(e) => panic!("failed to read body: {e}"),
        };
        match serde_json::from_slice(&bytes) {
            Ok(v) => v,
            Err(e) => panic!("invalid JSON: {e}"),
        }
    }

    fn typed(status: StatusCode, details: Option<Value>) -> ApiError {
        ApiError::backend(
            "getting host group",
            BackendError::Status { status, message: "API Error: not found".to_owned(), details },
        )
    }

    #[test]
    fn typed_backend_error_keeps_status_and_body() {
        let details = json!({"error": "API Error: not found", "success": false});
        let resp = typed(StatusCode::NOT_FOUND, Some(details.clone())).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body = body_of(resp);
        assert_eq!(body["error"], "API Error: not found");
        assert_eq!(body["details"], details);
    }

    #[test]
    fn transport_error_is_opaque_500() {
        let err = ApiError::backend(
            "getting blueprints",
            BackendError::Transport("tcp connect error: Connection refused (10.0.0.7:8080)".to_owned()),
        );
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_of(resp), json!({"error": "Internal server error"}));
    }

    #[test]
    fn internal_error_does_not_leak_reason() {
        let resp = ApiError::internal("rendering", "secret detail").into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_of(resp).to_string();
        assert!(!body.contains("secret"), "reason leaked: {body}");
    }

    #[test]
    fn missing_token_is_401_with_fixed_message() {
        let resp = ApiError::from(AuthError::MissingToken).into_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_of(resp), json!({"error": "No authenticated user found"}));
    }

    #[test]
    fn invalid_token_is_401_with_details() {
        let resp = ApiError::from(AuthError::InvalidToken("ExpiredSignature".to_owned())).into_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body = body_of(resp);
        assert_eq!(body["error"], "Authentication error");
        assert_eq!(body["details"], "ExpiredSignature");
    }

    #[test]
    fn core_errors_map_to_bad_request() {
        let id_err = ApiError::from(CoreError::InvalidResourceId { value: "a/b".to_owned() });
        assert_eq!(id_err.into_response().status(), StatusCode::BAD_REQUEST);

        let ty_err = ApiError::from(CoreError::InvalidDeploymentType { value: "x".to_owned() });
        let resp = ty_err.into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_of(resp)["error"], "Validation failed");
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if let Ok(mut out) = self.0.lock() {
                out.extend_from_slice(buf);
            }
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn logs_of(err: ApiError) -> String {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            let _ = err.into_response();
        });
        let bytes = match logs.0.lock() {
            Ok(out) => out.clone(),
            Err(e) => panic!("log buffer poisoned: {e}"),
        };
        String::from_utf8_lossy(&bytes).into_owned()
    }

    #[test]
    fn client_errors_are_logged_with_offending_value() {
        let id_logs = logs_of(ApiError::InvalidId("a..b".to_owned()));
        assert!(id_logs.contains("WARN") && id_logs.contains("a..b"), "got {id_logs}");

        let ty_logs = logs_of(ApiError::InvalidDeploymentType("rollback".to_owned()));
        assert!(ty_logs.contains("rollback"), "got {ty_logs}");

        let body_logs = logs_of(ApiError::InvalidBody("expected value at line 1".to_owned()));
        assert!(body_logs.contains("expected value at line 1"), "got {body_logs}");
    }

    #[test]
    fn payload_too_large_is_413_not_invalid_json() {
        let resp = ApiError::PayloadTooLarge("length limit exceeded".to_owned()).into_response();
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body_of(resp), json!({"error": "Payload too large"}));
    }

    #[test]
    fn upstream_error_is_bad_gateway_with_status() {
        let resp = ApiError::Upstream { status: StatusCode::NOT_FOUND }.into_response();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(body_of(resp), json!({"error": "Upstream error", "status": 404}));
    }

    #[test]
    fn context_wraps_backend_errors() {
        let result: Result<(), BackendError> = Err(BackendError::Decode("eof".to_owned()));
        match result.context("getting metrics") {
            Err(ApiError::Backend { context, .. }) => assert_eq!(context, "getting metrics"),
            other => panic!("expected Backend error, got {other:?}"),
        }
    }

    proptest! {
        #[test]
        fn typed_error_response_status_equals_carried_status(code in 400u16..600) {
            let status = match StatusCode::from_u16(code) {
                Ok(s) => s,
                Err(e) => panic!("{code} is a valid status: {e}"),
            };
            prop_assert_eq!(typed(status, None).into_response().status(), status);
        }

        #[test]
        fn untyped_errors_always_emit_generic_500(reason in ".*") {
            let resp = ApiError::backend("proxying", BackendError::Transport(reason)).into_response();
            prop_assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
            prop_assert_eq!(body_of(resp), json!({"error": INTERNAL_ERROR_MESSAGE}));
        }
    }
}
