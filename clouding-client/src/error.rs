//! Error types for the backend client crate.

use hyper::StatusCode;
use serde_json::Value;

/// Errors that can occur while calling the backend service.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum BackendError {
    /// The backend answered with a non-2xx status.
    #[error("{message}")]
    Status {
        status: StatusCode,
        /// The body's `error` or `message` field, else `HTTP <code>: <reason>`.
        message: String,
        /// The response body, when it was JSON.
        details: Option<Value>,
    },

    /// The configured base URL, or a URL built from it, is unusable.
    #[error("invalid backend url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The request could not be sent or its response could not be read.
    #[error("backend transport error: {0}")]
    Transport(String),

    /// A 2xx response body was not valid JSON.
    #[error("invalid backend response body: {0}")]
    Decode(String),
}

impl BackendError {
    /// The carried HTTP status, for the typed non-2xx variant only.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            BackendError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Render an error with its full `source()` chain.
///
/// hyper's top-level client errors are terse ("client error (Connect)"); the
/// useful part is usually further down the chain.
pub(crate) fn error_chain(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        out.push_str(": ");
        out.push_str(&inner.to_string());
        source = inner.source();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_accessor_only_reports_typed_variant() {
        let typed = BackendError::Status {
            status: StatusCode::NOT_FOUND,
            message: "not found".to_owned(),
            details: None,
        };
        assert_eq!(typed.status(), Some(StatusCode::NOT_FOUND));
        assert_eq!(BackendError::Transport("refused".to_owned()).status(), None);
    }

    #[test]
    fn status_display_is_the_backend_message() {
        let err = BackendError::Status {
            status: StatusCode::BAD_REQUEST,
            message: "API Error: name required".to_owned(),
            details: None,
        };
        assert_eq!(err.to_string(), "API Error: name required");
    }

    #[test]
    fn error_chain_includes_sources() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let outer = std::io::Error::new(std::io::ErrorKind::Other, io);
        assert!(error_chain(&outer).contains("refused"));
    }
}
