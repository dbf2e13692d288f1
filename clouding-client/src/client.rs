//! Backend HTTP client.
//!
//! Every call forwards the caller's access token as a bearer credential and
//! turns non-2xx responses into [`BackendError::Status`] so route handlers
//! can surface the backend's status and body verbatim.

use clouding_core::AccessToken;
use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::header::{ACCEPT, AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE};
use hyper::{Method, Request, Response, Uri};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use serde_json::Value;

use crate::error::error_chain;
use crate::response::{parse_success, status_error};
use crate::BackendError;

const JSON: &str = "application/json";
const EVENT_STREAM: &str = "text/event-stream";

/// Client for the backend service rooted at a fixed base URL.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: Client<HttpConnector, Full<Bytes>>,
    base_url: String,
}

impl BackendClient {
    /// Create a client for `base_url`, e.g. `http://backend:8080/api/v1`.
    ///
    /// Trailing slashes are stripped so paths can always start with `/`.
    ///
    /// # Errors
    /// Returns [`BackendError::InvalidUrl`] if the URL does not parse, is not
    /// `http`, has no host, or carries a query string.
    pub fn new(base_url: &str) -> Result<Self, BackendError> {
        let base = base_url.trim().trim_end_matches('/');
        let invalid = |reason: String| BackendError::InvalidUrl {
            url: base_url.to_owned(),
            reason,
        };

        let uri: Uri = base.parse().map_err(|e| invalid(format!("{e}")))?;
        match uri.scheme_str() {
            Some("http") => {}
            Some(other) => {
                return Err(invalid(format!(
                    "unsupported scheme '{other}'; only http is supported"
                )))
            }
            None => return Err(invalid("missing scheme".to_owned())),
        }
        if uri.host().is_none() {
            return Err(invalid("missing host".to_owned()));
        }
        if uri.query().is_some() {
            return Err(invalid("base url must not carry a query string".to_owned()));
        }

        let http = Client::builder(TokioExecutor::new()).build_http();
        Ok(Self { http, base_url: base.to_owned() })
    }

    /// The normalized base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a backend path such as `/blueprints/7`.
    #[must_use]
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// `GET <base><path>`.
    ///
    /// # Errors
    /// See [`BackendClient::request`].
    pub async fn get(&self, path: &str, token: Option<&AccessToken>) -> Result<Value, BackendError> {
        self.request(Method::GET, path, None, token).await
    }

    /// `POST <base><path>` with an optional JSON body.
    ///
    /// # Errors
    /// See [`BackendClient::request`].
    pub async fn post(
        &self,
        path: &str,
        body: Option<&Value>,
        token: Option<&AccessToken>,
    ) -> Result<Value, BackendError> {
        self.request(Method::POST, path, body, token).await
    }

    /// `PUT <base><path>` with an optional JSON body.
    ///
    /// # Errors
    /// See [`BackendClient::request`].
    pub async fn put(
        &self,
        path: &str,
        body: Option<&Value>,
        token: Option<&AccessToken>,
    ) -> Result<Value, BackendError> {
        self.request(Method::PUT, path, body, token).await
    }

    /// `DELETE <base><path>`.
    ///
    /// # Errors
    /// See [`BackendClient::request`].
    pub async fn delete(&self, path: &str, token: Option<&AccessToken>) -> Result<Value, BackendError> {
        self.request(Method::DELETE, path, None, token).await
    }

    /// Issue a JSON request and return the parsed response body unmodified.
    ///
    /// `body` is ignored for `GET`. A 2xx response with an empty body yields
    /// `Value::Null`.
    ///
    /// # Errors
    /// - [`BackendError::Status`] on any non-2xx response, carrying its status
    ///   and (when JSON) its body.
    /// - [`BackendError::Transport`] if the request cannot be sent or the body
    ///   cannot be read.
    /// - [`BackendError::Decode`] if a 2xx body is not JSON.
    /// - [`BackendError::InvalidUrl`] if `path` does not form a valid URI.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        token: Option<&AccessToken>,
    ) -> Result<Value, BackendError> {
        let url = self.url_for(path);
        tracing::info!(%method, %url, "forwarding backend request");

        let payload = match body {
            Some(value) if method != Method::GET => Bytes::from(
                serde_json::to_vec(value).map_err(|e| BackendError::Decode(e.to_string()))?,
            ),
            _ => Bytes::new(),
        };

        let resp = self.send(method.clone(), &url, JSON, payload, token).await?;
        let status = resp.status();
        let bytes = read_body(resp, &url).await?;

        if !status.is_success() {
            let err = status_error(status, &bytes);
            if let BackendError::Status { details, .. } = &err {
                tracing::error!(
                    %url,
                    status = status.as_u16(),
                    details = ?details,
                    "backend request failed: {err}"
                );
            }
            return Err(err);
        }

        let value = parse_success(&bytes)?;
        tracing::info!(%method, path, "backend request succeeded");
        Ok(value)
    }

    /// Open a server-sent event stream at `<base><path>`.
    ///
    /// The response body is returned unbuffered so the caller can relay it.
    ///
    /// # Errors
    /// Returns [`BackendError::Status`] if the backend does not answer 2xx,
    /// carrying the status only, and [`BackendError::Transport`] if the
    /// request cannot be sent.
    pub async fn stream(
        &self,
        path: &str,
        token: Option<&AccessToken>,
    ) -> Result<Response<Incoming>, BackendError> {
        let url = self.url_for(path);
        tracing::info!(%url, "opening backend event stream");

        let resp = self.send(Method::GET, &url, EVENT_STREAM, Bytes::new(), token).await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        // The refused body may never end, so only the status is kept.
        tracing::error!(%url, status = status.as_u16(), "backend event stream refused");
        Err(status_error(status, &[]))
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        accept: &'static str,
        payload: Bytes,
        token: Option<&AccessToken>,
    ) -> Result<Response<Incoming>, BackendError> {
        let uri: Uri = url.parse().map_err(|e| BackendError::InvalidUrl {
            url: url.to_owned(),
            reason: format!("{e}"),
        })?;

        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(CONTENT_TYPE, JSON)
            .header(ACCEPT, accept);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token.expose()));
        }
        if !payload.is_empty() {
            builder = builder.header(CONTENT_LENGTH, payload.len().to_string());
        }

        let req = builder
            .body(Full::new(payload))
            .map_err(|e| BackendError::Transport(format!("build request: {e}")))?;

        self.http.request(req).await.map_err(|e| {
            let reason = error_chain(&e);
            tracing::error!(%url, error = %reason, "backend request error");
            BackendError::Transport(reason)
        })
    }
}

async fn read_body(resp: Response<Incoming>, url: &str) -> Result<Bytes, BackendError> {
    resp.into_body()
        .collect()
        .await
        .map(http_body_util::Collected::to_bytes)
        .map_err(|e| {
            let reason = format!("read response body: {}", error_chain(&e));
            tracing::error!(%url, error = %reason, "backend request error");
            BackendError::Transport(reason)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(url: &str) -> BackendClient {
        match BackendClient::new(url) {
            Ok(c) => c,
            Err(e) => panic!("{url} should be accepted: {e}"),
        }
    }

    #[test]
    fn new_strips_trailing_slashes() {
        let c = client("http://backend:8080/api/v1//");
        assert_eq!(c.base_url(), "http://backend:8080/api/v1");
        assert_eq!(c.url_for("/hostGroups/7"), "http://backend:8080/api/v1/hostGroups/7");
    }

    #[test]
    fn new_rejects_https_and_relative_urls() {
        for url in ["https://backend", "backend:8080", "/api", "http://backend/?x=1", ""] {
            assert!(
                matches!(BackendClient::new(url), Err(BackendError::InvalidUrl { .. })),
                "{url:?} should be rejected"
            );
        }
    }
}
