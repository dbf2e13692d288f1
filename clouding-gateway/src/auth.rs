//! Caller authentication.
//!
//! Provides the [`Caller`] extractor, which locates the access token on the
//! request, verifies it and normalizes the caller's identity. Handlers that
//! take a `Caller` never run for unauthenticated requests.

use std::collections::BTreeMap;

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{
        header::{AUTHORIZATION, COOKIE},
        request::Parts,
        HeaderMap,
    },
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use clouding_core::{AccessToken, AuthenticatedUser, CoreError, IdentityClaims};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use percent_encoding::percent_decode_str;
use serde_json::Value;

use crate::error::ApiError;
use crate::state::AppState;

/// Prefix of the auth provider's session cookie names (`sb-<project>-auth-token`).
const SESSION_COOKIE_PREFIX: &str = "sb-";
const SESSION_COOKIE_SUFFIX: &str = "-auth-token";
/// Marker of base64url-encoded session cookie values.
const BASE64_PREFIX: &str = "base64-";

/// Reasons a caller could not be authenticated.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum AuthError {
    /// Neither an `Authorization` header nor a session cookie was present.
    #[error("no access token in request")]
    MissingToken,

    /// The token failed signature, expiry or audience checks.
    #[error("{0}")]
    InvalidToken(String),

    /// The token verified but its claims do not describe a user.
    #[error(transparent)]
    InvalidIdentity(#[from] CoreError),
}

/// Verifies access tokens and resolves them to users.
///
/// Implementations must be `Send + Sync` to be shared across requests.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Verify `token` and return the user it identifies.
    ///
    /// # Errors
    /// Returns [`AuthError::InvalidToken`] or [`AuthError::InvalidIdentity`]
    /// if the token must not be trusted.
    async fn verify(&self, token: &AccessToken) -> Result<AuthenticatedUser, AuthError>;
}

/// Verifies HS256 access tokens signed with the auth provider's JWT secret.
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    /// Create a verifier requiring `audience` in the `aud` claim.
    #[must_use]
    pub fn new(secret: &[u8], audience: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[audience]);
        validation.set_required_spec_claims(&["exp", "sub", "aud"]);
        Self { key: DecodingKey::from_secret(secret), validation }
    }
}

#[async_trait]
impl IdentityVerifier for JwtVerifier {
    async fn verify(&self, token: &AccessToken) -> Result<AuthenticatedUser, AuthError> {
        let data = decode::<IdentityClaims>(token.expose(), &self.key, &self.validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        Ok(AuthenticatedUser::from_claims(&data.claims)?)
    }
}

/// An authenticated caller: the verified user and the token to forward.
#[derive(Debug, Clone)]
pub struct Caller {
    pub user: AuthenticatedUser,
    pub token: AccessToken,
}

impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = extract_token(&parts.headers) else {
            tracing::warn!(path = %parts.uri.path(), "request without access token");
            return Err(AuthError::MissingToken.into());
        };

        let user = state.verifier.verify(&token).await.map_err(|e| {
            tracing::warn!(error = %e, "access token rejected");
            e
        })?;

        tracing::info!(provider = %user.provider, user_id = %user.id, "user authenticated");
        Ok(Caller { user, token })
    }
}

/// Find the caller's access token: the bearer header first, then the
/// session cookie.
#[must_use]
pub fn extract_token(headers: &HeaderMap) -> Option<AccessToken> {
    bearer_token(headers).or_else(|| session_cookie_token(headers))
}

fn bearer_token(headers: &HeaderMap) -> Option<AccessToken> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then(|| AccessToken::new(token))
}

/// Read the access token from the auth provider's session cookie.
///
/// Large sessions are split across `<name>.0`, `<name>.1`, … and are
/// reassembled per cookie name in index order. Browsers may hold sessions of
/// several projects at once; the first one that decodes wins, whole cookies
/// before chunked ones.
#[must_use]
pub fn session_cookie_token(headers: &HeaderMap) -> Option<AccessToken> {
    let mut whole = Vec::new();
    let mut chunked: BTreeMap<&str, BTreeMap<u32, &str>> = BTreeMap::new();

    let pairs = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='));

    for (name, value) in pairs {
        if !name.starts_with(SESSION_COOKIE_PREFIX) {
            continue;
        }
        if name.ends_with(SESSION_COOKIE_SUFFIX) {
            whole.push(value);
        } else if let Some((base, index)) = name.rsplit_once('.') {
            if let (true, Ok(index)) = (base.ends_with(SESSION_COOKIE_SUFFIX), index.parse::<u32>()) {
                chunked.entry(base).or_default().insert(index, value);
            }
        }
    }

    whole
        .into_iter()
        .find_map(decode_session)
        .or_else(|| {
            chunked
                .into_values()
                .find_map(|chunks| decode_session(&chunks.into_values().collect::<String>()))
        })
}

/// Decode a session cookie value and return its access token.
///
/// Values are either `base64-` followed by base64url JSON, or percent-encoded
/// JSON. The JSON is a session object with `access_token`, or the legacy
/// array form whose first element is the token.
#[must_use]
pub fn decode_session(raw: &str) -> Option<AccessToken> {
    let json = match raw.strip_prefix(BASE64_PREFIX) {
        Some(encoded) => {
            let bytes = URL_SAFE_NO_PAD.decode(encoded.trim_end_matches('=')).ok()?;
            String::from_utf8(bytes).ok()?
        }
        None => percent_decode_str(raw).decode_utf8().ok()?.into_owned(),
    };

    let session: Value = serde_json::from_str(&json).ok()?;
    let token = match &session {
        Value::Object(fields) => fields.get("access_token")?.as_str()?,
        Value::Array(items) => items.first()?.as_str()?,
        _ => return None,
    };
    (!token.is_empty()).then(|| AccessToken::new(token))
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;
    use base64::Engine as _;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    use super::*;

    const SECRET: &[u8] = b"test-jwt-secret";
    const SUB: &str = "6f1c2a34-9b7e-4d0a-8c55-0e4a1b2c3d4e";

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            match HeaderValue::from_str(value) {
                Ok(v) => {
                    map.append(*name, v);
                }
                Err(e) => panic!("bad header value {value}: {e}"),
            }
        }
        map
    }

    fn token_of(headers: &HeaderMap) -> Option<String> {
        extract_token(headers).map(|t| t.expose().to_owned())
    }

    fn sign(claims: &Value, secret: &[u8]) -> String {
        match encode(&Header::default(), claims, &EncodingKey::from_secret(secret)) {
            Ok(t) => t,
            Err(e) => panic!("failed to sign token: {e}"),
        }
    }

    fn claims(exp_offset_secs: i64, aud: &str) -> Value {
        json!({
            "sub": SUB,
            "email": "ada@example.com",
            "aud": aud,
            "exp": chrono::Utc::now().timestamp() + exp_offset_secs,
            "app_metadata": {"provider": "github"},
            "user_metadata": {"user_name": "ada-l"}
        })
    }

    #[test]
    fn extract_token_reads_bearer_header() {
        let h = headers(&[("authorization", "Bearer abc.def.ghi")]);
        assert_eq!(token_of(&h).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn extract_token_bearer_scheme_is_case_insensitive() {
        let h = headers(&[("authorization", "bearer tok")]);
        assert_eq!(token_of(&h).as_deref(), Some("tok"));
    }

    #[test]
    fn extract_token_ignores_other_schemes() {
        let h = headers(&[("authorization", "Basic dXNlcjpwYXNz")]);
        assert!(token_of(&h).is_none());
    }

    #[test]
    fn extract_token_prefers_header_over_cookie() {
        let cookie = format!("sb-proj-auth-token={}", r#"{"access_token":"from-cookie"}"#);
        let h = headers(&[("authorization", "Bearer from-header"), ("cookie", &cookie)]);
        assert_eq!(token_of(&h).as_deref(), Some("from-header"));
    }

    #[test]
    fn session_cookie_percent_encoded_json() {
        let cookie = "theme=dark; sb-abcd-auth-token=%7B%22access_token%22%3A%22tok-1%22%7D";
        let h = headers(&[("cookie", cookie)]);
        assert_eq!(token_of(&h).as_deref(), Some("tok-1"));
    }

    #[test]
    fn session_cookie_base64_chunks_reassemble_in_order() {
        let encoded = URL_SAFE_NO_PAD.encode(r#"{"access_token":"tok-chunked","refresh_token":"r"}"#);
        let value = format!("{BASE64_PREFIX}{encoded}");
        let (first, second) = value.split_at(value.len() / 2);
        // Deliberately out of order in the header.
        let cookie = format!("sb-abcd-auth-token.1={second}; sb-abcd-auth-token.0={first}");
        let h = headers(&[("cookie", &cookie)]);
        assert_eq!(token_of(&h).as_deref(), Some("tok-chunked"));
    }

    #[test]
    fn session_cookie_chunks_of_other_projects_do_not_mix() {
        let encoded = URL_SAFE_NO_PAD.encode(r#"{"access_token":"tok-current"}"#);
        let value = format!("{BASE64_PREFIX}{encoded}");
        let (first, second) = value.split_at(value.len() / 2);
        let cookie = format!(
            "sb-cur-auth-token.0={first}; sb-cur-auth-token.1={second}; sb-old-auth-token.0=base64-c3RhbGU"
        );
        let h = headers(&[("cookie", &cookie)]);
        assert_eq!(token_of(&h).as_deref(), Some("tok-current"));
    }

    #[test]
    fn session_cookie_skips_undecodable_whole_cookie() {
        let cookie = "sb-old-auth-token=garbage; sb-cur-auth-token=%7B%22access_token%22%3A%22tok-2%22%7D";
        let h = headers(&[("cookie", cookie)]);
        assert_eq!(token_of(&h).as_deref(), Some("tok-2"));
    }

    #[test]
    fn session_cookie_legacy_array_form() {
        let h = headers(&[("cookie", r#"sb-abcd-auth-token=["tok-legacy","refresh",null]"#)]);
        assert_eq!(token_of(&h).as_deref(), Some("tok-legacy"));
    }

    #[test]
    fn session_cookie_garbage_is_ignored() {
        for cookie in ["sb-abcd-auth-token=base64-!!!", "sb-abcd-auth-token={}", "other=1"] {
            let h = headers(&[("cookie", cookie)]);
            assert!(token_of(&h).is_none(), "{cookie} should not yield a token");
        }
    }

    #[tokio::test]
    async fn jwt_verifier_accepts_valid_token() {
        let verifier = JwtVerifier::new(SECRET, "authenticated");
        let token = AccessToken::new(sign(&claims(3600, "authenticated"), SECRET));
        match verifier.verify(&token).await {
            Ok(user) => {
                assert_eq!(user.id.to_string(), SUB);
                assert_eq!(user.provider, "github");
                assert_eq!(user.name.as_deref(), Some("ada-l"));
            }
            Err(e) => panic!("valid token rejected: {e}"),
        }
    }

    #[tokio::test]
    async fn jwt_verifier_rejects_expired_token() {
        let verifier = JwtVerifier::new(SECRET, "authenticated");
        let token = AccessToken::new(sign(&claims(-3600, "authenticated"), SECRET));
        assert!(matches!(verifier.verify(&token).await, Err(AuthError::InvalidToken(_))));
    }

    #[tokio::test]
    async fn jwt_verifier_rejects_wrong_audience() {
        let verifier = JwtVerifier::new(SECRET, "authenticated");
        let token = AccessToken::new(sign(&claims(3600, "anon"), SECRET));
        assert!(matches!(verifier.verify(&token).await, Err(AuthError::InvalidToken(_))));
    }

    #[tokio::test]
    async fn jwt_verifier_rejects_wrong_secret() {
        let verifier = JwtVerifier::new(SECRET, "authenticated");
        let token = AccessToken::new(sign(&claims(3600, "authenticated"), b"other-secret"));
        assert!(matches!(verifier.verify(&token).await, Err(AuthError::InvalidToken(_))));
    }

    #[tokio::test]
    async fn jwt_verifier_rejects_non_uuid_subject() {
        let verifier = JwtVerifier::new(SECRET, "authenticated");
        let mut c = claims(3600, "authenticated");
        c["sub"] = json!("service-role");
        let token = AccessToken::new(sign(&c, SECRET));
        assert!(matches!(verifier.verify(&token).await, Err(AuthError::InvalidIdentity(_))));
    }
}
