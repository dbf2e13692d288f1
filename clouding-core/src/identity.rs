//! Authenticated caller identity, normalized across sign-in providers.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::CoreError;

/// Provider reported when the token carries none.
pub const DEFAULT_PROVIDER: &str = "email";

/// The subset of access-token claims the gateway reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct IdentityClaims {
    /// Subject: the auth provider's user ID.
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Profile data copied from the sign-in provider.
    #[serde(default)]
    pub user_metadata: Option<Map<String, Value>>,
    /// Data owned by the auth service, including the sign-in `provider`.
    #[serde(default)]
    pub app_metadata: Option<Map<String, Value>>,
}

impl IdentityClaims {
    /// Create claims for a subject with no email or metadata.
    pub fn new(sub: impl Into<String>) -> Self {
        Self { sub: sub.into(), ..Self::default() }
    }
}

/// A verified caller of the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct AuthenticatedUser {
    pub id: Uuid,
    /// Empty when the provider did not share an address.
    pub email: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    /// Sign-in provider, e.g. `email`, `google` or `github`.
    pub provider: String,
    /// The user's ID at the sign-in provider.
    pub provider_id: String,
}

impl AuthenticatedUser {
    /// Normalize verified token claims into a user.
    ///
    /// Name and avatar lookups follow each provider's metadata conventions:
    /// GitHub exposes `user_name`, Discord and most others `username`, and
    /// Google reports the avatar as `picture`.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidClaim`] if `sub` is not a UUID.
    pub fn from_claims(claims: &IdentityClaims) -> Result<Self, CoreError> {
        let id = Uuid::parse_str(&claims.sub).map_err(|e| CoreError::InvalidClaim {
            claim: "sub",
            reason: e.to_string(),
        })?;

        let empty = Map::new();
        let meta = claims.user_metadata.as_ref().unwrap_or(&empty);
        let provider = claims
            .app_metadata
            .as_ref()
            .and_then(|m| text(m, "provider"))
            .unwrap_or_else(|| DEFAULT_PROVIDER.to_owned());

        let base_name = text(meta, "full_name").or_else(|| text(meta, "name"));
        let (name, avatar_url) = match provider.as_str() {
            "google" => (
                base_name,
                text(meta, "avatar_url").or_else(|| text(meta, "picture")),
            ),
            "github" => (
                base_name.or_else(|| text(meta, "user_name")),
                text(meta, "avatar_url"),
            ),
            "discord" => (
                base_name.or_else(|| text(meta, "username")),
                text(meta, "avatar_url"),
            ),
            _ => (
                base_name.or_else(|| text(meta, "username")),
                text(meta, "avatar_url").or_else(|| text(meta, "picture")),
            ),
        };

        Ok(Self {
            id,
            email: claims.email.clone().unwrap_or_default(),
            name,
            avatar_url,
            provider,
            provider_id: text(meta, "provider_id").unwrap_or_else(|| claims.sub.clone()),
        })
    }
}

fn text(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const SUB: &str = "6f1c2a34-9b7e-4d0a-8c55-0e4a1b2c3d4e";

    fn claims(provider: Option<&str>, meta: Value) -> IdentityClaims {
        let mut claims = IdentityClaims::new(SUB);
        claims.email = Some("ada@example.com".to_owned());
        claims.user_metadata = meta.as_object().cloned();
        claims.app_metadata = provider.map(|p| {
            let mut m = Map::new();
            m.insert("provider".to_owned(), json!(p));
            m
        });
        claims
    }

    fn user(claims: &IdentityClaims) -> AuthenticatedUser {
        match AuthenticatedUser::from_claims(claims) {
            Ok(u) => u,
            Err(e) => panic!("claims should normalize: {e}"),
        }
    }

    #[test]
    fn from_claims_defaults_provider_to_email() {
        let u = user(&claims(None, json!({})));
        assert_eq!(u.provider, "email");
        assert_eq!(u.provider_id, SUB, "provider_id falls back to sub");
        assert_eq!(u.email, "ada@example.com");
        assert!(u.name.is_none());
    }

    #[test]
    fn from_claims_github_uses_user_name_fallback() {
        let u = user(&claims(
            Some("github"),
            json!({"user_name": "ada-l", "avatar_url": "https://a/1.png", "provider_id": "991"}),
        ));
        assert_eq!(u.name.as_deref(), Some("ada-l"));
        assert_eq!(u.avatar_url.as_deref(), Some("https://a/1.png"));
        assert_eq!(u.provider_id, "991");
    }

    #[test]
    fn from_claims_google_prefers_full_name_and_picture() {
        let u = user(&claims(
            Some("google"),
            json!({"full_name": "Ada Lovelace", "name": "Ada", "picture": "https://g/p.jpg"}),
        ));
        assert_eq!(u.name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(u.avatar_url.as_deref(), Some("https://g/p.jpg"));
    }

    #[test]
    fn from_claims_google_ignores_username() {
        let u = user(&claims(Some("google"), json!({"username": "ada"})));
        assert!(u.name.is_none(), "google has no username fallback");
    }

    #[test]
    fn from_claims_discord_falls_back_to_username() {
        let u = user(&claims(Some("discord"), json!({"username": "ada#1", "picture": "x"})));
        assert_eq!(u.name.as_deref(), Some("ada#1"));
        assert!(u.avatar_url.is_none(), "discord does not read picture");
    }

    #[test]
    fn from_claims_rejects_non_uuid_subject() {
        let result = AuthenticatedUser::from_claims(&IdentityClaims::new("not-a-uuid"));
        assert!(
            matches!(result, Err(CoreError::InvalidClaim { claim: "sub", .. })),
            "non-UUID sub must be rejected"
        );
    }

    #[test]
    fn identity_claims_deserialize_tolerates_null_metadata() {
        let parsed: IdentityClaims =
            match serde_json::from_value(json!({"sub": SUB, "user_metadata": null})) {
                Ok(c) => c,
                Err(e) => panic!("claims should deserialize: {e}"),
            };
        assert!(parsed.user_metadata.is_none());
        assert!(parsed.email.is_none());
    }
}
