//! Gateway configuration loaded from the environment.

use std::{fmt, net::SocketAddr};

/// Default bind address when `CLOUDING_LISTEN_ADDR` is unset.
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:3000";
/// Default required `aud` claim of access tokens.
pub const DEFAULT_JWT_AUDIENCE: &str = "authenticated";

/// Errors raised while reading configuration.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// A required variable is unset or empty.
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    /// A variable is set but unusable.
    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Runtime configuration of the gateway process.
#[derive(Clone)]
#[non_exhaustive]
pub struct GatewayConfig {
    /// Address the HTTP server binds to.
    pub listen_addr: SocketAddr,
    /// Base URL of the backend service.
    pub backend_url: String,
    /// HS256 secret the auth provider signs access tokens with.
    pub jwt_secret: String,
    /// Required `aud` claim.
    pub jwt_audience: String,
}

impl GatewayConfig {
    /// Read configuration from process environment variables.
    ///
    /// # Errors
    /// See [`GatewayConfig::from_lookup`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`, which maps a variable name to its
    /// value.
    ///
    /// # Errors
    /// Returns [`ConfigError::Missing`] if `BACKEND_URL` or
    /// `SUPABASE_JWT_SECRET` is unset, and [`ConfigError::Invalid`] if
    /// `CLOUDING_LISTEN_ADDR` is not a socket address.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let backend_url = non_empty("BACKEND_URL").ok_or(ConfigError::Missing("BACKEND_URL"))?;
        let jwt_secret =
            non_empty("SUPABASE_JWT_SECRET").ok_or(ConfigError::Missing("SUPABASE_JWT_SECRET"))?;
        let jwt_audience =
            non_empty("SUPABASE_JWT_AUDIENCE").unwrap_or_else(|| DEFAULT_JWT_AUDIENCE.to_owned());

        let raw_addr =
            non_empty("CLOUDING_LISTEN_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_owned());
        let listen_addr = raw_addr.parse().map_err(|e| ConfigError::Invalid {
            var: "CLOUDING_LISTEN_ADDR",
            reason: format!("'{raw_addr}': {e}"),
        })?;

        Ok(Self { listen_addr, backend_url, jwt_secret, jwt_audience })
    }
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("listen_addr", &self.listen_addr)
            .field("backend_url", &self.backend_url)
            .field("jwt_secret", &"<redacted>")
            .field("jwt_audience", &self.jwt_audience)
            .finish()
    }
}
