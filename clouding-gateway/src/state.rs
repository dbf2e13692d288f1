//! Shared router state.

use std::sync::Arc;

use clouding_client::BackendClient;

use crate::auth::{IdentityVerifier, JwtVerifier};
use crate::config::{ConfigError, GatewayConfig};

/// State handed to every handler. Immutable and cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub backend: BackendClient,
    pub verifier: Arc<dyn IdentityVerifier>,
}

impl AppState {
    /// Assemble state from its parts.
    #[must_use]
    pub fn new(backend: BackendClient, verifier: Arc<dyn IdentityVerifier>) -> Self {
        Self { backend, verifier }
    }

    /// Build the backend client and JWT verifier described by `config`.
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] if `BACKEND_URL` is not a usable
    /// `http://` base URL.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, ConfigError> {
        let backend = BackendClient::new(&config.backend_url).map_err(|e| ConfigError::Invalid {
            var: "BACKEND_URL",
            reason: e.to_string(),
        })?;
        let verifier = JwtVerifier::new(config.jwt_secret.as_bytes(), &config.jwt_audience);
        Ok(Self::new(backend, Arc::new(verifier)))
    }
}
