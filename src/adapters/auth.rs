//! Bearer-token acquisition
//!
//! Upstream and storage requests ask a [`TokenSource`] for a token on every
//! call. The Azure AD implementation relies on the credential's own cache, so
//! repeated calls within a token's lifetime do not hit the identity endpoint.

use crate::config::{IdentityConfig, SecretString};
use crate::domain::{Result, SweepError};
use async_trait::async_trait;
use azure_core::credentials::TokenCredential;
use azure_identity::ClientSecretCredential;
use secrecy::ExposeSecret;
use std::sync::Arc;

/// Scope for Azure Storage data-plane requests
pub const STORAGE_SCOPE: &str = "https://storage.azure.com/.default";

/// Source of OAuth2 bearer tokens
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Acquire an access token for `scope`.
    ///
    /// Failures are reported as [`SweepError::Authentication`].
    async fn token(&self, scope: &str) -> Result<String>;
}

/// Client-credentials flow against Azure AD
pub struct AzureAdTokenSource {
    credential: Arc<ClientSecretCredential>,
}

impl AzureAdTokenSource {
    /// Create from tenant, client id and client secret
    pub fn new(tenant_id: &str, client_id: &str, client_secret: &str) -> Result<Self> {
        let secret = azure_core::credentials::Secret::new(client_secret.to_string());
        let credential = ClientSecretCredential::new(tenant_id, client_id.to_string(), secret, None)
            .map_err(|e| {
                SweepError::Authentication(format!("Failed to create Azure AD credential: {e}"))
            })?;

        Ok(Self { credential })
    }

    /// Create from the `[identity]` section
    pub fn from_config(identity: &IdentityConfig) -> Result<Self> {
        let tenant_id = required(identity.tenant_id.as_deref(), "tenant_id")?;
        let client_id = required(identity.client_id.as_deref(), "client_id")?;
        let client_secret = identity
            .client_secret
            .as_ref()
            .ok_or_else(|| missing("client_secret"))?;

        Self::new(tenant_id, client_id, client_secret.expose_secret().as_str())
    }
}

fn required<'a>(value: Option<&'a str>, name: &str) -> Result<&'a str> {
    value.filter(|v| !v.is_empty()).ok_or_else(|| missing(name))
}

fn missing(name: &str) -> SweepError {
    SweepError::Configuration(format!("identity.{name} is required"))
}

#[async_trait]
impl TokenSource for AzureAdTokenSource {
    async fn token(&self, scope: &str) -> Result<String> {
        let token = TokenCredential::get_token(&*self.credential, &[scope], None)
            .await
            .map_err(|e| {
                SweepError::Authentication(format!("Failed to acquire token for {scope}: {e}"))
            })?;

        Ok(token.token.secret().to_string())
    }
}

/// Fixed token, for development against a proxy or in tests
pub struct StaticTokenSource {
    token: SecretString,
}

impl StaticTokenSource {
    pub fn new(token: SecretString) -> Self {
        Self { token }
    }
}

#[async_trait]
impl TokenSource for StaticTokenSource {
    async fn token(&self, _scope: &str) -> Result<String> {
        let token = self.token.expose_secret();
        if token.is_empty() {
            return Err(SweepError::Authentication(
                "static token is empty".to_string(),
            ));
        }
        Ok(token.as_str().to_string())
    }
}

/// Build the token source the identity section asks for
pub fn token_source_from_config(identity: &IdentityConfig) -> Result<Arc<dyn TokenSource>> {
    match &identity.static_token {
        Some(token) => {
            tracing::warn!("Using a static bearer token; intended for development only");
            Ok(Arc::new(StaticTokenSource::new(token.clone())))
        }
        None => Ok(Arc::new(AzureAdTokenSource::from_config(identity)?)),
    }
}
