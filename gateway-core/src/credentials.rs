//! Bearer-token acquisition for the upstream platform.
//!
//! The gateway never caches or refreshes tokens: each generation dispatch and
//! each live session asks its provider once.

use crate::error::{GatewayError, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Source of upstream bearer tokens.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Fetch a bearer token (without the `Bearer ` prefix).
    async fn access_token(&self) -> Result<String>;
}

/// Shared handle to a token provider.
pub type SharedTokenProvider = Arc<dyn TokenProvider>;

/// Provider returning a fixed token, e.g. one minted by `gcloud auth print-access-token`.
#[derive(Clone)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }

    /// Read the token from `GOOGLE_ACCESS_TOKEN`.
    pub fn from_env() -> Result<Self> {
        std::env::var("GOOGLE_ACCESS_TOKEN")
            .map(Self::new)
            .map_err(|_| GatewayError::auth("GOOGLE_ACCESS_TOKEN environment variable not set"))
    }
}

impl std::fmt::Debug for StaticTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticTokenProvider").field("token", &"<redacted>").finish()
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<String> {
        if self.token.is_empty() {
            return Err(GatewayError::auth("static access token is empty"));
        }
        Ok(self.token.clone())
    }
}

/// Provider backed by Google Application Default Credentials.
#[cfg(feature = "adc")]
#[derive(Debug, Clone)]
pub struct AdcTokenProvider {
    credentials: google_cloud_auth::credentials::Credentials,
}

#[cfg(feature = "adc")]
impl AdcTokenProvider {
    /// Load credentials from the environment (ADC lookup rules).
    pub fn new() -> Result<Self> {
        let credentials = google_cloud_auth::credentials::Builder::default()
            .build()
            .map_err(|e| GatewayError::auth(format!("Failed to load ADC credentials: {e}")))?;
        Ok(Self { credentials })
    }
}

#[cfg(feature = "adc")]
#[async_trait]
impl TokenProvider for AdcTokenProvider {
    async fn access_token(&self) -> Result<String> {
        use google_cloud_auth::credentials::CacheableResource;

        let headers = self
            .credentials
            .headers(Default::default())
            .await
            .map_err(|e| GatewayError::auth(format!("Failed to fetch auth headers: {e}")))?;

        let headers = match headers {
            CacheableResource::New { data, .. } => data,
            CacheableResource::NotModified => {
                return Err(GatewayError::auth("Credentials returned NotModified unexpectedly"));
            }
        };

        headers
            .get(http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.strip_prefix("Bearer "))
            .map(str::to_string)
            .ok_or_else(|| GatewayError::auth("No Bearer token in ADC headers"))
    }
}
