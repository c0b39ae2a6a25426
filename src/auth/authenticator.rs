//! Authenticator implementation
//!
//! Handles issuing bearer headers and managing token refresh.

use super::types::{AuthConfig, CachedToken};
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Capability the extraction core needs from an authenticator
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Value for the `Authorization` header, refreshing first if the
    /// current token is missing or expired
    async fn current_header(&self) -> Result<String>;

    /// Discard the current token and obtain a new one
    async fn refresh(&self) -> Result<()>;
}

/// Authenticator owning the access token for one run
pub struct Authenticator {
    /// Auth configuration
    config: AuthConfig,
    /// Cached access token
    cached_token: Arc<RwLock<Option<CachedToken>>>,
    /// HTTP client for token requests
    http_client: Client,
}

impl Authenticator {
    /// Create a new authenticator whose token requests give up after `timeout`
    pub fn new(config: AuthConfig, timeout: Duration) -> Result<Self> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(config, http_client))
    }

    /// Create an authenticator with a custom HTTP client
    pub fn with_client(config: AuthConfig, http_client: Client) -> Self {
        let cached = match &config {
            AuthConfig::Static { token } => Some(CachedToken::new(token.clone(), None)),
            AuthConfig::RefreshToken { access_token, .. } => access_token
                .as_ref()
                .map(|token| CachedToken::new(token.clone(), None)),
        };

        Self {
            config,
            cached_token: Arc::new(RwLock::new(cached)),
            http_client,
        }
    }

    /// Get a valid token, refreshing if necessary
    async fn get_or_refresh_token(&self) -> Result<String> {
        {
            let cached = self.cached_token.read().await;
            if let Some(token) = cached.as_ref() {
                if !token.is_expired() {
                    return Ok(token.token.clone());
                }
            }
        }

        let mut cached = self.cached_token.write().await;

        // Another caller may have refreshed while we waited for the lock
        if let Some(token) = cached.as_ref() {
            if !token.is_expired() {
                return Ok(token.token.clone());
            }
        }

        info!("Access token missing or expired, refreshing");
        let new_token = self.fetch_new_token().await?;
        let token_str = new_token.token.clone();
        *cached = Some(new_token);

        Ok(token_str)
    }

    /// Fetch a new token based on auth type
    async fn fetch_new_token(&self) -> Result<CachedToken> {
        match &self.config {
            AuthConfig::RefreshToken {
                token_url,
                client_id,
                client_secret,
                refresh_token,
                ..
            } => {
                self.fetch_oauth2_refresh(token_url, client_id, client_secret, refresh_token)
                    .await
            }
            AuthConfig::Static { .. } => Err(Error::auth(
                "Static access token was rejected and cannot be refreshed",
            )),
        }
    }

    /// Exchange the refresh token for a new access token
    ///
    /// Client credentials travel as HTTP Basic auth, the grant in the form body.
    async fn fetch_oauth2_refresh(
        &self,
        token_url: &str,
        client_id: &str,
        client_secret: &str,
        refresh_token: &str,
    ) -> Result<CachedToken> {
        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ];

        let response = self
            .http_client
            .post(token_url)
            .basic_auth(client_id, Some(client_secret))
            .form(&form)
            .send()
            .await
            .map_err(|e| Error::TokenRefresh {
                message: format!("Token request failed: {e}"),
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::TokenRefresh {
                message: format!("Refresh token request failed with status {status}: {body}"),
            });
        }

        let token_response: TokenResponse =
            response.json().await.map_err(|e| Error::TokenRefresh {
                message: format!("Malformed token response: {e}"),
            })?;
        debug!(
            expires_in = ?token_response.expires_in,
            "Obtained new access token"
        );
        Ok(token_response.into_cached_token())
    }

    /// Clear the cached token
    pub async fn clear_cache(&self) {
        let mut cached = self.cached_token.write().await;
        *cached = None;
    }

    /// Check whether a non-expired token is cached
    pub async fn is_token_valid(&self) -> bool {
        self.cached_token
            .read()
            .await
            .as_ref()
            .is_some_and(|t| !t.is_expired())
    }

    /// Get the current auth config
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }
}

#[async_trait]
impl TokenProvider for Authenticator {
    async fn current_header(&self) -> Result<String> {
        let token = self.get_or_refresh_token().await?;
        Ok(format!("Bearer {token}"))
    }

    async fn refresh(&self) -> Result<()> {
        let new_token = self.fetch_new_token().await?;
        let mut cached = self.cached_token.write().await;
        *cached = Some(new_token);
        Ok(())
    }
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("can_refresh", &self.config.can_refresh())
            .finish_non_exhaustive()
    }
}

/// OAuth2 token response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

impl TokenResponse {
    fn into_cached_token(self) -> CachedToken {
        match self.expires_in {
            Some(secs) => CachedToken::expires_in(self.access_token, secs),
            None => CachedToken::new(self.access_token, None),
        }
    }
}
