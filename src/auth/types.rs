//! Auth configuration types
//!
//! These types represent the runtime auth configuration built from the
//! tap configuration.

use chrono::{DateTime, Utc};

/// Authentication configuration
#[derive(Clone)]
pub enum AuthConfig {
    /// Pre-issued access token, used as-is and never refreshed
    Static {
        /// The bearer token
        token: String,
    },

    /// OAuth2 refresh-token exchange
    RefreshToken {
        /// Token endpoint URL
        token_url: String,
        /// App ID
        client_id: String,
        /// App secret
        client_secret: String,
        /// Long-lived refresh token from the OAuth user flow
        refresh_token: String,
        /// Access token to use until the API rejects it or it is refreshed
        access_token: Option<String>,
    },
}

impl AuthConfig {
    /// Create a static token config
    pub fn static_token(token: impl Into<String>) -> Self {
        Self::Static {
            token: token.into(),
        }
    }

    /// Create a refresh-token config
    pub fn refresh_token(
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Self {
        Self::RefreshToken {
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            refresh_token: refresh_token.into(),
            access_token: None,
        }
    }

    /// Seed a refresh-token config with an already issued access token
    ///
    /// No effect on a static config, which already carries its token.
    #[must_use]
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        if let Self::RefreshToken { access_token, .. } = &mut self {
            *access_token = Some(token.into());
        }
        self
    }

    /// Whether tokens from this config can be refreshed
    pub fn can_refresh(&self) -> bool {
        matches!(self, Self::RefreshToken { .. })
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Static { .. } => f.debug_struct("Static").finish_non_exhaustive(),
            Self::RefreshToken {
                token_url,
                client_id,
                access_token,
                ..
            } => f
                .debug_struct("RefreshToken")
                .field("token_url", token_url)
                .field("client_id", client_id)
                .field("has_access_token", &access_token.is_some())
                .finish_non_exhaustive(),
        }
    }
}

/// Cached token with expiration
#[derive(Clone)]
pub struct CachedToken {
    /// The access token
    pub token: String,
    /// When the token expires
    pub expires_at: Option<DateTime<Utc>>,
}

impl CachedToken {
    /// Create a new cached token
    pub fn new(token: String, expires_at: Option<DateTime<Utc>>) -> Self {
        Self { token, expires_at }
    }

    /// Create a token that expires in N seconds from now
    pub fn expires_in(token: String, seconds: i64) -> Self {
        let expires_at = Utc::now() + chrono::Duration::seconds(seconds);
        Self {
            token,
            expires_at: Some(expires_at),
        }
    }

    /// Check if the token is expired (with 30 second buffer)
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => {
                let buffer = chrono::Duration::seconds(30);
                Utc::now() + buffer >= expires_at
            }
            None => false, // No expiration = never expires
        }
    }
}

impl std::fmt::Debug for CachedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedToken")
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}
