//! Tap configuration
//!
//! Configuration is read from one or more JSON files, merged left to right,
//! or from `TAP_PINTEREST_ADS_*` environment variables.

use crate::auth::AuthConfig;
use crate::engine::SyncConfig;
use crate::error::{Error, Result};
use crate::http::HttpClientConfig;
use crate::state::parse_bookmark;
use crate::streams::DEFAULT_PAGE_SIZE;
use crate::types::{JsonObject, JsonValue, OptionStringExt};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::Path;

/// Prefix of configuration environment variables
pub const ENV_PREFIX: &str = "TAP_PINTEREST_ADS_";

/// Default API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.pinterest.com/v5/";

/// Largest page size the API accepts
pub const MAX_PAGE_SIZE: u32 = 250;

const FIELDS: &[&str] = &[
    "client_id",
    "client_secret",
    "refresh_token",
    "access_token",
    "start_date",
    "is_backfilled",
    "base_url",
    "token_url",
    "page_size",
    "max_pages",
    "user_agent",
];

const NON_STRING_FIELDS: &[&str] = &["is_backfilled", "page_size", "max_pages"];

// ============================================================================
// Tap Config
// ============================================================================

/// Validated tap configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TapConfig {
    /// OAuth client identifier
    #[serde(default)]
    pub client_id: Option<String>,

    /// OAuth client secret
    #[serde(default)]
    pub client_secret: Option<String>,

    /// Long-lived refresh token
    #[serde(default)]
    pub refresh_token: Option<String>,

    /// Pre-issued access token, refreshed only when refresh credentials are set
    #[serde(default)]
    pub access_token: Option<String>,

    /// Earliest date to extract analytics for
    #[serde(default)]
    pub start_date: Option<String>,

    /// Skip inactive ads once the historical backfill is complete
    #[serde(default)]
    pub is_backfilled: bool,

    /// API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// OAuth token endpoint (defaults to `{base_url}oauth/token`)
    #[serde(default)]
    pub token_url: Option<String>,

    /// Page size sent with every request
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Hard cap on pages per partition
    #[serde(default)]
    pub max_pages: Option<u32>,

    /// User agent override
    #[serde(default)]
    pub user_agent: Option<String>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl TapConfig {
    /// Parse and validate a JSON config object
    pub fn from_value(value: JsonValue) -> Result<Self> {
        let config: TapConfig = serde_json::from_value(value)
            .map_err(|e| Error::config(format!("Invalid config JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load config files, later files overriding earlier ones key by key
    pub fn from_files<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        if paths.is_empty() {
            return Err(Error::config("No config file given"));
        }

        let mut merged = JsonObject::new();
        for path in paths {
            let path = path.as_ref();
            let content = std::fs::read_to_string(path).map_err(|e| {
                Error::config(format!("Failed to read config file {}: {e}", path.display()))
            })?;
            match serde_json::from_str::<JsonValue>(&content)
                .map_err(|e| Error::config(format!("Invalid config JSON in {}: {e}", path.display())))?
            {
                JsonValue::Object(object) => merged.extend(object),
                _ => {
                    return Err(Error::config(format!(
                        "Config file {} must contain a JSON object",
                        path.display()
                    )))
                }
            }
        }

        Self::from_value(JsonValue::Object(merged))
    }

    /// Load config from `TAP_PINTEREST_ADS_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_env_with(|name| std::env::var(name).ok())
    }

    /// Load config from variables served by `lookup`
    pub fn from_env_with(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut object = JsonObject::new();

        for field in FIELDS {
            let name = format!("{ENV_PREFIX}{}", field.to_uppercase());
            let Some(raw) = lookup(&name).none_if_empty() else {
                continue;
            };

            let value = if NON_STRING_FIELDS.contains(field) {
                serde_json::from_str(raw.trim())
                    .map_err(|_| Error::invalid_value(*field, format!("cannot parse '{raw}'")))?
            } else {
                JsonValue::String(raw)
            };
            object.insert((*field).to_string(), value);
        }

        Self::from_value(JsonValue::Object(object))
    }

    /// Check required fields and value ranges
    pub fn validate(&self) -> Result<()> {
        self.start_date()?;

        if self.access_token.clone().none_if_empty().is_none() {
            for (field, value) in [
                ("client_id", &self.client_id),
                ("client_secret", &self.client_secret),
                ("refresh_token", &self.refresh_token),
            ] {
                if value.clone().none_if_empty().is_none() {
                    return Err(Error::missing_field(field));
                }
            }
        }

        url::Url::parse(&self.base_url)
            .map_err(|e| Error::invalid_value("base_url", e.to_string()))?;
        if let Some(token_url) = &self.token_url {
            url::Url::parse(token_url)
                .map_err(|e| Error::invalid_value("token_url", e.to_string()))?;
        }

        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(Error::invalid_value(
                "page_size",
                format!("must be between 1 and {MAX_PAGE_SIZE}"),
            ));
        }

        if self.max_pages == Some(0) {
            return Err(Error::invalid_value("max_pages", "must be at least 1"));
        }

        Ok(())
    }

    /// Parsed start date
    pub fn start_date(&self) -> Result<NaiveDate> {
        let raw = self
            .start_date
            .clone()
            .none_if_empty()
            .ok_or_else(|| Error::missing_field("start_date"))?;
        parse_bookmark(&raw).map_err(|e| Error::invalid_value("start_date", e.to_string()))
    }

    /// OAuth token endpoint
    pub fn token_url(&self) -> String {
        self.token_url
            .clone()
            .unwrap_or_else(|| format!("{}/oauth/token", self.base_url.trim_end_matches('/')))
    }

    /// Authenticator configuration
    ///
    /// Refresh credentials win over a bare `access_token`: the supplied token
    /// is used first and replaced through the refresh grant once rejected.
    pub fn auth_config(&self) -> Result<AuthConfig> {
        let access_token = self.access_token.clone().none_if_empty();
        let client_id = self.client_id.clone().none_if_empty();
        let client_secret = self.client_secret.clone().none_if_empty();
        let refresh_token = self.refresh_token.clone().none_if_empty();

        match (client_id, client_secret, refresh_token, access_token) {
            (Some(client_id), Some(client_secret), Some(refresh_token), access_token) => {
                let config =
                    AuthConfig::refresh_token(self.token_url(), client_id, client_secret, refresh_token);
                Ok(match access_token {
                    Some(token) => config.with_access_token(token),
                    None => config,
                })
            }
            (_, _, _, Some(token)) => Ok(AuthConfig::static_token(token)),
            (None, ..) => Err(Error::missing_field("client_id")),
            (_, None, ..) => Err(Error::missing_field("client_secret")),
            (.., None, None) => Err(Error::missing_field("refresh_token")),
        }
    }

    /// HTTP client configuration
    pub fn http_config(&self) -> HttpClientConfig {
        let mut builder = HttpClientConfig::builder().base_url(&self.base_url);
        if let Some(agent) = &self.user_agent {
            builder = builder.user_agent(agent);
        }
        builder.build()
    }

    /// Sync engine configuration
    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig::new()
            .with_backfilled(self.is_backfilled)
            .with_max_pages(self.max_pages)
            .with_page_size((self.page_size != DEFAULT_PAGE_SIZE).then_some(self.page_size))
    }

    /// JSON schema of the accepted configuration
    pub fn properties() -> JsonValue {
        json!({
            "type": "object",
            "required": ["start_date"],
            "properties": {
                "client_id": {"type": "string", "description": "OAuth client identifier"},
                "client_secret": {"type": "string", "secret": true, "description": "OAuth client secret"},
                "refresh_token": {"type": "string", "secret": true, "description": "Long-lived refresh token"},
                "access_token": {"type": "string", "secret": true, "description": "Pre-issued access token; refreshed when client credentials and a refresh token are also given"},
                "start_date": {"type": "string", "format": "date-time", "description": "Earliest date to extract analytics for"},
                "is_backfilled": {"type": "boolean", "default": false, "description": "Skip inactive ads once the historical backfill is complete"},
                "base_url": {"type": "string", "default": DEFAULT_BASE_URL},
                "token_url": {"type": "string"},
                "page_size": {"type": "integer", "default": DEFAULT_PAGE_SIZE, "maximum": MAX_PAGE_SIZE},
                "max_pages": {"type": "integer", "minimum": 1},
                "user_agent": {"type": "string"}
            }
        })
    }
}
