//! HTTP client with retry and token refresh
//!
//! Provides the single outbound call used by the extraction core:
//! - Response classification per stream overrides
//! - Bounded exponential backoff on retriable failures
//! - One forced token refresh when the API rejects the bearer token
//! - JSON body parsing

use super::retry::{classify, ResponseClass, RetryPolicy, StatusOverrides};
use crate::auth::TokenProvider;
use crate::error::{Error, Result};
use reqwest::header::{HeaderMap, ACCEPT, AUTHORIZATION};
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Base URL for all requests
    pub base_url: Option<String>,
    /// Request timeout
    pub timeout: Duration,
    /// Retry policy for retriable failures
    pub retry: RetryPolicy,
    /// Default headers for all requests
    pub default_headers: HashMap<String, String>,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
            default_headers: HashMap::new(),
            user_agent: format!("tap-pinterest-ads/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

/// Builder for HTTP client config
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the retry policy
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.config.retry = policy;
        self
    }

    /// Add a default header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(key.into(), value.into());
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// Configuration for a single request
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    /// Query parameters
    pub query: BTreeMap<String, String>,
    /// Request headers
    pub headers: HashMap<String, String>,
    /// Stream-specific response classification
    pub overrides: StatusOverrides,
}

impl RequestConfig {
    /// Create a new request config
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a query parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set classification overrides
    #[must_use]
    pub fn overrides(mut self, overrides: StatusOverrides) -> Self {
        self.overrides = overrides;
        self
    }
}

/// A successful response with its JSON body
#[derive(Debug, Clone)]
pub struct JsonResponse {
    /// HTTP status
    pub status: u16,
    /// Response headers
    pub headers: HeaderMap,
    /// Parsed body
    pub body: Value,
}

impl JsonResponse {
    async fn from_response(response: Response) -> Result<Self> {
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let text = response
            .text()
            .await
            .map_err(|e| Error::decode(format!("Failed to read response body: {e}")))?;
        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text)
                .map_err(|e| Error::decode(format!("Response is not valid JSON: {e}")))?
        };

        Ok(Self {
            status,
            headers,
            body,
        })
    }

    /// Get a header value as a string
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Why an attempt failed in a way that may be retried
enum RetriableFailure {
    Status {
        status: u16,
        body: String,
        retry_after: Option<Duration>,
    },
    Transport(reqwest::Error),
}

/// HTTP client with retry and authentication
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
    token_provider: Option<Arc<dyn TokenProvider>>,
}

impl HttpClient {
    /// Create a new HTTP client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(HttpClientConfig::default())
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self {
            client,
            config,
            token_provider: None,
        })
    }

    /// Attach the token provider used for every request
    #[must_use]
    pub fn with_token_provider(mut self, provider: Arc<dyn TokenProvider>) -> Self {
        self.token_provider = Some(provider);
        self
    }

    /// Get the underlying reqwest client
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Get the retry policy
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.config.retry
    }

    /// Make a GET request and parse the JSON body
    ///
    /// Retriable failures are retried until the policy's attempt budget is
    /// spent, fatal ones fail on the spot.
    pub async fn get_json(&self, path: &str, config: &RequestConfig) -> Result<JsonResponse> {
        let url = self.build_url(path)?;
        let policy = &self.config.retry;

        let mut attempts = 0u32;
        let mut refreshed = false;

        loop {
            attempts += 1;

            let mut req = self
                .client
                .get(url.clone())
                .header(ACCEPT, "application/json");

            for (key, value) in &self.config.default_headers {
                req = req.header(key.as_str(), value.as_str());
            }
            for (key, value) in &config.headers {
                req = req.header(key.as_str(), value.as_str());
            }
            if !config.query.is_empty() {
                req = req.query(&config.query);
            }
            if let Some(ref auth) = self.token_provider {
                req = req.header(AUTHORIZATION, auth.current_header().await?);
            }

            let failure = match req.send().await {
                Ok(response) => {
                    let status = response.status();

                    if status == StatusCode::UNAUTHORIZED && !refreshed {
                        if let Some(ref auth) = self.token_provider {
                            warn!("Access token rejected for {path}, forcing refresh");
                            auth.refresh().await?;
                            refreshed = true;
                            attempts -= 1;
                            continue;
                        }
                    }

                    match classify(status.as_u16(), &config.overrides) {
                        ResponseClass::Success => {
                            debug!("Request succeeded: GET {url} ({})", status.as_u16());
                            return JsonResponse::from_response(response).await;
                        }
                        ResponseClass::Fatal => {
                            let body = if config.overrides.include_body {
                                response.text().await.unwrap_or_default()
                            } else {
                                format!("Client Error for path: {path}")
                            };
                            return Err(Error::http_status(status.as_u16(), body));
                        }
                        ResponseClass::Retriable => {
                            let retry_after = extract_retry_after(&response);
                            let body = response.text().await.unwrap_or_default();
                            RetriableFailure::Status {
                                status: status.as_u16(),
                                body,
                                retry_after,
                            }
                        }
                    }
                }
                Err(e) if e.is_timeout() || e.is_connect() => RetriableFailure::Transport(e),
                Err(e) => return Err(Error::Http(e)),
            };

            if !policy.should_retry(attempts) {
                return Err(match failure {
                    RetriableFailure::Status { status, body, .. } => Error::RetriesExhausted {
                        attempts,
                        status,
                        body,
                    },
                    RetriableFailure::Transport(e) if e.is_timeout() => Error::Timeout {
                        timeout_ms: self.config.timeout.as_millis() as u64,
                    },
                    RetriableFailure::Transport(e) => Error::Http(e),
                });
            }

            let mut delay = policy.delay_for(attempts - 1);
            match &failure {
                RetriableFailure::Status {
                    status,
                    retry_after,
                    ..
                } => {
                    if let Some(after) = retry_after {
                        delay = delay.max(std::cmp::min(*after, policy.max_delay));
                    }
                    warn!(
                        "Request to {path} failed with {status}, attempt {attempts}/{}, retrying in {delay:?}",
                        policy.max_attempts
                    );
                }
                RetriableFailure::Transport(e) => {
                    warn!(
                        "Transport error for {path} ({e}), attempt {attempts}/{}, retrying in {delay:?}",
                        policy.max_attempts
                    );
                }
            }

            tokio::time::sleep(delay).await;
        }
    }

    /// Build full URL from path
    pub fn build_url(&self, path: &str) -> Result<Url> {
        if path.starts_with("http://") || path.starts_with("https://") {
            return Ok(Url::parse(path)?);
        }

        let full = match &self.config.base_url {
            Some(base) => {
                let base = base.trim_end_matches('/');
                let path = path.trim_start_matches('/');
                format!("{base}/{path}")
            }
            None => path.to_string(),
        };

        Ok(Url::parse(&full)?)
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("has_token_provider", &self.token_provider.is_some())
            .finish_non_exhaustive()
    }
}

/// Extract retry-after header value (seconds)
fn extract_retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}
