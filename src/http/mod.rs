//! HTTP client module
//!
//! Provides the single outbound call used by every stream, guarded by the
//! retry policy.
//!
//! # Features
//!
//! - **Classification**: 429/5xx retriable, other 4xx fatal, per-stream overrides
//! - **Retries**: bounded exponential backoff, honoring `Retry-After`
//! - **Authentication**: bearer header from a `TokenProvider`, one forced
//!   refresh on 401

mod client;
mod retry;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder, JsonResponse, RequestConfig};
pub use retry::{classify, ResponseClass, RetryPolicy, StatusOverrides, StatusRule};
