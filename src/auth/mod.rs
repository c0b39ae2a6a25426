//! Authentication module
//!
//! Supports: static bearer token, OAuth2 refresh-token exchange
//!
//! The `Authenticator` owns the current access token and refreshes it on
//! demand. Callers only see the narrow `TokenProvider` capability: a valid
//! `Authorization` header value, and a way to force a refresh after the API
//! rejects the current token.

mod authenticator;
mod types;

pub use authenticator::{Authenticator, TokenProvider};
pub use types::{AuthConfig, CachedToken};
