//! Keyhole - credential-hiding proxy for chat-completion APIs
//!
//! This library provides the core functionality for the Keyhole proxy
//! server. Browser clients call it with a shared token; it checks the token,
//! applies a global sliding-window rate limit and forwards the JSON body to
//! the upstream API with the server-held key attached.

pub mod cli;
pub mod config;
pub mod error;
pub mod middleware;
pub mod proxy;
pub mod routes;

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use secrecy::{ExposeSecret, SecretString};

pub use crate::config::Config;
pub use crate::middleware::auth::Authenticator;
pub use crate::middleware::rate_limiter::SlidingWindowLimiter;
pub use crate::proxy::{ChatProvider, OpenAIProvider};

/// Application state shared across all request handlers
///
/// Each instance owns its own rate window, so independent instances never
/// share admissions.
pub struct AppState {
    pub config: Config,
    pub start_time: Instant,
    /// Shared-token check for the relay endpoint
    pub authenticator: Authenticator,
    /// Global sliding-window limiter
    pub limiter: SlidingWindowLimiter,
    /// Upstream the relay forwards to
    pub provider: Arc<dyn ChatProvider>,
}

impl AppState {
    /// Create a new application state
    pub fn new(config: Config) -> Result<Self> {
        // Connection pooling only; each upstream call carries its own timeout
        let http_client = reqwest::Client::builder()
            .pool_max_idle_per_host(32)
            .build()?;

        let provider: Arc<dyn ChatProvider> = Arc::new(OpenAIProvider::new(http_client, &config));

        Self::with_provider(config, provider)
    }

    /// Create an application state around an explicit upstream provider
    pub fn with_provider(config: Config, provider: Arc<dyn ChatProvider>) -> Result<Self> {
        let authenticator = Authenticator::new(SecretString::new(
            config.proxy_token.expose_secret().into(),
        ))?;
        let limiter = SlidingWindowLimiter::per_minute(config.rate_limit_per_minute);

        Ok(Self {
            config,
            start_time: Instant::now(),
            authenticator,
            limiter,
            provider,
        })
    }
}
