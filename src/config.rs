//! Configuration management for Keyhole
//!
//! Configuration is loaded from environment variables (optionally seeded from
//! a `.env` file). Both secrets are mandatory: the proxy refuses to start
//! rather than run open or without an upstream credential.

use std::env;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use secrecy::{ExposeSecret, SecretString};

/// Default upstream chat-completion endpoint
pub const DEFAULT_UPSTREAM_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Default ceiling of accepted requests per trailing minute
pub const DEFAULT_RATE_LIMIT: u32 = 60;

/// Default timeout for the proxy leg to the upstream
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 10;

/// Application configuration
#[derive(Debug)]
pub struct Config {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,

    /// Allowed CORS origin(s): `*` or a comma-separated list
    pub cors_allow_origin: String,

    /// Shared token every caller must present in `X-API-Token`
    pub proxy_token: SecretString,

    /// Upstream chat-completion endpoint
    pub upstream_url: String,
    /// Upstream API key, attached as a bearer credential
    pub upstream_api_key: SecretString,
    /// Timeout for each upstream call
    pub upstream_timeout: Duration,

    /// Maximum accepted requests in any trailing 60 second span
    pub rate_limit_per_minute: u32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let upstream_timeout_secs: u64 = lookup("UPSTREAM_TIMEOUT_SECS")
            .unwrap_or_else(|| DEFAULT_UPSTREAM_TIMEOUT_SECS.to_string())
            .parse()
            .context("Invalid UPSTREAM_TIMEOUT_SECS")?;
        if upstream_timeout_secs == 0 {
            bail!("UPSTREAM_TIMEOUT_SECS must be greater than zero");
        }

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: lookup("PORT")
                .unwrap_or_else(|| "10000".to_string())
                .parse()
                .context("Invalid PORT")?,

            cors_allow_origin: lookup("CORS_ALLOW_ORIGIN").unwrap_or_else(|| "*".to_string()),

            proxy_token: required_secret(&lookup, "PROXY_TOKEN")?,

            upstream_url: lookup("OPENAI_API_URL")
                .unwrap_or_else(|| DEFAULT_UPSTREAM_URL.to_string()),
            upstream_api_key: required_secret(&lookup, "OPENAI_API_KEY")?,
            upstream_timeout: Duration::from_secs(upstream_timeout_secs),

            rate_limit_per_minute: lookup("OPENAI_RATE_LIMIT")
                .unwrap_or_else(|| DEFAULT_RATE_LIMIT.to_string())
                .parse()
                .context("Invalid OPENAI_RATE_LIMIT")?,
        })
    }

    /// Whether any origin is allowed to call the proxy
    pub fn allows_any_origin(&self) -> bool {
        self.cors_allow_origin.trim() == "*"
    }

    /// Explicitly allowed origins, empty when any origin is allowed
    pub fn allowed_origins(&self) -> Vec<String> {
        if self.allows_any_origin() {
            return Vec::new();
        }

        self.cors_allow_origin
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Read a secret that must be present and non-empty
fn required_secret<F>(lookup: &F, key: &str) -> Result<SecretString>
where
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(key).with_context(|| format!("{key} must be set"))?;
    let secret = SecretString::new(value.into());
    if secret.expose_secret().is_empty() {
        bail!("{key} must not be empty");
    }
    Ok(secret)
}
