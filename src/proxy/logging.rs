//! Request logging utilities for upstream relaying
//!
//! Provides structured logging with short correlation IDs so every line
//! belonging to one relayed request can be found after the fact. Nothing
//! logged here ever includes a credential.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use tracing::{debug, error, info};
use uuid::Uuid;

/// Context for tracking a request through the relay
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Unique identifier for this request (for log correlation)
    pub trace_id: String,
    /// When the request started
    pub start_time: Instant,
    /// Upstream provider handling this request
    pub provider: String,
    /// Model named in the request body
    pub model: String,
    /// Caller's socket address, when the server exposes it
    pub client_addr: Option<SocketAddr>,
}

impl RequestContext {
    /// Create a new request context
    pub fn new(provider: &str) -> Self {
        Self {
            trace_id: Uuid::new_v4().to_string()[..8].to_string(),
            start_time: Instant::now(),
            provider: provider.to_string(),
            model: "unknown".to_string(),
            client_addr: None,
        }
    }

    /// Set the model for this request
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the caller's address
    pub fn with_client_addr(mut self, addr: Option<SocketAddr>) -> Self {
        self.client_addr = addr;
        self
    }

    /// Get elapsed time in milliseconds
    pub fn elapsed_ms(&self) -> u128 {
        self.start_time.elapsed().as_millis()
    }

    fn client(&self) -> String {
        self.client_addr
            .map(|addr| addr.to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }

    /// Log request initiation
    pub fn log_request_start(&self) {
        info!(
            trace_id = %self.trace_id,
            client = %self.client(),
            model = %self.model,
            "Relaying request"
        );
    }

    /// Log request being sent to upstream
    pub fn log_upstream_request(&self, url: &str, body_size: usize) {
        debug!(
            trace_id = %self.trace_id,
            provider = %self.provider,
            url = %url,
            body_size = %body_size,
            elapsed_ms = %self.elapsed_ms(),
            "Sending request to upstream"
        );
    }

    /// Log response received from upstream
    pub fn log_upstream_response(&self, status: u16, body_size: usize) {
        info!(
            trace_id = %self.trace_id,
            provider = %self.provider,
            client = %self.client(),
            model = %self.model,
            status = %status,
            body_size = %body_size,
            elapsed_ms = %self.elapsed_ms(),
            "Response received from upstream"
        );
    }

    /// Log the assistant reply carried by a successful response
    pub fn log_reply_preview(&self, content: &str) {
        debug!(
            trace_id = %self.trace_id,
            reply = %content,
            "Upstream reply"
        );
    }

    /// Log request failure
    pub fn log_error(&self, error: &str) {
        error!(
            trace_id = %self.trace_id,
            provider = %self.provider,
            client = %self.client(),
            model = %self.model,
            elapsed_ms = %self.elapsed_ms(),
            error = %error,
            "Request failed"
        );
    }

    /// Log connection error (specific for debugging connectivity issues)
    pub fn log_connection_error(&self, error: &str, url: &str) {
        error!(
            trace_id = %self.trace_id,
            provider = %self.provider,
            client = %self.client(),
            model = %self.model,
            url = %url,
            elapsed_ms = %self.elapsed_ms(),
            error = %error,
            "Connection to upstream failed"
        );
    }

    /// Log timeout
    pub fn log_timeout(&self, timeout: Duration) {
        error!(
            trace_id = %self.trace_id,
            provider = %self.provider,
            client = %self.client(),
            model = %self.model,
            timeout_ms = %timeout.as_millis(),
            elapsed_ms = %self.elapsed_ms(),
            "Request to upstream timed out"
        );
    }
}
