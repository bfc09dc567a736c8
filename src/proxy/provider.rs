//! Upstream provider abstraction
//!
//! Defines the trait the relay handler forwards through, so the real
//! chat-completion client and test doubles are interchangeable.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, HeaderValue, Response, StatusCode},
    response::IntoResponse,
};
use bytes::Bytes;

use crate::{error::AppResult, proxy::logging::RequestContext};

/// Reply received from the upstream, relayed to the caller as-is
#[derive(Debug, Clone)]
pub struct UpstreamReply {
    pub status: StatusCode,
    pub content_type: HeaderValue,
    pub body: Bytes,
}

impl IntoResponse for UpstreamReply {
    fn into_response(self) -> axum::response::Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, self.content_type);
        response
    }
}

/// Trait defining the interface for upstream chat-completion providers
///
/// # Security
///
/// Implementations MUST:
/// - Attach their own credential and never forward client headers
/// - Keep the credential out of every error message they return
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Get the provider name for logging
    fn name(&self) -> &'static str;

    /// Forward an opaque JSON body and return the upstream reply
    ///
    /// Any HTTP status from the upstream is a successful relay; only
    /// timeouts and transport failures are errors.
    async fn relay(&self, body: Bytes, ctx: &RequestContext) -> AppResult<UpstreamReply>;
}
