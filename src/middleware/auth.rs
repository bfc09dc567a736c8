//! Authentication middleware
//!
//! Validates the shared `X-API-Token` header against the configured secret.
//! Missing and wrong tokens are indistinguishable to the caller.

use std::sync::Arc;

use anyhow::{bail, Result};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, instrument, warn};

use crate::{error::AppError, routes::metrics::record_outcome, AppState};

/// Header carrying the shared token
pub const API_TOKEN_HEADER: &str = "x-api-token";

/// Shared-secret authenticator
///
/// Holds the single process-wide token. Construction fails on an empty
/// secret so the proxy can never run with authentication silently disabled.
#[derive(Debug)]
pub struct Authenticator {
    token: SecretString,
}

impl Authenticator {
    /// Create an authenticator, rejecting an empty secret
    pub fn new(token: SecretString) -> Result<Self> {
        if token.expose_secret().is_empty() {
            bail!("shared proxy token must not be empty");
        }
        Ok(Self { token })
    }

    /// Whether the presented header value matches the shared secret exactly
    pub fn is_authorized(&self, presented: Option<&[u8]>) -> bool {
        match presented {
            Some(value) => value == self.token.expose_secret().as_bytes(),
            None => false,
        }
    }
}

/// Authentication middleware
///
/// Rejects the request with 401 before any later stage runs.
#[instrument(skip_all, fields(path = %request.uri().path()))]
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let presented = request
        .headers()
        .get(API_TOKEN_HEADER)
        .map(|value| value.as_bytes());

    if !state.authenticator.is_authorized(presented) {
        warn!(token_present = presented.is_some(), "Rejected request with invalid API token");
        let err = AppError::Unauthorized;
        record_outcome(err.outcome());
        return Err(err);
    }

    debug!("Request authenticated");
    Ok(next.run(request).await)
}
