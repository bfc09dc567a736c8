//! Header utilities for upstream relaying
//!
//! Outbound requests carry only the upstream credential and a JSON content
//! type; no client header (including the shared `X-API-Token`) is ever
//! forwarded. Inbound replies keep only their content type, so upstream
//! account details in response headers stay on the server side.

use axum::http::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

use crate::error::{AppError, AppResult};

/// Build the headers for an upstream request
pub fn build_default_headers(api_key: &str) -> AppResult<HeaderMap> {
    let mut bearer = HeaderValue::from_str(&format!("Bearer {}", api_key)).map_err(|_| {
        AppError::Internal(anyhow::anyhow!(
            "Upstream API key contains characters not allowed in a header"
        ))
    })?;
    bearer.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, bearer);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    Ok(headers)
}

/// Content type to relay back to the caller
pub fn relay_content_type(upstream: &HeaderMap) -> HeaderValue {
    upstream
        .get(CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("application/json"))
}
