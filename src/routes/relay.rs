//! Chat-completion relay endpoint
//!
//! `POST /api/openai` forwards an authorized, admitted JSON body to the
//! upstream and relays the upstream status and body unchanged. Runs behind
//! the auth and rate limit middleware.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Request, State},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use serde_json::Value;

use crate::{
    error::{AppError, AppResult},
    proxy::{RequestContext, UpstreamReply},
    routes::metrics::record_outcome,
    AppState,
};

/// Largest request body accepted for relaying
pub const MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

/// Relay handler
///
/// If the caller disconnects, this future is dropped and the in-flight
/// upstream request with it.
pub async fn relay_chat(State(state): State<Arc<AppState>>, request: Request) -> Response {
    let client_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    match relay(&state, client_addr, request).await {
        Ok(reply) => {
            record_outcome("relayed");
            reply.into_response()
        }
        Err(e) => {
            record_outcome(e.outcome());
            e.into_response()
        }
    }
}

async fn relay(
    state: &AppState,
    client_addr: Option<SocketAddr>,
    request: Request,
) -> AppResult<UpstreamReply> {
    let ctx = RequestContext::new(state.provider.name()).with_client_addr(client_addr);

    let body = axum::body::to_bytes(request.into_body(), MAX_BODY_BYTES)
        .await
        .map_err(|e| {
            ctx.log_error(&e.to_string());
            AppError::BadRequest(format!("Failed to read request body: {}", e))
        })?;

    let model = match request_model(&body) {
        Ok(model) => model,
        Err(e) => {
            ctx.log_error(&e.to_string());
            return Err(e);
        }
    };

    let ctx = ctx.with_model(model);
    ctx.log_request_start();

    state.provider.relay(body, &ctx).await
}

/// Validate the body as a JSON object and pull out its model name
fn request_model(body: &Bytes) -> AppResult<String> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| AppError::BadRequest(format!("Invalid JSON body: {}", e)))?;

    let object = value
        .as_object()
        .ok_or_else(|| AppError::BadRequest("Request body must be a JSON object".to_string()))?;

    Ok(object
        .get("model")
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string())
}
