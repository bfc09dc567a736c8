//! Liveness endpoint
//!
//! `GET /ping` reports that the process is up. It sits outside
//! authentication and rate limiting so monitors keep working while the
//! window is saturated, and it never touches the upstream.

use axum::{http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Fixed liveness payload
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct PingResponse {
    pub status: String,
}

/// Liveness probe endpoint
pub async fn ping() -> (StatusCode, Json<PingResponse>) {
    debug!("Ping received");
    (
        StatusCode::OK,
        Json(PingResponse {
            status: "ok".to_string(),
        }),
    )
}
