//! Prometheus metrics endpoint
//!
//! Exposes request outcomes and upstream latency in Prometheus format.

use std::time::Duration;

use axum::response::IntoResponse;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::Lazy;
use tracing::warn;

/// Global Prometheus handle for metrics export
///
/// `None` when another recorder was installed first; metrics calls are then
/// routed to that recorder and this endpoint renders nothing.
static PROMETHEUS_HANDLE: Lazy<Option<PrometheusHandle>> = Lazy::new(|| {
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!(error = %e, "Failed to install Prometheus recorder");
            None
        }
    }
});

/// Initialize metrics (call once at startup)
pub fn init_metrics() {
    Lazy::force(&PROMETHEUS_HANDLE);

    metrics::describe_counter!(
        "keyhole_requests_total",
        "Requests to the relay endpoint by outcome"
    );
    metrics::describe_histogram!(
        "keyhole_upstream_duration_seconds",
        "Time spent waiting on the upstream API"
    );
}

/// Prometheus metrics endpoint handler
pub async fn prometheus_metrics() -> impl IntoResponse {
    PROMETHEUS_HANDLE
        .as_ref()
        .map(PrometheusHandle::render)
        .unwrap_or_default()
}

/// Record the outcome of a relay request
pub fn record_outcome(outcome: &'static str) {
    metrics::counter!("keyhole_requests_total", "outcome" => outcome).increment(1);
}

/// Record how long an upstream call took
pub fn record_upstream_duration(duration: Duration) {
    metrics::histogram!("keyhole_upstream_duration_seconds").record(duration.as_secs_f64());
}
