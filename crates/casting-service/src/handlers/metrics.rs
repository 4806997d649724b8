//! Prometheus metrics endpoint handler.
//!
//! Unauthenticated so Prometheus can scrape it. Labels carry no user data.

use axum::{extract::State, response::IntoResponse};
use metrics_exporter_prometheus::PrometheusHandle;

/// Handler for GET /metrics
///
/// ```text
/// # TYPE casting_http_requests_total counter
/// casting_http_requests_total{method="GET",endpoint="/casting_agency/v1.0/movies",status_code="200"} 42
/// ```
#[tracing::instrument(skip_all, name = "casting.metrics.scrape")]
pub async fn metrics_handler(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    handle.render()
}
