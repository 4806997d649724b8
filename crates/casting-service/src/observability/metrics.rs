//! Prometheus metrics for the Casting Agency service.
//!
//! | Metric | Kind | Labels |
//! |---|---|---|
//! | `casting_http_requests_total` | counter | `method`, `endpoint`, `status_code` |
//! | `casting_http_request_duration_seconds` | histogram | `method`, `endpoint`, `class` |
//! | `casting_token_validations_total` | counter | `outcome` |
//! | `casting_jwks_fetches_total` | counter | `status` |
//! | `casting_jwks_fetch_duration_seconds` | histogram | |
//! | `casting_db_queries_total` | counter | `operation`, `status` |
//! | `casting_db_query_duration_seconds` | histogram | `operation` |
//!
//! Every label value comes from a closed set. Resource ids never reach a
//! label: `/casting_agency/v1.0/movies/42` is recorded as
//! `/casting_agency/v1.0/movies/{id}`, and unrouted paths as `/other`.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

const API_PREFIX: &str = "/casting_agency/v1.0";

const UNROUTED: &str = "/other";

/// Request latency buckets, 5ms to 2s.
const HTTP_BUCKETS: &[f64] = &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.0];

/// Key-set fetch buckets, up to the 5s default fetch timeout.
const JWKS_BUCKETS: &[f64] = &[0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0];

/// Query buckets, 1ms to 5s (the statement timeout).
const DB_BUCKETS: &[f64] = &[0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.5, 1.0, 5.0];

/// Install the global Prometheus recorder and return the handle `/metrics`
/// renders from.
///
/// # Errors
///
/// Fails when bucket configuration is rejected or a recorder is already
/// installed in this process.
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    let mut builder = PrometheusBuilder::new();
    for (prefix, buckets) in [
        ("casting_http_request", HTTP_BUCKETS),
        ("casting_jwks_fetch", JWKS_BUCKETS),
        ("casting_db_query", DB_BUCKETS),
    ] {
        builder = builder
            .set_buckets_for_metric(Matcher::Prefix(prefix.to_string()), buckets)
            .map_err(|e| format!("Invalid buckets for {prefix}: {e}"))?;
    }

    builder
        .install_recorder()
        .map_err(|e| format!("Cannot install Prometheus recorder: {e}"))
}

// ============================================================================
// HTTP
// ============================================================================

/// Count one finished request and record its latency.
pub fn record_http_request(method: &str, path: &str, status_code: u16, duration: Duration) {
    let endpoint = endpoint_label(path);

    histogram!("casting_http_request_duration_seconds",
        "method" => method.to_string(),
        "endpoint" => endpoint.clone(),
        "class" => status_class(status_code)
    )
    .record(duration.as_secs_f64());

    counter!("casting_http_requests_total",
        "method" => method.to_string(),
        "endpoint" => endpoint,
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

/// Coarse bucket for a status code. 408 and 504 are split out so slow
/// dependencies are visible apart from ordinary server errors.
fn status_class(status_code: u16) -> &'static str {
    match status_code {
        408 | 504 => "timeout",
        100..=399 => "success",
        400..=499 => "client_error",
        _ => "server_error",
    }
}

/// Route template for `path`.
fn endpoint_label(path: &str) -> String {
    if matches!(path, "/" | "/health" | "/ready" | "/metrics" | "/login") {
        return path.to_string();
    }

    let Some(rest) = path.strip_prefix(API_PREFIX) else {
        return UNROUTED.to_string();
    };

    let segments: Vec<&str> = rest.trim_start_matches('/').split('/').collect();
    match segments.as_slice() {
        [resource @ ("movies" | "actors")] => format!("{API_PREFIX}/{resource}"),
        [resource @ ("movies" | "actors"), _id] => format!("{API_PREFIX}/{resource}/{{id}}"),
        _ => UNROUTED.to_string(),
    }
}

// ============================================================================
// Authentication
// ============================================================================

/// Count one token verification. `outcome` is "success" or an `AuthError` code.
pub fn record_token_validation(outcome: &str) {
    counter!("casting_token_validations_total", "outcome" => outcome.to_string()).increment(1);
}

/// Record one key-set fetch. `status` is "success" or "error".
pub fn record_jwks_fetch(status: &str, duration: Duration) {
    histogram!("casting_jwks_fetch_duration_seconds").record(duration.as_secs_f64());
    counter!("casting_jwks_fetches_total", "status" => status.to_string()).increment(1);
}

// ============================================================================
// Database
// ============================================================================

/// Record one repository call, e.g. `("update_actor", "success", ..)`.
pub fn record_db_query(operation: &str, status: &str, duration: Duration) {
    histogram!("casting_db_query_duration_seconds", "operation" => operation.to_string())
        .record(duration.as_secs_f64());

    counter!("casting_db_queries_total",
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}
