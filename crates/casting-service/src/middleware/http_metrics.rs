//! HTTP metrics middleware.
//!
//! Applied as the outermost layer so every response is counted, including
//! guard refusals, path rejections, the 404 fallback, and 408 timeouts.

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

use crate::observability::metrics::record_http_request;

/// Record method, normalized path, status and duration for each request.
pub async fn http_metrics_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    record_http_request(&method, &path, response.status().as_u16(), start.elapsed());

    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request as HttpRequest, StatusCode},
        middleware,
        routing::get,
        Router,
    };
    use metrics_util::debugging::{DebugValue, DebuggingRecorder};
    use tower::ServiceExt;

    fn test_app() -> Router {
        Router::new()
            .route("/health", get(|| async { "OK" }))
            .route(
                "/casting_agency/v1.0/movies/:id",
                get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "Error") }),
            )
            .layer(middleware::from_fn(http_metrics_middleware))
    }

    async fn send(uri: &str) -> StatusCode {
        let request = HttpRequest::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .expect("request builder should succeed");

        test_app()
            .oneshot(request)
            .await
            .expect("request should succeed")
            .status()
    }

    #[tokio::test]
    async fn test_middleware_passes_responses_through() {
        assert_eq!(send("/health").await, StatusCode::OK);
        assert_eq!(
            send("/casting_agency/v1.0/movies/5").await,
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(send("/nonexistent").await, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_middleware_records_normalized_endpoint() {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();

        metrics::with_local_recorder(&recorder, || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("runtime should build");
            runtime.block_on(async {
                send("/casting_agency/v1.0/movies/5").await;
                send("/casting_agency/v1.0/movies/6").await;
            });
        });

        let count = snapshotter
            .snapshot()
            .into_vec()
            .into_iter()
            .find_map(|(key, _, _, value)| {
                let matches = key.key().name() == "casting_http_requests_total"
                    && key.key().labels().any(|l| {
                        l.key() == "endpoint" && l.value() == "/casting_agency/v1.0/movies/{id}"
                    });
                match value {
                    DebugValue::Counter(n) if matches => Some(n),
                    _ => None,
                }
            });

        assert_eq!(count, Some(2));
    }
}
