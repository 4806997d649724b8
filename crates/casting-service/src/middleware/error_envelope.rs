//! Error envelope for responses the handlers never saw.
//!
//! Framework layers such as `TimeoutLayer` answer with an
//! empty or plain-text body. This middleware rewrites any such 4xx/5xx into
//! the standard JSON envelope, keeping the status and the `Allow` header.

use axum::{
    extract::Request,
    http::header::{ALLOW, CONTENT_TYPE},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::errors::CastingError;

pub async fn error_envelope_middleware(request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    let status = response.status();

    if !(status.is_client_error() || status.is_server_error()) || is_json(&response) {
        return response;
    }

    tracing::debug!(target: "casting.middleware.envelope", status = status.as_u16(), "Enveloping bare error response");

    let allow = response.headers().get(ALLOW).cloned();
    let mut enveloped = CastingError::from_status(status).into_response();
    if let Some(allow) = allow {
        enveloped.headers_mut().insert(ALLOW, allow);
    }
    enveloped
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"))
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
    use http_body_util::BodyExt;
    use std::time::Duration;
    use tower::ServiceExt;
    use tower_http::timeout::TimeoutLayer;

    fn test_app() -> Router {
        Router::new()
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    "late"
                }),
            )
            .route("/plain", get(|| async { (StatusCode::PAYLOAD_TOO_LARGE, "too big") }))
            .route("/ok", get(|| async { "OK" }))
            .route(
                "/enveloped",
                get(|| async { CastingError::unprocessable() }),
            )
            .layer(TimeoutLayer::new(Duration::from_millis(20)))
            .layer(middleware::from_fn(error_envelope_middleware))
    }

    async fn send(method: &str, uri: &str) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
        let request = HttpRequest::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = test_app().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, headers, body.to_vec())
    }

    #[tokio::test]
    async fn test_timeout_is_enveloped() {
        let (status, headers, body) = send("GET", "/slow").await;

        assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "application/json");
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], 408);
        assert_eq!(json["code"], "request_timeout");
    }

    #[tokio::test]
    async fn test_default_method_not_allowed_is_enveloped_and_keeps_allow() {
        let (status, headers, body) = send("DELETE", "/ok").await;

        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert!(headers
            .get(ALLOW)
            .unwrap()
            .to_str()
            .unwrap()
            .contains("GET"));
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], 405);
        assert_eq!(json["code"], "method_not_allowed");
    }

    #[tokio::test]
    async fn test_plain_text_rejection_is_enveloped() {
        let (status, _, body) = send("GET", "/plain").await;

        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], 413);
        assert!(!String::from_utf8_lossy(&body).contains("too big"));
    }

    #[tokio::test]
    async fn test_success_and_json_errors_pass_through() {
        let (status, _, body) = send("GET", "/ok").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"OK");

        let (status, _, body) = send("GET", "/enveloped").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], "unprocessable");
    }
}
