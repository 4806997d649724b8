//! Permission and role guards for protected routes.
//!
//! Every guard is its own layer. Each one reads the `Authorization` header,
//! verifies the bearer token, checks one permission or one role, and stores
//! the verified claims in request extensions. A route protected by a
//! permission and a role therefore verifies the token twice, once per guard,
//! and the permission check always runs first.
//!
//! ```rust,ignore
//! let route = protect(
//!     post(movies::create_movie),
//!     &auth,
//!     &[Guard::Permission("create:movies"), Guard::Role("Executive Producer")],
//! );
//! ```

use crate::auth::{Claims, TokenValidator};
use crate::errors::{AuthError, CastingError};
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::{self, Next},
    response::Response,
    routing::MethodRouter,
};
use common::bearer::extract_bearer_token;
use std::sync::Arc;
use tracing::instrument;

/// State shared by all guards.
#[derive(Clone)]
pub struct AuthState {
    pub token_validator: Arc<TokenValidator>,
}

/// One authorization requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    /// Token must list this string in its `permissions` claim.
    Permission(&'static str),

    /// Token must list this string in its `roles` claim.
    Role(&'static str),
}

#[derive(Clone)]
struct GuardState {
    auth: Arc<AuthState>,
    guard: Guard,
}

/// Wrap `route` so that `guards` run in the given order before the handler.
pub fn protect<S>(route: MethodRouter<S>, auth: &Arc<AuthState>, guards: &[Guard]) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    // The last layer added runs first, so add them back to front.
    guards.iter().rev().fold(route, |route, guard| {
        let state = GuardState {
            auth: Arc::clone(auth),
            guard: *guard,
        };
        route.route_layer(middleware::from_fn_with_state(state, enforce_guard))
    })
}

#[instrument(skip_all, name = "casting.middleware.guard", fields(guard = ?state.guard))]
async fn enforce_guard(
    State(state): State<GuardState>,
    mut req: Request,
    next: Next,
) -> Result<Response, CastingError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = extract_bearer_token(header).map_err(|e| {
        tracing::debug!(target: "casting.middleware.auth", error = %e, "Rejected Authorization header");
        AuthError::from(e)
    })?;

    let claims = state.auth.token_validator.validate(token).await?;

    match state.guard {
        Guard::Permission(permission) => claims.check_permission(permission),
        Guard::Role(role) => claims.check_role(role),
    }
    .inspect_err(|e| {
        tracing::debug!(target: "casting.middleware.auth", guard = ?state.guard, error = %e, "Guard refused request");
    })?;

    req.extensions_mut().insert::<Claims>(claims);

    Ok(next.run(req).await)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::auth::JwksClient;
    use axum::{body::Body, http::StatusCode, routing::get, Router};
    use http_body_util::BodyExt;
    use std::time::Duration;
    use tower::ServiceExt;

    fn unreachable_auth() -> Arc<AuthState> {
        let jwks = Arc::new(JwksClient::new(
            "http://127.0.0.1:9/.well-known/jwks.json".to_string(),
            Duration::ZERO,
            Duration::from_secs(1),
        ));
        Arc::new(AuthState {
            token_validator: Arc::new(TokenValidator::new(
                jwks,
                "casting-api",
                "https://casting.us.auth0.com/",
                60,
            )),
        })
    }

    fn app() -> Router {
        let auth = unreachable_auth();
        Router::new().route(
            "/movies",
            protect(
                get(|| async { "movies" }),
                &auth,
                &[
                    Guard::Permission("create:movies"),
                    Guard::Role("Executive Producer"),
                ],
            ),
        )
    }

    async fn call(authorization: Option<&str>) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().uri("/movies");
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        let response = app()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_auth_state_is_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<AuthState>();
    }

    #[tokio::test]
    async fn test_missing_header() {
        let (status, body) = call(None).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "authorization_header_missing");
        assert_eq!(body["message"], "Authorization header is expected.");
    }

    #[tokio::test]
    async fn test_blank_header_is_missing() {
        let (status, body) = call(Some("   ")).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "authorization_header_missing");
    }

    #[tokio::test]
    async fn test_wrong_scheme() {
        let (status, body) = call(Some("Basic dXNlcjpwYXNz")).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "invalid_header");
        assert_eq!(body["message"], "Authorization header must start with Bearer.");
    }

    #[tokio::test]
    async fn test_bearer_without_token() {
        let (status, body) = call(Some("Bearer")).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Token not found.");
    }

    #[tokio::test]
    async fn test_too_many_parts() {
        let (status, body) = call(Some("Bearer a.b.c extra")).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Authorization header must be Bearer token.");
    }

    #[tokio::test]
    async fn test_unparseable_token() {
        let (status, body) = call(Some("Bearer not-a-jwt")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "invalid_header");
        assert_eq!(body["error"], 400);
    }

    #[tokio::test]
    async fn test_unreachable_key_set_fails_closed() {
        // header {"alg":"RS256","kid":"k1"}
        let token = "eyJhbGciOiJSUzI1NiIsImtpZCI6ImsxIn0.e30.c2ln";
        let (status, body) = call(Some(&format!("Bearer {token}"))).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "key_set_unavailable");
    }
}
