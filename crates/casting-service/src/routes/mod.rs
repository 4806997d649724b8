//! HTTP routes for the Casting Agency service.
//!
//! Defines the Axum router and application state.

use crate::auth::TokenValidator;
use crate::config::Config;
use crate::errors::CastingError;
use crate::handlers;
use crate::middleware::{
    error_envelope_middleware, http_metrics_middleware, protect, AuthState, Guard,
};
use axum::{
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, AUTHORIZATION,
            CONTENT_TYPE,
        },
        HeaderValue, Method,
    },
    middleware,
    routing::{delete, get, patch, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

/// Prefix for the movie and actor API.
pub const API_PREFIX: &str = "/casting_agency/v1.0";

pub const EXECUTIVE_PRODUCER: &str = "Executive Producer";
pub const CASTING_DIRECTOR: &str = "Casting Director";

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: PgPool,

    /// Service configuration.
    pub config: Config,
}

/// Build the application routes.
///
/// - `/`, `/health`, `/ready`, `/metrics`, `/login` - public
/// - `/casting_agency/v1.0/movies[/{id}]` and `/casting_agency/v1.0/actors[/{id}]` -
///   each method behind its permission guard and, for writes, a role guard
/// - unmatched paths - 404 envelope; unsupported methods - 405 envelope
/// - CORS, TraceLayer, 30 second request timeout, HTTP metrics
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let token_validator = Arc::new(TokenValidator::from_config(&state.config));
    let auth = Arc::new(AuthState { token_validator });

    let public_routes = Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/login", get(handlers::login))
        .with_state(state.clone());

    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    let api_routes = Router::new()
        .nest(API_PREFIX, movie_routes(&auth).merge(actor_routes(&auth)))
        .with_state(state);

    // Layer order (bottom-to-top execution):
    // 1. TimeoutLayer (innermost)
    // 2. TraceLayer
    // 3. error_envelope_middleware (turns the bare 408 into an envelope)
    // 4. CORS headers
    // 5. http_metrics_middleware (outermost)
    public_routes
        .merge(metrics_routes)
        .merge(api_routes)
        .fallback(route_not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(error_envelope_middleware))
        .layer(SetResponseHeaderLayer::if_not_present(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type, Authorization"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET, POST, PATCH, DELETE, OPTIONS"),
        ))
        .layer(cors_layer())
        .layer(middleware::from_fn(http_metrics_middleware))
}

fn movie_routes(auth: &Arc<AuthState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/movies",
            protect(
                get(handlers::list_movies),
                auth,
                &[Guard::Permission("get:movies")],
            )
            .merge(protect(
                post(handlers::create_movie),
                auth,
                &[
                    Guard::Permission("create:movies"),
                    Guard::Role(EXECUTIVE_PRODUCER),
                ],
            )),
        )
        .route(
            "/movies/:id",
            protect(
                get(handlers::get_movie),
                auth,
                &[Guard::Permission("get:movies")],
            )
            .merge(protect(
                patch(handlers::update_movie),
                auth,
                &[
                    Guard::Permission("update:movie"),
                    Guard::Role(EXECUTIVE_PRODUCER),
                ],
            ))
            .merge(protect(
                delete(handlers::delete_movie),
                auth,
                &[
                    Guard::Permission("delete:movies"),
                    Guard::Role(EXECUTIVE_PRODUCER),
                ],
            )),
        )
}

fn actor_routes(auth: &Arc<AuthState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/actors",
            protect(
                get(handlers::list_actors),
                auth,
                &[Guard::Permission("get:actors")],
            )
            .merge(protect(
                post(handlers::create_actor),
                auth,
                &[
                    Guard::Permission("create:actors"),
                    Guard::Role(CASTING_DIRECTOR),
                ],
            )),
        )
        .route(
            "/actors/:id",
            protect(
                get(handlers::get_actor),
                auth,
                &[Guard::Permission("get:actors")],
            )
            .merge(protect(
                patch(handlers::update_actor),
                auth,
                &[
                    Guard::Permission("update:actors"),
                    Guard::Role(CASTING_DIRECTOR),
                ],
            ))
            .merge(protect(
                delete(handlers::delete_actor),
                auth,
                &[
                    Guard::Permission("delete:actors"),
                    Guard::Role(CASTING_DIRECTOR),
                ],
            )),
        )
}

/// Answers preflight requests. Plain responses get their headers from the
/// `SetResponseHeaderLayer`s.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
}

async fn route_not_found() -> CastingError {
    CastingError::resource_not_found()
}

async fn method_not_allowed() -> CastingError {
    CastingError::MethodNotAllowed
}
