//! HTTP request handlers for the Casting Agency service.

pub mod actors;
pub mod health;
pub mod login;
pub mod metrics;
pub mod movies;

pub use actors::{create_actor, delete_actor, get_actor, list_actors, update_actor};
pub use health::{health_check, index, readiness_check};
pub use login::login;
pub use metrics::metrics_handler;
pub use movies::{create_movie, delete_movie, get_movie, list_movies, update_movie};

use crate::errors::CastingError;
use axum::body::Bytes;
use axum::extract::{rejection::PathRejection, Path};
use serde::de::DeserializeOwned;
use serde_json::error::Category;

/// Deserialize a JSON request body.
///
/// Bodies that are not JSON at all become 400. Well-formed JSON of the wrong
/// shape becomes whatever `on_shape_error` returns, so create and update can
/// answer differently.
fn parse_body<T: DeserializeOwned>(
    body: &Bytes,
    on_shape_error: impl FnOnce() -> CastingError,
) -> Result<T, CastingError> {
    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!(target: "casting.handlers", error = %e, "Invalid request body");
        match e.classify() {
            Category::Data => on_shape_error(),
            Category::Syntax | Category::Eof | Category::Io => {
                CastingError::BadRequest("Request body is not valid JSON.".to_string())
            }
        }
    })
}

/// Resource ids are integers; anything else names no resource.
fn resource_id(path: Result<Path<i32>, PathRejection>) -> Result<i32, CastingError> {
    path.map(|Path(id)| id).map_err(|e| {
        tracing::debug!(target: "casting.handlers", error = %e, "Non-integer resource id");
        CastingError::resource_not_found()
    })
}
