//! Actor handlers.
//!
//! Same shape as the movie handlers. Request bodies use `dob` for the birth
//! date; responses render it as `"date of birth"`.

use super::{parse_body, resource_id};
use crate::errors::CastingError;
use crate::models::{
    Actor, ActorUpdated, CreateActorRequest, UpdateActorRequest, ACTOR_REQUIRED_MESSAGE,
};
use crate::repositories::ActorsRepository;
use crate::routes::AppState;
use axum::{
    body::Bytes,
    extract::{rejection::PathRejection, Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::instrument;

#[instrument(skip_all, name = "casting.actors.list")]
pub async fn list_actors(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Actor>>, CastingError> {
    Ok(Json(ActorsRepository::list(&state.pool).await?))
}

#[instrument(skip_all, name = "casting.actors.get")]
pub async fn get_actor(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<Actor>, CastingError> {
    let id = resource_id(path)?;

    ActorsRepository::find(&state.pool, id)
        .await?
        .map(Json)
        .ok_or_else(CastingError::resource_not_found)
}

#[instrument(skip_all, name = "casting.actors.create", fields(actor_id = tracing::field::Empty))]
pub async fn create_actor(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<(StatusCode, Json<Actor>), CastingError> {
    let request: CreateActorRequest = parse_body(&body, || {
        CastingError::BadRequest(ACTOR_REQUIRED_MESSAGE.to_string())
    })?;
    let new_actor = request.validate()?;

    let actor = ActorsRepository::create(&state.pool, &new_actor).await?;
    tracing::Span::current().record("actor_id", actor.id);

    Ok((StatusCode::CREATED, Json(actor)))
}

#[instrument(skip_all, name = "casting.actors.update")]
pub async fn update_actor(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i32>, PathRejection>,
    body: Bytes,
) -> Result<Json<ActorUpdated>, CastingError> {
    let id = resource_id(path)?;
    // The body is only read once the row is known to exist.
    let changes = || {
        parse_body::<UpdateActorRequest>(&body, CastingError::unprocessable)?.validate()
    };

    let actor = ActorsRepository::update(&state.pool, id, changes)
        .await?
        .ok_or_else(CastingError::resource_not_found)?;

    Ok(Json(ActorUpdated {
        success: true,
        actor,
    }))
}

#[instrument(skip_all, name = "casting.actors.delete")]
pub async fn delete_actor(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<StatusCode, CastingError> {
    let id = resource_id(path)?;

    if ActorsRepository::delete(&state.pool, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(CastingError::resource_not_found())
    }
}
