//! Movie handlers.
//!
//! - `GET /casting_agency/v1.0/movies` - list movies
//! - `GET /casting_agency/v1.0/movies/{id}` - one movie
//! - `POST /casting_agency/v1.0/movies` - create movie (201)
//! - `PATCH /casting_agency/v1.0/movies/{id}` - partial update
//! - `DELETE /casting_agency/v1.0/movies/{id}` - delete movie (204)
//!
//! Authorization runs in the route guards before any handler here.

use super::{parse_body, resource_id};
use crate::errors::CastingError;
use crate::models::{
    CreateMovieRequest, Movie, MovieUpdated, UpdateMovieRequest, MOVIE_REQUIRED_MESSAGE,
};
use crate::repositories::MoviesRepository;
use crate::routes::AppState;
use axum::{
    body::Bytes,
    extract::{rejection::PathRejection, Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::instrument;

#[instrument(skip_all, name = "casting.movies.list")]
pub async fn list_movies(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Movie>>, CastingError> {
    let movies = MoviesRepository::list(&state.pool).await?;
    Ok(Json(movies))
}

#[instrument(skip_all, name = "casting.movies.get")]
pub async fn get_movie(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<Movie>, CastingError> {
    let id = resource_id(path)?;

    MoviesRepository::find(&state.pool, id)
        .await?
        .map(Json)
        .ok_or_else(CastingError::resource_not_found)
}

/// Handler for POST /casting_agency/v1.0/movies
///
/// # Response
///
/// - 201 Created: the stored movie
/// - 400 Bad Request: body is not JSON, a field is missing, or the date is invalid
/// - 422 Unprocessable Entity: the insert was rejected
#[instrument(skip_all, name = "casting.movies.create", fields(movie_id = tracing::field::Empty))]
pub async fn create_movie(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<(StatusCode, Json<Movie>), CastingError> {
    let request: CreateMovieRequest = parse_body(&body, || {
        CastingError::BadRequest(MOVIE_REQUIRED_MESSAGE.to_string())
    })?;
    let new_movie = request.validate()?;

    let movie = MoviesRepository::create(&state.pool, &new_movie).await?;
    tracing::Span::current().record("movie_id", movie.id);

    Ok((StatusCode::CREATED, Json(movie)))
}

/// Handler for PATCH /casting_agency/v1.0/movies/{id}
///
/// Only fields present in the body change. An empty body object returns the
/// movie unchanged.
///
/// # Response
///
/// - 200 OK: `{"success": true, "movie": {...}}`
/// - 400 Bad Request: body is not JSON
/// - 404 Not Found: unknown id
/// - 422 Unprocessable Entity: a present field is invalid or the write failed
#[instrument(skip_all, name = "casting.movies.update")]
pub async fn update_movie(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i32>, PathRejection>,
    body: Bytes,
) -> Result<Json<MovieUpdated>, CastingError> {
    let id = resource_id(path)?;
    // The body is only read once the row is known to exist.
    let changes = || {
        parse_body::<UpdateMovieRequest>(&body, CastingError::unprocessable)?.validate()
    };

    let movie = MoviesRepository::update(&state.pool, id, changes)
        .await?
        .ok_or_else(CastingError::resource_not_found)?;

    Ok(Json(MovieUpdated {
        success: true,
        movie,
    }))
}

#[instrument(skip_all, name = "casting.movies.delete")]
pub async fn delete_movie(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<StatusCode, CastingError> {
    let id = resource_id(path)?;

    if MoviesRepository::delete(&state.pool, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(CastingError::resource_not_found())
    }
}
