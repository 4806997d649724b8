//! Movies repository.

use super::{abort, begin, commit, read_failed, record, release};
use crate::errors::CastingError;
use crate::models::{Movie, MovieChanges, NewMovie};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::time::Instant;
use tracing::instrument;

/// Movies repository for database operations.
pub struct MoviesRepository;

impl MoviesRepository {
    /// All movies ordered by id.
    #[instrument(skip_all, name = "casting.repo.list_movies")]
    pub async fn list(pool: &PgPool) -> Result<Vec<Movie>, CastingError> {
        let start = Instant::now();

        let movies = sqlx::query("SELECT id, title, release_date FROM movies ORDER BY id")
            .try_map(|row: PgRow| map_row_to_movie(&row))
            .fetch_all(pool)
            .await
            .map_err(|e| read_failed("list_movies", start, e))?;

        record("list_movies", start, true);
        Ok(movies)
    }

    /// The movie with `id`, if any.
    #[instrument(skip(pool), name = "casting.repo.find_movie")]
    pub async fn find(pool: &PgPool, id: i32) -> Result<Option<Movie>, CastingError> {
        let start = Instant::now();

        let movie = sqlx::query("SELECT id, title, release_date FROM movies WHERE id = $1")
            .bind(id)
            .try_map(|row: PgRow| map_row_to_movie(&row))
            .fetch_optional(pool)
            .await
            .map_err(|e| read_failed("find_movie", start, e))?;

        record("find_movie", start, true);
        Ok(movie)
    }

    /// Insert a movie and return it with its assigned id.
    #[instrument(skip_all, name = "casting.repo.create_movie")]
    pub async fn create(pool: &PgPool, movie: &NewMovie) -> Result<Movie, CastingError> {
        let start = Instant::now();
        let mut tx = begin(pool, "create_movie", start).await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO movies (title, release_date)
            VALUES ($1, $2)
            RETURNING id, title, release_date
            "#,
        )
        .bind(&movie.title)
        .bind(movie.release_date)
        .try_map(|row: PgRow| map_row_to_movie(&row))
        .fetch_one(&mut *tx)
        .await;

        match inserted {
            Ok(movie) => {
                commit(tx, "create_movie", start).await?;
                tracing::info!(target: "casting.repo.movies", movie_id = movie.id, "Movie created");
                Ok(movie)
            }
            Err(e) => Err(abort(tx, "create_movie", start, e).await),
        }
    }

    /// Apply `changes` to the movie with `id`.
    ///
    /// The row is locked with `SELECT ... FOR UPDATE` for the duration of the
    /// transaction. Returns `Ok(None)` if no movie has this id; `changes` is
    /// only called once the row exists, so an unknown id wins over a bad body.
    #[instrument(skip(pool, changes), name = "casting.repo.update_movie")]
    pub async fn update<F>(
        pool: &PgPool,
        id: i32,
        changes: F,
    ) -> Result<Option<Movie>, CastingError>
    where
        F: FnOnce() -> Result<MovieChanges, CastingError>,
    {
        let start = Instant::now();
        let mut tx = begin(pool, "update_movie", start).await?;

        let locked = sqlx::query("SELECT id, title, release_date FROM movies WHERE id = $1 FOR UPDATE")
            .bind(id)
            .try_map(|row: PgRow| map_row_to_movie(&row))
            .fetch_optional(&mut *tx)
            .await;

        let mut movie = match locked {
            Ok(Some(movie)) => movie,
            Ok(None) => {
                release(tx, "update_movie", start).await;
                return Ok(None);
            }
            Err(e) => return Err(abort(tx, "update_movie", start, e).await),
        };

        let changes = match changes() {
            Ok(changes) => changes,
            Err(e) => {
                release(tx, "update_movie", start).await;
                return Err(e);
            }
        };
        changes.apply(&mut movie);

        let written = sqlx::query(
            r#"
            UPDATE movies
            SET title = $2, release_date = $3
            WHERE id = $1
            RETURNING id, title, release_date
            "#,
        )
        .bind(id)
        .bind(&movie.title)
        .bind(movie.release_date)
        .try_map(|row: PgRow| map_row_to_movie(&row))
        .fetch_one(&mut *tx)
        .await;

        match written {
            Ok(movie) => {
                commit(tx, "update_movie", start).await?;
                Ok(Some(movie))
            }
            Err(e) => Err(abort(tx, "update_movie", start, e).await),
        }
    }

    /// Delete the movie with `id`. Returns whether a row was removed.
    #[instrument(skip(pool), name = "casting.repo.delete_movie")]
    pub async fn delete(pool: &PgPool, id: i32) -> Result<bool, CastingError> {
        let start = Instant::now();
        let mut tx = begin(pool, "delete_movie", start).await?;

        let deleted = sqlx::query("DELETE FROM movies WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await;

        match deleted {
            Ok(result) if result.rows_affected() == 0 => {
                release(tx, "delete_movie", start).await;
                Ok(false)
            }
            Ok(_) => {
                commit(tx, "delete_movie", start).await?;
                tracing::info!(target: "casting.repo.movies", movie_id = id, "Movie deleted");
                Ok(true)
            }
            Err(e) => Err(abort(tx, "delete_movie", start, e).await),
        }
    }
}

fn map_row_to_movie(row: &PgRow) -> Result<Movie, sqlx::Error> {
    Ok(Movie {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        release_date: row.try_get("release_date")?,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn new_movie(title: &str) -> NewMovie {
        NewMovie {
            title: title.to_string(),
            release_date: NaiveDate::from_ymd_opt(2024, 7, 20).unwrap(),
        }
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_create_find_list(pool: PgPool) {
        let a = MoviesRepository::create(&pool, &new_movie("A")).await.unwrap();
        let b = MoviesRepository::create(&pool, &new_movie("B")).await.unwrap();

        assert!(b.id > a.id);
        assert_eq!(
            MoviesRepository::find(&pool, a.id).await.unwrap(),
            Some(a.clone())
        );
        assert_eq!(MoviesRepository::list(&pool).await.unwrap(), vec![a, b]);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_create_title_too_long_is_unprocessable(pool: PgPool) {
        let err = MoviesRepository::create(&pool, &new_movie(&"x".repeat(81)))
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), 422);
        assert!(MoviesRepository::list(&pool).await.unwrap().is_empty());
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_update_applies_present_fields(pool: PgPool) {
        let movie = MoviesRepository::create(&pool, &new_movie("Old")).await.unwrap();

        let updated = MoviesRepository::update(
            &pool,
            movie.id,
            || {
                Ok(MovieChanges {
                    title: Some("New".to_string()),
                    release_date: None,
                })
            },
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(updated.title, "New");
        assert_eq!(updated.release_date, movie.release_date);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_update_unknown_id(pool: PgPool) {
        let result = MoviesRepository::update(&pool, 4242, || Ok(MovieChanges::default()))
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_update_unknown_id_skips_validation(pool: PgPool) {
        let result = MoviesRepository::update(&pool, 4242, || {
            Err(CastingError::unprocessable())
        })
        .await
        .unwrap();
        assert!(result.is_none());
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_update_validation_error_leaves_row_untouched(pool: PgPool) {
        let movie = MoviesRepository::create(&pool, &new_movie("Keep")).await.unwrap();

        let err = MoviesRepository::update(&pool, movie.id, || {
            Err(CastingError::BadRequest("Request body is not valid JSON.".to_string()))
        })
        .await
        .unwrap_err();

        assert_eq!(err.status_code(), 400);
        assert_eq!(
            MoviesRepository::find(&pool, movie.id).await.unwrap(),
            Some(movie)
        );
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_concurrent_updates_do_not_lose_writes(pool: PgPool) {
        let movie = MoviesRepository::create(&pool, &new_movie("Original")).await.unwrap();
        let premiere = NaiveDate::from_ymd_opt(2025, 12, 19).unwrap();

        let retitle = MoviesRepository::update(&pool, movie.id, || {
            Ok(MovieChanges {
                title: Some("Retitled".to_string()),
                release_date: None,
            })
        });
        let reschedule = MoviesRepository::update(&pool, movie.id, || {
            Ok(MovieChanges {
                title: None,
                release_date: Some(premiere),
            })
        });
        let (a, b) = tokio::join!(retitle, reschedule);
        a.unwrap().unwrap();
        b.unwrap().unwrap();

        let stored = MoviesRepository::find(&pool, movie.id).await.unwrap().unwrap();
        assert_eq!(stored.title, "Retitled");
        assert_eq!(stored.release_date, premiere);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_update_rolls_back_on_constraint_violation(pool: PgPool) {
        let movie = MoviesRepository::create(&pool, &new_movie("Keep")).await.unwrap();

        let err = MoviesRepository::update(
            &pool,
            movie.id,
            || {
                Ok(MovieChanges {
                    title: Some("y".repeat(200)),
                    release_date: None,
                })
            },
        )
        .await
        .unwrap_err();

        assert_eq!(err.status_code(), 422);
        assert_eq!(
            MoviesRepository::find(&pool, movie.id).await.unwrap().unwrap().title,
            "Keep"
        );
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_delete(pool: PgPool) {
        let movie = MoviesRepository::create(&pool, &new_movie("Gone")).await.unwrap();

        assert!(MoviesRepository::delete(&pool, movie.id).await.unwrap());
        assert!(!MoviesRepository::delete(&pool, movie.id).await.unwrap());
        assert!(MoviesRepository::find(&pool, movie.id).await.unwrap().is_none());
    }
}
