//! Actors repository.

use super::{abort, begin, commit, read_failed, record, release};
use crate::errors::CastingError;
use crate::models::{Actor, ActorChanges, NewActor};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::time::Instant;
use tracing::instrument;

/// Actors repository for database operations.
///
/// The birth date column is `dob`.
pub struct ActorsRepository;

impl ActorsRepository {
    #[instrument(skip_all, name = "casting.repo.list_actors")]
    pub async fn list(pool: &PgPool) -> Result<Vec<Actor>, CastingError> {
        let start = Instant::now();

        let actors = sqlx::query("SELECT id, name, dob, gender FROM actors ORDER BY id")
            .try_map(|row: PgRow| map_row_to_actor(&row))
            .fetch_all(pool)
            .await
            .map_err(|e| read_failed("list_actors", start, e))?;

        record("list_actors", start, true);
        Ok(actors)
    }

    #[instrument(skip(pool), name = "casting.repo.find_actor")]
    pub async fn find(pool: &PgPool, id: i32) -> Result<Option<Actor>, CastingError> {
        let start = Instant::now();

        let actor = sqlx::query("SELECT id, name, dob, gender FROM actors WHERE id = $1")
            .bind(id)
            .try_map(|row: PgRow| map_row_to_actor(&row))
            .fetch_optional(pool)
            .await
            .map_err(|e| read_failed("find_actor", start, e))?;

        record("find_actor", start, true);
        Ok(actor)
    }

    #[instrument(skip_all, name = "casting.repo.create_actor")]
    pub async fn create(pool: &PgPool, actor: &NewActor) -> Result<Actor, CastingError> {
        let start = Instant::now();
        let mut tx = begin(pool, "create_actor", start).await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO actors (name, dob, gender)
            VALUES ($1, $2, $3)
            RETURNING id, name, dob, gender
            "#,
        )
        .bind(&actor.name)
        .bind(actor.date_of_birth)
        .bind(&actor.gender)
        .try_map(|row: PgRow| map_row_to_actor(&row))
        .fetch_one(&mut *tx)
        .await;

        match inserted {
            Ok(actor) => {
                commit(tx, "create_actor", start).await?;
                tracing::info!(target: "casting.repo.actors", actor_id = actor.id, "Actor created");
                Ok(actor)
            }
            Err(e) => Err(abort(tx, "create_actor", start, e).await),
        }
    }

    /// Apply `changes` to the actor with `id` under a row lock.
    ///
    /// Returns `Ok(None)` if no actor has this id, without calling `changes`.
    #[instrument(skip(pool, changes), name = "casting.repo.update_actor")]
    pub async fn update<F>(
        pool: &PgPool,
        id: i32,
        changes: F,
    ) -> Result<Option<Actor>, CastingError>
    where
        F: FnOnce() -> Result<ActorChanges, CastingError>,
    {
        let start = Instant::now();
        let mut tx = begin(pool, "update_actor", start).await?;

        let locked =
            sqlx::query("SELECT id, name, dob, gender FROM actors WHERE id = $1 FOR UPDATE")
                .bind(id)
                .try_map(|row: PgRow| map_row_to_actor(&row))
                .fetch_optional(&mut *tx)
                .await;

        let mut actor = match locked {
            Ok(Some(actor)) => actor,
            Ok(None) => {
                release(tx, "update_actor", start).await;
                return Ok(None);
            }
            Err(e) => return Err(abort(tx, "update_actor", start, e).await),
        };

        let changes = match changes() {
            Ok(changes) => changes,
            Err(e) => {
                release(tx, "update_actor", start).await;
                return Err(e);
            }
        };
        changes.apply(&mut actor);

        let written = sqlx::query(
            r#"
            UPDATE actors
            SET name = $2, dob = $3, gender = $4
            WHERE id = $1
            RETURNING id, name, dob, gender
            "#,
        )
        .bind(id)
        .bind(&actor.name)
        .bind(actor.date_of_birth)
        .bind(&actor.gender)
        .try_map(|row: PgRow| map_row_to_actor(&row))
        .fetch_one(&mut *tx)
        .await;

        match written {
            Ok(actor) => {
                commit(tx, "update_actor", start).await?;
                Ok(Some(actor))
            }
            Err(e) => Err(abort(tx, "update_actor", start, e).await),
        }
    }

    /// Delete the actor with `id`. Returns whether a row was removed.
    #[instrument(skip(pool), name = "casting.repo.delete_actor")]
    pub async fn delete(pool: &PgPool, id: i32) -> Result<bool, CastingError> {
        let start = Instant::now();
        let mut tx = begin(pool, "delete_actor", start).await?;

        let deleted = sqlx::query("DELETE FROM actors WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await;

        match deleted {
            Ok(result) if result.rows_affected() == 0 => {
                release(tx, "delete_actor", start).await;
                Ok(false)
            }
            Ok(_) => {
                commit(tx, "delete_actor", start).await?;
                tracing::info!(target: "casting.repo.actors", actor_id = id, "Actor deleted");
                Ok(true)
            }
            Err(e) => Err(abort(tx, "delete_actor", start, e).await),
        }
    }
}

fn map_row_to_actor(row: &PgRow) -> Result<Actor, sqlx::Error> {
    Ok(Actor {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        date_of_birth: row.try_get("dob")?,
        gender: row.try_get("gender")?,
    })
}
