//! Database repositories for the Casting Agency service.
//!
//! Reads run directly on the pool and surface failures as
//! `CastingError::Database` (500). Writes run in a transaction; any failure
//! rolls it back explicitly and surfaces as `CastingError::Unprocessable`
//! (422).

pub mod actors;
pub mod movies;

pub use actors::ActorsRepository;
pub use movies::MoviesRepository;

use crate::errors::CastingError;
use crate::observability::metrics;
use sqlx::{Postgres, Transaction};
use std::time::Instant;

fn record(operation: &str, start: Instant, ok: bool) {
    let status = if ok { "success" } else { "error" };
    metrics::record_db_query(operation, status, start.elapsed());
}

/// Map a read-side failure to a 500.
fn read_failed(operation: &str, start: Instant, err: sqlx::Error) -> CastingError {
    record(operation, start, false);
    CastingError::from(err)
}

/// Open a write transaction, mapping failure to a 422.
async fn begin(
    pool: &sqlx::PgPool,
    operation: &str,
    start: Instant,
) -> Result<Transaction<'static, Postgres>, CastingError> {
    pool.begin().await.map_err(|e| {
        tracing::error!(target: "casting.repo", operation, error = %e, "Failed to begin transaction");
        record(operation, start, false);
        CastingError::unprocessable()
    })
}

/// Commit `tx`, mapping failure to a 422.
async fn commit(
    tx: Transaction<'static, Postgres>,
    operation: &str,
    start: Instant,
) -> Result<(), CastingError> {
    match tx.commit().await {
        Ok(()) => {
            record(operation, start, true);
            Ok(())
        }
        Err(e) => {
            tracing::error!(target: "casting.repo", operation, error = %e, "Failed to commit transaction");
            record(operation, start, false);
            Err(CastingError::unprocessable())
        }
    }
}

/// Roll `tx` back after `err` and return the 422 the caller should surface.
async fn abort(
    tx: Transaction<'static, Postgres>,
    operation: &str,
    start: Instant,
    err: sqlx::Error,
) -> CastingError {
    tracing::warn!(target: "casting.repo", operation, error = %err, "Write failed, rolling back");
    if let Err(e) = tx.rollback().await {
        tracing::error!(target: "casting.repo", operation, error = %e, "Rollback failed");
    }
    record(operation, start, false);
    CastingError::unprocessable()
}

/// Roll `tx` back when there was nothing to write (unknown id).
async fn release(tx: Transaction<'static, Postgres>, operation: &str, start: Instant) {
    if let Err(e) = tx.rollback().await {
        tracing::warn!(target: "casting.repo", operation, error = %e, "Rollback failed");
    }
    record(operation, start, true);
}
