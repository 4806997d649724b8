//! Casting Agency
//!
//! Entry point for the movie and actor API. Startup order:
//! tracing, configuration, metrics recorder, database pool, migrations,
//! router, listener.

use casting_service::config::Config;
use casting_service::observability::metrics::init_metrics_recorder;
use casting_service::routes::{self, AppState};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default graceful-shutdown drain period.
const DEFAULT_DRAIN_SECONDS: u64 = 5;

/// Per-statement limit applied to every pooled connection.
const STATEMENT_TIMEOUT_SECONDS: u32 = 5;

const DEFAULT_LOG_FILTER: &str = "casting_service=debug,casting_agency=debug,tower_http=debug";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = Config::from_env().inspect_err(|e| {
        error!(target: "casting.startup", error = %e, "Invalid configuration");
    })?;

    info!(
        target: "casting.startup",
        bind_address = %config.bind_address,
        auth0_domain = %config.auth0_domain,
        jwks_url = %config.jwks_url,
        jwks_cache_ttl_seconds = config.jwks_cache_ttl_seconds,
        jwt_clock_skew_seconds = config.jwt_clock_skew_seconds,
        "Configuration loaded"
    );

    let metrics_handle = init_metrics_recorder().inspect_err(|e| {
        error!(target: "casting.startup", error = %e, "Metrics recorder unavailable");
    })?;

    let pool = connect_database(&config.database_url).await?;

    sqlx::migrate!("../../migrations")
        .run(&pool)
        .await
        .inspect_err(|e| {
            error!(target: "casting.startup", error = %e, "Schema migration failed");
        })?;
    info!(target: "casting.startup", "Movies and actors schema is current");

    let addr: SocketAddr = config.bind_address.parse().inspect_err(|e| {
        error!(target: "casting.startup", error = %e, "BIND_ADDRESS is not a socket address");
    })?;

    let app = routes::build_routes(Arc::new(AppState { pool, config }), metrics_handle);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(target: "casting.startup", %addr, "Casting Agency accepting requests");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!(target: "casting.startup", "Casting Agency stopped");
    Ok(())
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn connect_database(database_url: &str) -> Result<PgPool, sqlx::Error> {
    info!(target: "casting.startup", "Connecting to PostgreSQL");

    PgPoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(&with_statement_timeout(database_url, STATEMENT_TIMEOUT_SECONDS))
        .await
        .inspect_err(|e| {
            error!(target: "casting.startup", error = %e, "PostgreSQL unreachable");
        })
}

/// Waits for SIGINT or SIGTERM, then holds for `DRAIN_SECONDS` so in-flight
/// requests can finish.
async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(target: "casting.shutdown", error = %e, "Cannot listen for SIGINT");
            std::future::pending::<()>().await;
        }
        "SIGINT"
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(target: "casting.shutdown", error = %e, "Cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
        "SIGTERM"
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<&str>();

    let received = tokio::select! {
        name = interrupt => name,
        name = terminate => name,
    };

    let drain = drain_period(std::env::var("DRAIN_SECONDS").ok().as_deref());
    warn!(
        target: "casting.shutdown",
        signal = received,
        drain_seconds = drain.as_secs(),
        "Shutting down"
    );
    tokio::time::sleep(drain).await;
}

/// `DRAIN_SECONDS` as a duration; unset or unparseable falls back to the default.
fn drain_period(value: Option<&str>) -> Duration {
    let seconds = value
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(DEFAULT_DRAIN_SECONDS);
    Duration::from_secs(seconds)
}

/// Appends a libpq `statement_timeout` option to `url`.
fn with_statement_timeout(url: &str, seconds: u32) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}options=-c%20statement_timeout%3D{seconds}s")
}
