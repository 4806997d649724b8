//! Test server harness for E2E testing
//!
//! Provides `TestCastingServer` for spawning real Casting Agency server
//! instances in tests, wired to a mocked key set.

use crate::jwks_mock::MockJwks;
use crate::keys::TestKeypair;
use crate::tokens::{TestClaims, TEST_AUDIENCE, TEST_AUTH0_DOMAIN};
use casting_service::config::Config;
use casting_service::observability::metrics::init_metrics_recorder;
use casting_service::routes::{self, AppState, API_PREFIX};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use sqlx::PgPool;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use tokio::task::JoinHandle;

/// Global metrics handle for test servers
static TEST_METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn test_metrics_handle() -> PrometheusHandle {
    TEST_METRICS_HANDLE
        .get_or_init(|| {
            init_metrics_recorder()
                .unwrap_or_else(|_| PrometheusBuilder::new().build_recorder().handle())
        })
        .clone()
}

/// Test harness for spawning the Casting Agency server in E2E tests.
///
/// # Example
/// ```rust,ignore
/// #[sqlx::test(migrations = "../../migrations")]
/// async fn test_health_flow_e2e(pool: PgPool) -> Result<()> {
///     let server = TestCastingServer::spawn(pool).await?;
///
///     let response = reqwest::get(format!("{}/health", server.url())).await?;
///
///     assert_eq!(response.status(), 200);
///     Ok(())
/// }
/// ```
pub struct TestCastingServer {
    addr: SocketAddr,
    pool: PgPool,
    config: Config,
    jwks: MockJwks,
    _handle: JoinHandle<()>,
}

impl TestCastingServer {
    /// Spawn a server whose key set publishes `TestKeypair::primary()`.
    pub async fn spawn(pool: PgPool) -> Result<Self, anyhow::Error> {
        let jwks = MockJwks::publishing(&[TestKeypair::primary()]).await;
        Self::spawn_with(pool, jwks, &[]).await
    }

    /// Spawn a server against `jwks`, overriding config with `extra_vars`.
    ///
    /// The server will:
    /// - Bind to a random available port (127.0.0.1:0)
    /// - Start the HTTP server in the background
    pub async fn spawn_with(
        pool: PgPool,
        jwks: MockJwks,
        extra_vars: &[(&str, &str)],
    ) -> Result<Self, anyhow::Error> {
        let mut vars = HashMap::from([
            (
                "DATABASE_URL".to_string(),
                "postgresql://test/test".to_string(),
            ),
            ("BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string()),
            ("AUTH0_DOMAIN".to_string(), TEST_AUTH0_DOMAIN.to_string()),
            ("API_AUDIENCE".to_string(), TEST_AUDIENCE.to_string()),
            ("AUTH0_CLIENT_ID".to_string(), "test-client".to_string()),
            ("AUTH0_CLIENT_SECRET".to_string(), "test-secret".to_string()),
            ("JWKS_URL".to_string(), jwks.jwks_url()),
            ("JWKS_FETCH_TIMEOUT_SECONDS".to_string(), "2".to_string()),
        ]);
        for (name, value) in extra_vars {
            vars.insert((*name).to_string(), (*value).to_string());
        }

        let config = Config::from_vars(&vars)
            .map_err(|e| anyhow::anyhow!("Failed to create config: {}", e))?;

        let state = Arc::new(AppState {
            pool: pool.clone(),
            config: config.clone(),
        });

        let app = routes::build_routes(state, test_metrics_handle());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            pool,
            config,
            jwks,
            _handle: handle,
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Base URL of the test server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// URL of `path` under the API prefix, e.g. `api_url("/movies")`.
    pub fn api_url(&self, path: &str) -> String {
        format!("http://{}{}{}", self.addr, API_PREFIX, path)
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn jwks(&self) -> &MockJwks {
        &self.jwks
    }

    /// A token for `claims` signed with the published key.
    pub fn token(&self, claims: &TestClaims) -> String {
        TestKeypair::primary().sign(claims)
    }
}

impl Drop for TestCastingServer {
    fn drop(&mut self) {
        self._handle.abort();
    }
}
