//! # Casting Test Utilities
//!
//! Shared test utilities for the Casting Agency service.
//!
//! This crate provides:
//! - RSA test keypairs that sign RS256 tokens (`TestKeypair`)
//! - Claim builders for the three agency personas (`TestClaims`)
//! - A mocked identity-provider key set (`MockJwks`)
//! - Server test harness (`TestCastingServer` for E2E tests)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use casting_test_utils::*;
//!
//! #[sqlx::test(migrations = "../../migrations")]
//! async fn test_example(pool: PgPool) -> Result<()> {
//!     let server = TestCastingServer::spawn(pool).await?;
//!     let token = server.token(&TestClaims::casting_assistant());
//!
//!     let response = reqwest::Client::new()
//!         .get(server.api_url("/movies"))
//!         .bearer_auth(token)
//!         .send()
//!         .await?;
//!
//!     assert_eq!(response.status(), 200);
//!     Ok(())
//! }
//! ```

pub mod jwks_mock;
pub mod keys;
pub mod server_harness;
pub mod tokens;

// Re-export commonly used items
pub use jwks_mock::*;
pub use keys::*;
pub use server_harness::*;
pub use tokens::*;
