//! Casting Agency Service Library
//!
//! A CRUD API for movies and actors. Every resource endpoint sits behind
//! bearer-token guards: a permission check against the token's
//! `permissions` claim and, for writes, a role check against its `roles`
//! claim. Tokens are RS256 JWTs verified against the identity provider's
//! published key set.
//!
//! # Architecture
//!
//! ```text
//! routes/mod.rs -> middleware/auth.rs (guards) -> handlers/*.rs -> repositories/*.rs
//! ```
//!
//! # Modules
//!
//! - `auth` - Key-set client, token validator, claims
//! - `config` - Service configuration from environment
//! - `errors` - Error types with HTTP status code mapping
//! - `handlers` - HTTP request handlers
//! - `middleware` - Authorization guards and HTTP metrics
//! - `models` - Entities, request bodies, validation
//! - `observability` - Prometheus metrics
//! - `repositories` - Database access
//! - `routes` - Axum router setup

pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod repositories;
pub mod routes;
