//! Common utilities shared across the Casting Agency crates.

#![warn(clippy::pedantic)]

/// Module for `Authorization: Bearer` header parsing
pub mod bearer;

/// Module for JWT header utilities (size limit, key ID, clock skew bounds)
pub mod jwt;

/// Module for secret types that prevent accidental logging
pub mod secret;
