//! HTTP middleware for the Casting Agency service.
//!
//! - `auth` - permission and role guards for protected routes
//! - `error_envelope` - JSON envelope for bare framework error responses
//! - `http_metrics` - request metrics for every response

pub mod auth;
pub mod error_envelope;
pub mod http_metrics;

pub use auth::{protect, AuthState, Guard};
pub use error_envelope::error_envelope_middleware;
pub use http_metrics::http_metrics_middleware;
