//! Observability for the Casting Agency service.
//!
//! Prometheus metrics are exposed on `/metrics`. Logging is configured in
//! `main.rs` through `tracing-subscriber`.

pub mod metrics;
