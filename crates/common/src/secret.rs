//! Redacted string type for credentials held in configuration.
//!
//! Re-exports [`secrecy`] types. `SecretString` implements `Debug` with
//! redaction, so any struct that derives or hand-writes `Debug` over one stays
//! safe to log. Use it for the identity-provider client secret and anything
//! else that must not reach logs.
//!
//! ```rust
//! use common::secret::{ExposeSecret, SecretString};
//!
//! #[derive(Debug)]
//! struct ClientCredentials {
//!     client_id: String,
//!     client_secret: SecretString,
//! }
//!
//! let creds = ClientCredentials {
//!     client_id: "casting-agency".to_string(),
//!     client_secret: SecretString::from("s3cr3t"),
//! };
//!
//! assert!(!format!("{creds:?}").contains("s3cr3t"));
//! assert_eq!(creds.client_secret.expose_secret(), "s3cr3t");
//! ```

pub use secrecy::{ExposeSecret, SecretString};
