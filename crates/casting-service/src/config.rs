//! Casting Agency configuration.
//!
//! Configuration is loaded from environment variables. The database URL and
//! the identity-provider client secret are redacted in Debug output.

use common::jwt::{DEFAULT_CLOCK_SKEW, MAX_CLOCK_SKEW};
use common::secret::SecretString;
use std::collections::HashMap;
use std::env;
use std::fmt;
use thiserror::Error;

/// Default server bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Default `/login` redirect target.
pub const DEFAULT_CALLBACK_URL: &str = "http://localhost:8080/";

/// Default JWKS cache TTL. Zero fetches the key set on every verification.
pub const DEFAULT_JWKS_CACHE_TTL_SECONDS: u64 = 0;

/// Default timeout for a single JWKS fetch.
pub const DEFAULT_JWKS_FETCH_TIMEOUT_SECONDS: u64 = 5;

/// Upper bound on the JWKS fetch timeout.
pub const MAX_JWKS_FETCH_TIMEOUT_SECONDS: u64 = 60;

/// Casting Agency service configuration.
#[derive(Clone)]
pub struct Config {
    /// PostgreSQL connection URL.
    pub database_url: String,

    /// Server bind address (default: "0.0.0.0:8080").
    pub bind_address: String,

    /// Identity provider domain, e.g. `casting-agency.us.auth0.com`.
    pub auth0_domain: String,

    /// Expected `aud` claim.
    pub api_audience: String,

    /// OAuth client ID used to build the login redirect.
    pub client_id: String,

    /// OAuth client secret.
    pub client_secret: SecretString,

    /// Where the identity provider sends the browser after login.
    pub callback_url: String,

    /// JWKS endpoint (default: `https://{auth0_domain}/.well-known/jwks.json`).
    pub jwks_url: String,

    /// Leeway in seconds for `exp` validation.
    pub jwt_clock_skew_seconds: u64,

    /// How long fetched keys stay cached. Zero disables caching.
    pub jwks_cache_ttl_seconds: u64,

    /// Timeout for one JWKS fetch.
    pub jwks_fetch_timeout_seconds: u64,
}

/// Custom Debug implementation that redacts sensitive fields.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"[REDACTED]")
            .field("bind_address", &self.bind_address)
            .field("auth0_domain", &self.auth0_domain)
            .field("api_audience", &self.api_audience)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("callback_url", &self.callback_url)
            .field("jwks_url", &self.jwks_url)
            .field("jwt_clock_skew_seconds", &self.jwt_clock_skew_seconds)
            .field("jwks_cache_ttl_seconds", &self.jwks_cache_ttl_seconds)
            .field(
                "jwks_fetch_timeout_seconds",
                &self.jwks_fetch_timeout_seconds,
            )
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid JWT clock skew configuration: {0}")]
    InvalidJwtClockSkew(String),

    #[error("Invalid JWKS configuration: {0}")]
    InvalidJwks(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let database_url = required(vars, "DATABASE_URL")?;
        let auth0_domain = required(vars, "AUTH0_DOMAIN")?;
        let api_audience = required(vars, "API_AUDIENCE")?;
        let client_id = required(vars, "AUTH0_CLIENT_ID")?;
        let client_secret = SecretString::from(required(vars, "AUTH0_CLIENT_SECRET")?);

        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let callback_url = vars
            .get("AUTH0_CALLBACK_URL")
            .cloned()
            .unwrap_or_else(|| DEFAULT_CALLBACK_URL.to_string());

        let jwks_url = vars
            .get("JWKS_URL")
            .cloned()
            .unwrap_or_else(|| format!("https://{}/.well-known/jwks.json", auth0_domain));

        let jwt_clock_skew_seconds = if let Some(value_str) = vars.get("JWT_CLOCK_SKEW_SECONDS") {
            let value: i64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidJwtClockSkew(format!(
                    "JWT_CLOCK_SKEW_SECONDS must be a valid integer, got '{}': {}",
                    value_str, e
                ))
            })?;

            if value <= 0 {
                return Err(ConfigError::InvalidJwtClockSkew(format!(
                    "JWT_CLOCK_SKEW_SECONDS must be positive, got {}",
                    value
                )));
            }

            if value.unsigned_abs() > MAX_CLOCK_SKEW.as_secs() {
                return Err(ConfigError::InvalidJwtClockSkew(format!(
                    "JWT_CLOCK_SKEW_SECONDS must not exceed {} seconds, got {}",
                    MAX_CLOCK_SKEW.as_secs(),
                    value
                )));
            }

            value.unsigned_abs()
        } else {
            DEFAULT_CLOCK_SKEW.as_secs()
        };

        let jwks_cache_ttl_seconds = if let Some(value_str) = vars.get("JWKS_CACHE_TTL_SECONDS") {
            value_str.parse::<u64>().map_err(|e| {
                ConfigError::InvalidJwks(format!(
                    "JWKS_CACHE_TTL_SECONDS must be a non-negative integer, got '{}': {}",
                    value_str, e
                ))
            })?
        } else {
            DEFAULT_JWKS_CACHE_TTL_SECONDS
        };

        let jwks_fetch_timeout_seconds =
            if let Some(value_str) = vars.get("JWKS_FETCH_TIMEOUT_SECONDS") {
                let value: u64 = value_str.parse().map_err(|e| {
                    ConfigError::InvalidJwks(format!(
                        "JWKS_FETCH_TIMEOUT_SECONDS must be a valid positive integer, got '{}': {}",
                        value_str, e
                    ))
                })?;

                if value == 0 || value > MAX_JWKS_FETCH_TIMEOUT_SECONDS {
                    return Err(ConfigError::InvalidJwks(format!(
                        "JWKS_FETCH_TIMEOUT_SECONDS must be between 1 and {}, got {}",
                        MAX_JWKS_FETCH_TIMEOUT_SECONDS, value
                    )));
                }

                value
            } else {
                DEFAULT_JWKS_FETCH_TIMEOUT_SECONDS
            };

        Ok(Config {
            database_url,
            bind_address,
            auth0_domain,
            api_audience,
            client_id,
            client_secret,
            callback_url,
            jwks_url,
            jwt_clock_skew_seconds,
            jwks_cache_ttl_seconds,
            jwks_fetch_timeout_seconds,
        })
    }

    /// Expected `iss` claim. The identity provider issues with a trailing slash.
    pub fn issuer(&self) -> String {
        format!("https://{}/", self.auth0_domain)
    }
}

fn required(vars: &HashMap<String, String>, name: &str) -> Result<String, ConfigError> {
    vars.get(name)
        .filter(|v| !v.trim().is_empty())
        .cloned()
        .ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))
}
