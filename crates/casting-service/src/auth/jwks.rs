//! JWKS client for fetching public signing keys from the identity provider.
//!
//! Keys are fetched from `https://{AUTH0_DOMAIN}/.well-known/jwks.json` (or the
//! `JWKS_URL` override). With a zero TTL every lookup goes to the network.
//! With a positive TTL the key set is cached, and a lookup for a key ID the
//! cache does not know triggers one refetch so rotated keys are picked up
//! before the TTL runs out.
//!
//! Any fetch failure (connection error, timeout, non-2xx, undecodable body)
//! surfaces as `AuthError::KeySetUnavailable`. Requests are never let through
//! when keys cannot be obtained.

use crate::errors::AuthError;
use crate::observability::metrics::record_jwks_fetch;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::instrument;

/// JSON Web Key from the JWKS endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Jwk {
    /// Key type ("RSA" for the keys this service accepts).
    pub kty: String,

    /// Key ID, matched against the token header `kid`.
    pub kid: String,

    /// RSA modulus (base64url).
    #[serde(default)]
    pub n: Option<String>,

    /// RSA public exponent (base64url).
    #[serde(default)]
    pub e: Option<String>,

    /// Algorithm, "RS256" when present.
    #[serde(default)]
    pub alg: Option<String>,

    /// Key use, "sig" when present.
    #[serde(default, rename = "use")]
    pub key_use: Option<String>,
}

/// JWKS document.
#[derive(Debug, Clone, Deserialize)]
pub struct JwksResponse {
    pub keys: Vec<Jwk>,
}

struct CachedJwks {
    keys: HashMap<String, Jwk>,
    expires_at: Instant,
}

/// Fetches and (optionally) caches the identity provider's key set.
pub struct JwksClient {
    jwks_url: String,
    http_client: reqwest::Client,
    cache: RwLock<Option<CachedJwks>>,
    cache_ttl: Duration,
    fetch_timeout: Duration,
}

impl JwksClient {
    /// Create a client.
    ///
    /// `cache_ttl` of zero disables caching. `fetch_timeout` bounds each fetch.
    pub fn new(jwks_url: String, cache_ttl: Duration, fetch_timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(fetch_timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(target: "casting.auth.jwks", error = %e, "Failed to build HTTP client with custom config, using defaults");
                reqwest::Client::new()
            });

        Self {
            jwks_url,
            http_client,
            cache: RwLock::new(None),
            cache_ttl,
            fetch_timeout,
        }
    }

    /// Look up the key with ID `kid`.
    ///
    /// # Errors
    ///
    /// - `AuthError::KeySetUnavailable` if the key set cannot be fetched
    /// - `AuthError::KeyNotFound` if no key in the set has this ID
    #[instrument(skip(self), fields(kid = %kid))]
    pub async fn get_key(&self, kid: &str) -> Result<Jwk, AuthError> {
        if self.cache_ttl.is_zero() {
            let mut keys = self.fetch_keys().await?;
            return keys.remove(kid).ok_or_else(|| {
                tracing::debug!(target: "casting.auth.jwks", kid = %kid, "Key not found in JWKS");
                AuthError::KeyNotFound
            });
        }

        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.expires_at > Instant::now() {
                    if let Some(key) = cached.keys.get(kid) {
                        tracing::debug!(target: "casting.auth.jwks", kid = %kid, "JWKS cache hit");
                        return Ok(key.clone());
                    }
                    tracing::debug!(target: "casting.auth.jwks", kid = %kid, "Unknown kid in JWKS cache, refetching");
                }
            }
        }

        let keys = self.fetch_keys().await?;
        let found = keys.get(kid).cloned();

        let mut cache = self.cache.write().await;
        *cache = Some(CachedJwks {
            keys,
            expires_at: Instant::now() + self.cache_ttl,
        });

        found.ok_or_else(|| {
            tracing::warn!(target: "casting.auth.jwks", kid = %kid, "Key not found in JWKS after refresh");
            AuthError::KeyNotFound
        })
    }

    async fn fetch_keys(&self) -> Result<HashMap<String, Jwk>, AuthError> {
        let start = Instant::now();
        let result = self.fetch_keys_inner().await;
        let status = if result.is_ok() { "success" } else { "error" };
        record_jwks_fetch(status, start.elapsed());
        result
    }

    async fn fetch_keys_inner(&self) -> Result<HashMap<String, Jwk>, AuthError> {
        tracing::debug!(target: "casting.auth.jwks", url = %self.jwks_url, "Fetching JWKS");

        let response = self
            .http_client
            .get(&self.jwks_url)
            .timeout(self.fetch_timeout)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(target: "casting.auth.jwks", error = %e, "Failed to fetch JWKS");
                AuthError::KeySetUnavailable
            })?;

        if !response.status().is_success() {
            tracing::error!(
                target: "casting.auth.jwks",
                status = %response.status(),
                "JWKS endpoint returned error"
            );
            return Err(AuthError::KeySetUnavailable);
        }

        let jwks: JwksResponse = response.json().await.map_err(|e| {
            tracing::error!(target: "casting.auth.jwks", error = %e, "Failed to parse JWKS response");
            AuthError::KeySetUnavailable
        })?;

        let keys: HashMap<String, Jwk> = jwks
            .keys
            .into_iter()
            .map(|key| (key.kid.clone(), key))
            .collect();

        tracing::debug!(target: "casting.auth.jwks", key_count = keys.len(), "JWKS fetched");

        Ok(keys)
    }
}
