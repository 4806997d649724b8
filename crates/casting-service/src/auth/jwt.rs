//! Access-token verification.
//!
//! A bearer token is accepted when:
//! 1. it is at most 8KB and its header names a `kid`
//! 2. the key set currently published by the identity provider holds an RSA
//!    key with that `kid`
//! 3. its RS256 signature verifies against that key
//! 4. `aud` equals the configured audience, `iss` equals
//!    `https://{AUTH0_DOMAIN}/`, and `exp` is in the future (with leeway)
//!
//! Each failure maps to a distinct `AuthError` so clients see why they were
//! refused.

use crate::auth::claims::Claims;
use crate::auth::jwks::{Jwk, JwksClient};
use crate::config::Config;
use crate::errors::AuthError;
use crate::observability::metrics::record_token_validation;
use common::jwt::{extract_kid, JwtValidationError};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

/// Verifies access tokens against the identity provider's key set.
pub struct TokenValidator {
    jwks_client: Arc<JwksClient>,
    validation: Validation,
}

impl TokenValidator {
    /// Create a validator expecting `audience` and `issuer`.
    pub fn new(
        jwks_client: Arc<JwksClient>,
        audience: &str,
        issuer: &str,
        clock_skew_seconds: u64,
    ) -> Self {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[audience]);
        validation.set_issuer(&[issuer]);
        validation.set_required_spec_claims(&["exp", "aud", "iss"]);
        validation.validate_exp = true;
        validation.leeway = clock_skew_seconds;

        Self {
            jwks_client,
            validation,
        }
    }

    /// Build the validator and its JWKS client from service configuration.
    pub fn from_config(config: &Config) -> Self {
        let jwks_client = Arc::new(JwksClient::new(
            config.jwks_url.clone(),
            Duration::from_secs(config.jwks_cache_ttl_seconds),
            Duration::from_secs(config.jwks_fetch_timeout_seconds),
        ));

        Self::new(
            jwks_client,
            &config.api_audience,
            &config.issuer(),
            config.jwt_clock_skew_seconds,
        )
    }

    /// Validate a raw bearer token and return its claims.
    ///
    /// # Errors
    ///
    /// Returns the `AuthError` describing the first check that failed.
    #[instrument(skip_all)]
    pub async fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        let result = self.validate_inner(token).await;

        match &result {
            Ok(_) => {
                tracing::debug!(target: "casting.auth.jwt", "Token validated successfully");
                record_token_validation("success");
            }
            Err(e) => {
                tracing::debug!(target: "casting.auth.jwt", code = e.code(), error = %e, "Token rejected");
                record_token_validation(e.code());
            }
        }

        result
    }

    async fn validate_inner(&self, token: &str) -> Result<Claims, AuthError> {
        let kid = extract_kid(token).map_err(|e| match e {
            JwtValidationError::MissingKid => AuthError::MissingKeyId,
            JwtValidationError::TokenTooLarge | JwtValidationError::MalformedToken => {
                AuthError::Unparseable
            }
        })?;

        let jwk = self.jwks_client.get_key(&kid).await?;

        verify_token(token, &jwk, &self.validation)
    }
}

/// Verify signature and registered claims of `token` with `jwk`.
fn verify_token(token: &str, jwk: &Jwk, validation: &Validation) -> Result<Claims, AuthError> {
    if jwk.kty != "RSA" {
        tracing::warn!(target: "casting.auth.jwt", kty = %jwk.kty, "Unexpected JWK key type");
        return Err(AuthError::KeyNotFound);
    }
    if let Some(alg) = &jwk.alg {
        if alg != "RS256" {
            tracing::warn!(target: "casting.auth.jwt", alg = %alg, "Unexpected JWK algorithm");
            return Err(AuthError::KeyNotFound);
        }
    }

    let (Some(n), Some(e)) = (jwk.n.as_deref(), jwk.e.as_deref()) else {
        tracing::error!(target: "casting.auth.jwt", kid = %jwk.kid, "JWK missing RSA components");
        return Err(AuthError::KeyNotFound);
    };

    let decoding_key = DecodingKey::from_rsa_components(n, e).map_err(|e| {
        tracing::error!(target: "casting.auth.jwt", error = %e, "Invalid RSA key encoding");
        AuthError::KeyNotFound
    })?;

    let token_data = decode::<Claims>(token, &decoding_key, validation).map_err(|e| {
        tracing::debug!(target: "casting.auth.jwt", error = %e, "Token verification failed");
        match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            ErrorKind::InvalidAudience
            | ErrorKind::InvalidIssuer
            | ErrorKind::MissingRequiredClaim(_)
            | ErrorKind::ImmatureSignature => AuthError::InvalidClaims,
            ErrorKind::InvalidSignature => AuthError::InvalidSignature,
            _ => AuthError::Unparseable,
        }
    })?;

    Ok(token_data.claims)
}
