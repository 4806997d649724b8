//! JWT header utilities.
//!
//! Helpers that run before signature verification:
//! - Size limit applied before any decoding
//! - Key ID (`kid`) extraction for JWKS lookup
//! - Clock skew bounds used by configuration
//!
//! Nothing in this module verifies a signature. A `kid` obtained here is only
//! good for picking a key out of a trusted key set; the token must still be
//! verified with that key.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Maximum allowed JWT size in bytes (8KB).
///
/// Identity-provider access tokens are typically well under 2KB even with a
/// long permissions list. Anything above this limit is rejected before base64
/// decoding or signature verification.
pub const MAX_JWT_SIZE_BYTES: usize = 8192;

/// Default leeway applied to `exp` checks.
pub const DEFAULT_CLOCK_SKEW: Duration = Duration::from_secs(60);

/// Upper bound on configurable clock skew (10 minutes).
pub const MAX_CLOCK_SKEW: Duration = Duration::from_secs(600);

// =============================================================================
// Error Types
// =============================================================================

/// Errors raised while inspecting an unverified JWT header.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JwtValidationError {
    /// Token size exceeds `MAX_JWT_SIZE_BYTES`.
    #[error("Token exceeds the maximum allowed size")]
    TokenTooLarge,

    /// Token is not `header.payload.signature` or the header is not base64url JSON.
    #[error("Token is not a well-formed JWT")]
    MalformedToken,

    /// Header carries no usable `kid`.
    #[error("Token header has no key ID")]
    MissingKid,
}

// =============================================================================
// Functions
// =============================================================================

/// Extract the `kid` (key ID) from a JWT header without verifying the signature.
///
/// # Errors
///
/// - `TokenTooLarge` - token exceeds `MAX_JWT_SIZE_BYTES`
/// - `MalformedToken` - wrong number of segments, bad base64 or invalid JSON
/// - `MissingKid` - `kid` absent, not a string, or empty
pub fn extract_kid(token: &str) -> Result<String, JwtValidationError> {
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "common.jwt",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(JwtValidationError::TokenTooLarge);
    }

    let mut parts = token.split('.');
    let (Some(header_part), Some(_), Some(_), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        tracing::debug!(target: "common.jwt", "Token rejected: invalid JWT format");
        return Err(JwtValidationError::MalformedToken);
    };

    let header_bytes = URL_SAFE_NO_PAD.decode(header_part).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to decode JWT header base64");
        JwtValidationError::MalformedToken
    })?;

    let header: serde_json::Value = serde_json::from_slice(&header_bytes).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to parse JWT header JSON");
        JwtValidationError::MalformedToken
    })?;

    header
        .get("kid")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .ok_or(JwtValidationError::MissingKid)
}

// =============================================================================
// Tests
// =============================================================================
