//! `Authorization: Bearer <token>` header parsing.
//!
//! The header value is split on whitespace. It must contain exactly two
//! parts, and the first must equal `Bearer` ignoring ASCII case. Checks run
//! in this order: presence, scheme, missing token, extra parts.

use thiserror::Error;

/// Reasons an `Authorization` header does not carry a usable bearer token.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BearerHeaderError {
    /// Header absent, not valid visible ASCII, or blank.
    #[error("Authorization header is expected.")]
    Missing,

    /// First part is something other than `Bearer`.
    #[error("Authorization header must start with Bearer.")]
    WrongScheme,

    /// `Bearer` with nothing after it.
    #[error("Token not found.")]
    TokenNotFound,

    /// More than `Bearer <token>`.
    #[error("Authorization header must be Bearer token.")]
    TooManyParts,
}

/// Extract the token from an `Authorization` header value.
///
/// # Errors
///
/// Returns a [`BearerHeaderError`] describing the first rule the header breaks.
pub fn extract_bearer_token(header: Option<&str>) -> Result<&str, BearerHeaderError> {
    let mut parts = header.unwrap_or_default().split_whitespace();

    let scheme = parts.next().ok_or(BearerHeaderError::Missing)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(BearerHeaderError::WrongScheme);
    }

    let token = parts.next().ok_or(BearerHeaderError::TokenNotFound)?;
    if parts.next().is_some() {
        return Err(BearerHeaderError::TooManyParts);
    }

    Ok(token)
}
