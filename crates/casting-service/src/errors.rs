//! Casting Agency error types.
//!
//! All errors render the standard envelope via the `IntoResponse` impl:
//!
//! ```json
//! {"success": false, "error": 404, "code": "not_found", "message": "Resource not Found"}
//! ```
//!
//! Authentication and authorization failures carry their own machine-readable
//! code. Database details are logged server-side and never returned.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::bearer::BearerHeaderError;
use serde::Serialize;
use thiserror::Error;

/// Why a request was refused by the authorization gate.
///
/// `Display` is the human description returned to the client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Authorization header is expected.")]
    HeaderMissing,

    #[error("{0}")]
    InvalidHeader(BearerHeaderError),

    #[error("Authorization malformed.")]
    MissingKeyId,

    #[error("Unable to find the appropriate key.")]
    KeyNotFound,

    #[error("Token signature is invalid.")]
    InvalidSignature,

    #[error("Token expired.")]
    TokenExpired,

    #[error("Incorrect claims. Please, check the audience and issuer.")]
    InvalidClaims,

    #[error("Unable to parse authentication token.")]
    Unparseable,

    #[error("Unable to fetch signing keys.")]
    KeySetUnavailable,

    #[error("Permissions not included in JWT.")]
    PermissionsMissing,

    #[error("Permission not found.")]
    PermissionDenied,

    /// Same description as `PermissionDenied`; the guard log names which check failed.
    #[error("Permission not found.")]
    RoleDenied,
}

impl AuthError {
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::HeaderMissing
            | AuthError::InvalidHeader(_)
            | AuthError::MissingKeyId
            | AuthError::InvalidSignature
            | AuthError::TokenExpired
            | AuthError::InvalidClaims
            | AuthError::KeySetUnavailable => 401,
            AuthError::KeyNotFound | AuthError::Unparseable | AuthError::PermissionsMissing => {
                400
            }
            AuthError::PermissionDenied | AuthError::RoleDenied => 403,
        }
    }

    /// Machine-readable code for the `code` field of the envelope.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::HeaderMissing => "authorization_header_missing",
            AuthError::InvalidHeader(_)
            | AuthError::MissingKeyId
            | AuthError::KeyNotFound
            | AuthError::Unparseable => "invalid_header",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::TokenExpired => "token_expired",
            AuthError::InvalidClaims | AuthError::PermissionsMissing => "invalid_claims",
            AuthError::KeySetUnavailable => "key_set_unavailable",
            AuthError::PermissionDenied | AuthError::RoleDenied => "unauthorized",
        }
    }
}

impl From<BearerHeaderError> for AuthError {
    fn from(err: BearerHeaderError) -> Self {
        match err {
            BearerHeaderError::Missing => AuthError::HeaderMissing,
            other => AuthError::InvalidHeader(other),
        }
    }
}

/// Casting Agency error type.
///
/// Maps to HTTP status codes:
/// - Auth: 400, 401 or 403 depending on the failure
/// - BadRequest: 400 Bad Request
/// - NotFound: 404 Not Found
/// - MethodNotAllowed: 405, Timeout: 408
/// - Rejected: the status a framework layer chose, kept as is
/// - Unprocessable: 422 Unprocessable Entity (persistence failure after rollback)
/// - Database, Internal: 500 Internal Server Error
#[derive(Debug, Error)]
pub enum CastingError {
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Request timed out")]
    Timeout,

    #[error("Request rejected with status {0}")]
    Rejected(StatusCode),

    #[error("Unprocessable: {0}")]
    Unprocessable(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error")]
    Internal,
}

impl CastingError {
    /// Standard 404 for an unknown movie or actor id.
    pub fn resource_not_found() -> Self {
        CastingError::NotFound("Resource not Found".to_string())
    }

    /// Standard 422 for a rejected write.
    pub fn unprocessable() -> Self {
        CastingError::Unprocessable("Unable to process the request".to_string())
    }

    /// Envelope error for a bodiless or non-JSON response produced outside
    /// the handlers, such as method routing or the request timeout.
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::NOT_FOUND => CastingError::resource_not_found(),
            StatusCode::METHOD_NOT_ALLOWED => CastingError::MethodNotAllowed,
            StatusCode::REQUEST_TIMEOUT => CastingError::Timeout,
            s if s.is_server_error() => CastingError::Internal,
            s => CastingError::Rejected(s),
        }
    }

    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            CastingError::Auth(err) => err.status_code(),
            CastingError::BadRequest(_) => 400,
            CastingError::NotFound(_) => 404,
            CastingError::MethodNotAllowed => 405,
            CastingError::Timeout => 408,
            CastingError::Rejected(status) => status.as_u16(),
            CastingError::Unprocessable(_) => 422,
            CastingError::Database(_) | CastingError::Internal => 500,
        }
    }
}

/// Standard error envelope.
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub error: u16,
    pub code: String,
    pub message: String,
}

impl IntoResponse for CastingError {
    fn into_response(self) -> Response {
        let (code, message) = match &self {
            CastingError::Auth(err) => (err.code(), err.to_string()),
            CastingError::BadRequest(reason) => ("bad_request", reason.clone()),
            CastingError::NotFound(resource) => ("not_found", resource.clone()),
            CastingError::MethodNotAllowed => ("method_not_allowed", "Method not allowed".to_string()),
            CastingError::Timeout => ("request_timeout", "Request timed out".to_string()),
            CastingError::Rejected(status) => (
                "bad_request",
                status.canonical_reason().unwrap_or("Bad Request").to_string(),
            ),
            CastingError::Unprocessable(reason) => ("unprocessable", reason.clone()),
            CastingError::Database(err) => {
                // Log actual error server-side, return generic message to client
                tracing::error!(target: "casting.database", error = %err, "Database operation failed");
                ("internal_error", "internal server error".to_string())
            }
            CastingError::Internal => ("internal_error", "internal server error".to_string()),
        };

        let status_code = self.status_code();
        let status =
            StatusCode::from_u16(status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let envelope = ErrorEnvelope {
            success: false,
            error: status_code,
            code: code.to_string(),
            message,
        };

        let mut response = (status, Json(envelope)).into_response();

        if status == StatusCode::UNAUTHORIZED {
            if let Ok(header_value) =
                format!("Bearer realm=\"casting-agency\", error=\"{}\"", code).parse()
            {
                response
                    .headers_mut()
                    .insert("WWW-Authenticate", header_value);
            }
        }

        response
    }
}

/// Convert sqlx errors to CastingError
impl From<sqlx::Error> for CastingError {
    fn from(err: sqlx::Error) -> Self {
        CastingError::Database(err.to_string())
    }
}
