//! JWT claims structure.
//!
//! Access tokens from the identity provider carry a `permissions` list and,
//! when the tenant is configured to add them, a `roles` list. The two are
//! kept as `Option` so "claim missing" stays distinct from "claim empty".

use crate::errors::AuthError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Verified claim set.
///
/// The `sub` field is redacted in Debug output.
#[derive(Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user or client identifier).
    #[serde(default)]
    pub sub: String,

    /// Expiration timestamp (Unix epoch seconds).
    pub exp: i64,

    /// Issued-at timestamp (Unix epoch seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Fine-grained permissions, e.g. `get:movies`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<String>>,

    /// Coarse roles, e.g. `Executive Producer`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,
}

impl fmt::Debug for Claims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Claims")
            .field("sub", &"[REDACTED]")
            .field("exp", &self.exp)
            .field("iat", &self.iat)
            .field("permissions", &self.permissions)
            .field("roles", &self.roles)
            .finish()
    }
}

impl Claims {
    /// Require `permission` to be present in the `permissions` claim.
    ///
    /// # Errors
    ///
    /// - `PermissionsMissing` (400) when the claim is absent
    /// - `PermissionDenied` (403) when the permission is not listed
    pub fn check_permission(&self, permission: &str) -> Result<(), AuthError> {
        let permissions = self
            .permissions
            .as_ref()
            .ok_or(AuthError::PermissionsMissing)?;

        if permissions.iter().any(|p| p == permission) {
            Ok(())
        } else {
            Err(AuthError::PermissionDenied)
        }
    }

    /// Require `role` to be present in the `roles` claim.
    ///
    /// # Errors
    ///
    /// `RoleDenied` (403) when the claim is absent or the role is not listed.
    pub fn check_role(&self, role: &str) -> Result<(), AuthError> {
        match &self.roles {
            Some(roles) if roles.iter().any(|r| r == role) => Ok(()),
            _ => Err(AuthError::RoleDenied),
        }
    }
}
