//! Claim sets for test tokens.

use chrono::Utc;
use serde::Serialize;

/// Identity-provider domain used by test servers.
pub const TEST_AUTH0_DOMAIN: &str = "casting-test.auth0.local";

/// Audience used by test servers.
pub const TEST_AUDIENCE: &str = "casting-agency-api";

/// Issuer matching `TEST_AUTH0_DOMAIN`.
pub fn test_issuer() -> String {
    format!("https://{TEST_AUTH0_DOMAIN}/")
}

/// JWT claims for test tokens.
#[derive(Debug, Clone, Serialize)]
pub struct TestClaims {
    pub sub: String,
    pub aud: String,
    pub iss: String,
    pub exp: i64,
    pub iat: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,
}

impl TestClaims {
    /// Valid for an hour, empty permissions list, no roles.
    pub fn new(sub: &str) -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub: sub.to_string(),
            aud: TEST_AUDIENCE.to_string(),
            iss: test_issuer(),
            exp: now + 3600,
            iat: now,
            permissions: Some(Vec::new()),
            roles: None,
        }
    }

    /// Read-only access.
    pub fn casting_assistant() -> Self {
        Self::new("auth0|casting-assistant").permissions(&["get:movies", "get:actors"])
    }

    /// Manages actors; may also edit movies by permission but lacks the
    /// Executive Producer role.
    pub fn casting_director() -> Self {
        Self::new("auth0|casting-director")
            .permissions(&[
                "get:movies",
                "get:actors",
                "create:actors",
                "update:actors",
                "delete:actors",
                "update:movie",
            ])
            .roles(&["Casting Director"])
    }

    /// Every permission, Executive Producer role.
    pub fn executive_producer() -> Self {
        Self::new("auth0|executive-producer")
            .permissions(&[
                "get:movies",
                "get:actors",
                "create:actors",
                "update:actors",
                "delete:actors",
                "create:movies",
                "update:movie",
                "delete:movies",
            ])
            .roles(&["Executive Producer"])
    }

    pub fn permissions(mut self, permissions: &[&str]) -> Self {
        self.permissions = Some(permissions.iter().map(|p| p.to_string()).collect());
        self
    }

    pub fn without_permissions(mut self) -> Self {
        self.permissions = None;
        self
    }

    pub fn roles(mut self, roles: &[&str]) -> Self {
        self.roles = Some(roles.iter().map(|r| r.to_string()).collect());
        self
    }

    pub fn audience(mut self, aud: &str) -> Self {
        self.aud = aud.to_string();
        self
    }

    pub fn issuer(mut self, iss: &str) -> Self {
        self.iss = iss.to_string();
        self
    }

    /// Expired an hour ago, well past any configured leeway.
    pub fn expired(mut self) -> Self {
        let now = Utc::now().timestamp();
        self.iat = now - 7200;
        self.exp = now - 3600;
        self
    }
}
