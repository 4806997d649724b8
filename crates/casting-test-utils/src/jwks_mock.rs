//! Mocked identity-provider key set.

use crate::keys::TestKeypair;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const JWKS_PATH: &str = "/.well-known/jwks.json";

/// A wiremock server publishing a JWKS document.
///
/// Expectations set with `expect_fetches` are verified when this is dropped.
pub struct MockJwks {
    server: MockServer,
}

impl MockJwks {
    /// Publish `keys`.
    pub async fn publishing(keys: &[TestKeypair]) -> Self {
        Self::mount(ResponseTemplate::new(200).set_body_json(jwks_document(keys)), None).await
    }

    /// Publish `keys` and require exactly `fetches` requests.
    pub async fn expect_fetches(keys: &[TestKeypair], fetches: u64) -> Self {
        Self::mount(
            ResponseTemplate::new(200).set_body_json(jwks_document(keys)),
            Some(fetches),
        )
        .await
    }

    /// Answer every fetch with 503.
    pub async fn unavailable() -> Self {
        Self::mount(ResponseTemplate::new(503), None).await
    }

    /// Publish `keys` after `delay`.
    pub async fn slow(keys: &[TestKeypair], delay: Duration) -> Self {
        Self::mount(
            ResponseTemplate::new(200)
                .set_body_json(jwks_document(keys))
                .set_delay(delay),
            None,
        )
        .await
    }

    async fn mount(response: ResponseTemplate, fetches: Option<u64>) -> Self {
        let server = MockServer::start().await;
        let mock = Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(response);
        let mock = match fetches {
            Some(n) => mock.expect(n),
            None => mock,
        };
        mock.mount(&server).await;
        Self { server }
    }

    pub fn jwks_url(&self) -> String {
        format!("{}{}", self.server.uri(), JWKS_PATH)
    }

    /// Number of key-set fetches received so far.
    pub async fn fetch_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map(|requests| requests.len())
            .unwrap_or(0)
    }
}

fn jwks_document(keys: &[TestKeypair]) -> serde_json::Value {
    let keys: Vec<_> = keys.iter().map(TestKeypair::jwk_json).collect();
    serde_json::json!({ "keys": keys })
}
