//! RSA keypairs for signing test tokens.
//!
//! The PEM files under `keys/` are throwaway 2048-bit keys generated for
//! tests. They protect nothing.

use crate::tokens::TestClaims;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::Serialize;

/// Key ID the mocked key set publishes for the primary key.
pub const PRIMARY_KID: &str = "casting-test-key-01";

const PRIMARY_PEM: &str = include_str!("../keys/signing_key_primary.pem");
const PRIMARY_N: &str = "o6iBcBtqoTByUBqk_WSUDAesBoY9_N_7rDTPoZSRreuvXjv12FTBHXcGu4CLdKPTKreU5sTHR_RWOea6FvPKagpb80CpC0pDf9oiwoTMEUcCNDCfn4tdvBBv4Qz_0hlNh8_O2lLjeoOxNouYr7SS2Lawi2P6mksIfsX-GOfAjX4UmFuYWokZfORjH9bjgdvCxEK8q8w-lMfoHkbZLaO0KT7RaWwyzRoKmqun4iMJT6ROlI6Q2E3oK-87zwnPifS1qaH8medDBP0MAHKCi_WlIwvNi2-BBj5knkU3xSDow-I-61v3dj9gmU1KWPzJzmGhbx4h2PqY5W5mIeGgSXq5GQ";

const FOREIGN_PEM: &str = include_str!("../keys/signing_key_foreign.pem");
const FOREIGN_N: &str = "tPcYqp232HOSTKkAjy4QRaez4lMbjOqLwPN5QmV1tnBjF30EYFgp_lM9dsma0fB8Zx1VVNehiHUAN7LCFhDxs8PqKQREVqOHb9w9Zed15pfhuedJ7X5de7PpWcZf0c5X0bOWSLCAvgk3eiQ4CZzIB09L-h4wbnbi-mW_dpqHKILtpmu6n3HUlAls20R0tQqv9AR1nPZZue0cyKMfLUyFUARFFg09eLmFxBLggsK01DLsKqC1J9m5dB9JQsz3MDuBz5JWZqKqSu0tXwLAiOtQYeLGkYyD5WGtaxZFUDBL5EOBBKZJzYtG2q5boq0_Cyi4-sDfH33AsLVtsgwJfqPF-w";

const EXPONENT: &str = "AQAB";

/// Test keypair for signing tokens.
#[derive(Debug, Clone)]
pub struct TestKeypair {
    kid: String,
    private_pem: &'static str,
    modulus: &'static str,
}

impl TestKeypair {
    /// The key the mocked key set publishes.
    pub fn primary() -> Self {
        Self {
            kid: PRIMARY_KID.to_string(),
            private_pem: PRIMARY_PEM,
            modulus: PRIMARY_N,
        }
    }

    /// A different key that claims the primary's `kid`.
    ///
    /// Tokens it signs name a published key but fail signature verification.
    pub fn foreign() -> Self {
        Self {
            kid: PRIMARY_KID.to_string(),
            private_pem: FOREIGN_PEM,
            modulus: FOREIGN_N,
        }
    }

    pub fn with_kid(mut self, kid: &str) -> Self {
        self.kid = kid.to_string();
        self
    }

    pub fn kid(&self) -> &str {
        &self.kid
    }

    /// Sign `claims` as an RS256 JWT with this key's `kid` in the header.
    pub fn sign(&self, claims: &TestClaims) -> String {
        self.sign_payload(claims)
    }

    /// Sign an arbitrary payload, e.g. one missing registered claims.
    pub fn sign_payload<T: Serialize>(&self, payload: &T) -> String {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(self.kid.clone());
        self.sign_with_header(&header, payload)
    }

    /// Sign with a caller-supplied header (e.g. no `kid`).
    pub fn sign_with_header<T: Serialize>(&self, header: &Header, payload: &T) -> String {
        let key = EncodingKey::from_rsa_pem(self.private_pem.as_bytes())
            .expect("test key PEM should parse");
        encode(header, payload, &key).expect("Failed to sign token")
    }

    /// The public half as a JWK.
    pub fn jwk_json(&self) -> serde_json::Value {
        serde_json::json!({
            "kty": "RSA",
            "kid": self.kid,
            "n": self.modulus,
            "e": EXPONENT,
            "alg": "RS256",
            "use": "sig"
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_token_names_kid() {
        let token = TestKeypair::primary().sign(&TestClaims::casting_assistant());
        let header = jsonwebtoken::decode_header(&token).unwrap();

        assert_eq!(header.alg, Algorithm::RS256);
        assert_eq!(header.kid.as_deref(), Some(PRIMARY_KID));
    }

    #[test]
    fn test_foreign_key_differs_from_primary() {
        assert_eq!(TestKeypair::foreign().kid(), TestKeypair::primary().kid());
        assert_ne!(
            TestKeypair::foreign().jwk_json()["n"],
            TestKeypair::primary().jwk_json()["n"]
        );
    }

    #[test]
    fn test_primary_jwk_verifies_primary_signature() {
        let keypair = TestKeypair::primary();
        let claims = TestClaims::casting_assistant();
        let token = keypair.sign(&claims);

        let key = jsonwebtoken::DecodingKey::from_rsa_components(PRIMARY_N, EXPONENT).unwrap();
        let mut validation = jsonwebtoken::Validation::new(Algorithm::RS256);
        validation.set_audience(&[claims.aud.as_str()]);
        validation.set_issuer(&[claims.iss.as_str()]);

        jsonwebtoken::decode::<serde_json::Value>(&token, &key, &validation).unwrap();
    }
}
