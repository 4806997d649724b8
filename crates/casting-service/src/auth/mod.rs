//! Bearer-token authentication for the Casting Agency API.
//!
//! - `claims`: the verified claim set and permission/role checks
//! - `jwks`: key-set retrieval from the identity provider
//! - `jwt`: signature and registered-claim verification

pub mod claims;
pub mod jwks;
pub mod jwt;

pub use claims::Claims;
pub use jwks::JwksClient;
pub use jwt::TokenValidator;
