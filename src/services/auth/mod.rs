pub mod bearer;
pub mod claims;
pub mod error;
pub mod factory;
pub mod gate;
pub mod jwks;
pub mod permissions;
pub mod verifier;

pub use bearer::extract_bearer;
pub use claims::{TokenAudience, VerifiedClaims};
pub use error::{AuthError, AuthStage};
pub use factory::build_auth_gate;
pub use gate::{AuthGate, Guarded, Rejection};
pub use jwks::{FetchFuture, HttpKeyFetcher, KeyFetcher, KeyResolver, SigningKey, SigningKeySet};
pub use permissions::check_permissions;
pub use verifier::TokenVerifier;
