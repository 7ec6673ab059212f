/// Authorization Module Index
///
/// Bearer-token authorization for the protected drink routes, leaves first:
///
/// - `keys`: the issuer's signing keys, cached with single-flight refresh.
/// - `verifier`: header shape, token structure, signature, registered claims.
/// - `permissions`: the per-route capability check.
/// - `gate`: the two composed into one guard, plus its axum middleware.
pub mod claims;
pub mod error;
pub mod gate;
pub mod keys;
pub mod permissions;
pub mod verifier;

pub use claims::{Audience, Claims, DELETE_DRINKS, GET_DRINKS_DETAIL, PATCH_DRINKS, POST_DRINKS, Permission};
pub use error::AuthError;
pub use gate::{AuthGate, GateState, RouteGuard, require_permission};
pub use keys::{
    HttpKeySetSource, KeyResolveError, KeySetError, KeySetSource, KeyStore, MockKeySetSource,
};
pub use verifier::CredentialVerifier;
