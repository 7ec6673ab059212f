use axum::http::StatusCode;
use thiserror::Error;

/// AuthError
///
/// Classified reason an authorization attempt was rejected. Every variant is terminal
/// for the request: nothing here is retried. The messages are fixed strings so that
/// the response never reveals more than the classification itself; the underlying
/// cause is only written to the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Authorization header is expected.")]
    MissingAuthorization,
    #[error("Authorization header must be of the form 'Bearer <token>'.")]
    MalformedHeader,
    #[error("Unable to parse authentication token.")]
    MalformedToken,
    #[error("Unable to verify token signature.")]
    InvalidSignature,
    #[error("Token expired.")]
    TokenExpired,
    #[error("Incorrect claims. Please check the audience and issuer.")]
    InvalidClaims,
    #[error("Permissions not included in token.")]
    PermissionsMissingInClaims,
    #[error("Permission not found.")]
    Forbidden,
}

impl AuthError {
    /// HTTP status the failure maps to: 401 while the credential itself is in doubt,
    /// 403 once the credential is trusted but lacks the capability.
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::MissingAuthorization
            | AuthError::MalformedHeader
            | AuthError::MalformedToken
            | AuthError::InvalidSignature
            | AuthError::TokenExpired
            | AuthError::InvalidClaims => StatusCode::UNAUTHORIZED,
            AuthError::PermissionsMissingInClaims | AuthError::Forbidden => StatusCode::FORBIDDEN,
        }
    }
}
