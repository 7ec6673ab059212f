use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use super::{AuthError, Claims, CredentialVerifier, Permission, permissions};
use crate::error::ApiError;

/// AuthGate
///
/// Guard run before every protected handler: verify the credential, then check the
/// route's permission. Either step's failure is returned unchanged and ends the
/// request; there is no retry.
pub struct AuthGate {
    verifier: CredentialVerifier,
}

/// GateState
///
/// Shared handle to the gate (and, through it, the signing key cache).
pub type GateState = Arc<AuthGate>;

impl AuthGate {
    pub fn new(verifier: CredentialVerifier) -> Self {
        Self { verifier }
    }

    pub async fn authorize(
        &self,
        authorization: Option<&str>,
        required: &Permission,
    ) -> Result<Claims, AuthError> {
        let claims = self.verifier.verify(authorization).await?;
        permissions::check(&claims, required)?;
        Ok(claims)
    }
}

/// RouteGuard
///
/// Middleware state for one protected route: the gate plus the permission that route
/// was registered with.
#[derive(Clone)]
pub struct RouteGuard {
    gate: GateState,
    permission: Permission,
}

impl RouteGuard {
    pub fn new(gate: GateState, permission: Permission) -> Self {
        Self { gate, permission }
    }
}

/// require_permission
///
/// Middleware installed with `from_fn_with_state` as a `route_layer`. On success the
/// verified `Claims` are placed in the request extensions for the handler to take via
/// `Extension<Claims>`. On failure the handler never runs and the caller receives the
/// JSON error envelope.
pub async fn require_permission(
    State(guard): State<RouteGuard>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let authorization = match request.headers().get(header::AUTHORIZATION) {
        None => None,
        Some(value) => Some(
            value
                .to_str()
                .map_err(|_| AuthError::MalformedHeader)?
                .to_owned(),
        ),
    };

    let claims = guard
        .gate
        .authorize(authorization.as_deref(), &guard.permission)
        .await
        .inspect_err(|reason| {
            tracing::warn!(
                permission = %guard.permission,
                reason = ?reason,
                "request rejected by authorization gate"
            );
        })?;

    tracing::debug!(
        subject = claims.subject(),
        permission = %guard.permission,
        "request authorized"
    );

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}
