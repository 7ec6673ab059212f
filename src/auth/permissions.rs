use super::{AuthError, Claims, Permission};

/// check
///
/// Confirms `required` is among the permissions granted by `claims`. Succeeds with no
/// output since the caller already holds the claims.
pub fn check(claims: &Claims, required: &Permission) -> Result<(), AuthError> {
    let granted = claims
        .permissions()
        .ok_or(AuthError::PermissionsMissingInClaims)?;

    if granted.contains(required) {
        Ok(())
    } else {
        Err(AuthError::Forbidden)
    }
}
