use jsonwebtoken::{
    Algorithm, DecodingKey, Validation, decode, decode_header,
    errors::{Error as JwtError, ErrorKind},
};

use super::{AuthError, Claims, KeyStore};

/// CredentialVerifier
///
/// Turns the raw `Authorization` header value into trusted `Claims`. Steps run in a
/// fixed order and the first failure wins:
///
/// 1. header shape (`Bearer <token>`)
/// 2. token structure (three segments, decodable JOSE header with a `kid`)
/// 3. RS256 signature against the issuer key named by `kid`
/// 4. registered claims: `exp`, then `aud` and `iss`
///
/// Because the signature is checked before any claim, an expired token signed by an
/// untrusted key is reported as `InvalidSignature`, not `TokenExpired`.
pub struct CredentialVerifier {
    keys: KeyStore,
    validation: Validation,
}

impl CredentialVerifier {
    pub fn new(keys: KeyStore, issuer: &str, audience: &str) -> Self {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = true;
        validation.set_issuer(&[issuer]);
        validation.set_audience(&[audience]);
        validation.set_required_spec_claims(&["exp", "aud", "iss"]);

        Self { keys, validation }
    }

    /// Extracts the token from a `Bearer <token>` header value. The scheme is matched
    /// case-insensitively; anything other than exactly two parts is rejected.
    pub fn bearer_token(authorization: Option<&str>) -> Result<&str, AuthError> {
        let header = authorization.ok_or(AuthError::MissingAuthorization)?;

        let mut parts = header.split_whitespace();
        match (parts.next(), parts.next(), parts.next()) {
            (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("bearer") => Ok(token),
            _ => Err(AuthError::MalformedHeader),
        }
    }

    pub async fn verify(&self, authorization: Option<&str>) -> Result<Claims, AuthError> {
        let token = Self::bearer_token(authorization)?;

        if token.split('.').count() != 3 {
            return Err(AuthError::MalformedToken);
        }

        let header = decode_header(token).map_err(|e| {
            tracing::debug!(error = %e, "token header could not be decoded");
            AuthError::MalformedToken
        })?;

        let kid = header.kid.ok_or_else(|| {
            tracing::debug!("token header carries no key id");
            AuthError::MalformedToken
        })?;

        let jwk = self.keys.resolve(&kid).await.map_err(|e| {
            tracing::warn!(kid = %kid, error = %e, "no usable signing key for token");
            AuthError::InvalidSignature
        })?;

        let key = DecodingKey::from_jwk(&jwk).map_err(|e| {
            tracing::warn!(kid = %kid, error = %e, "issuer key could not be loaded");
            AuthError::InvalidSignature
        })?;

        let data = decode::<Claims>(token, &key, &self.validation).map_err(classify)?;
        Ok(data.claims)
    }
}

fn classify(error: JwtError) -> AuthError {
    let reason = match error.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        ErrorKind::InvalidAudience
        | ErrorKind::InvalidIssuer
        | ErrorKind::ImmatureSignature
        | ErrorKind::MissingRequiredClaim(_) => AuthError::InvalidClaims,
        ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) | ErrorKind::Utf8(_) => {
            AuthError::MalformedToken
        }
        _ => AuthError::InvalidSignature,
    };
    tracing::debug!(error = %error, reason = ?reason, "token rejected");
    reason
}
