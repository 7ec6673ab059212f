mod common;

use axum::http::StatusCode;
use common::{ROGUE_KID, ROGUE_PEM, TokenBuilder, gate_with, issuer_source};
use drinks_api::auth::{AuthError, GET_DRINKS_DETAIL, POST_DRINKS, Permission};
use serde_json::json;

// --- Credential Verifier ---

#[tokio::test]
async fn test_missing_header_is_missing_authorization() {
    let gate = gate_with(issuer_source());

    let result = gate.authorize(None, &GET_DRINKS_DETAIL).await;

    assert_eq!(result.unwrap_err(), AuthError::MissingAuthorization);
}

#[tokio::test]
async fn test_non_bearer_header_is_malformed() {
    let gate = gate_with(issuer_source());
    let token = TokenBuilder::new().permissions(&["get:drinks-detail"]).build();

    for header in [format!("Basic {token}"), token.clone(), format!("Bearer {token} extra")] {
        let result = gate.authorize(Some(&header), &GET_DRINKS_DETAIL).await;
        assert_eq!(result.unwrap_err(), AuthError::MalformedHeader, "{header}");
    }
}

#[tokio::test]
async fn test_garbage_token_is_malformed_without_fetching_keys() {
    let source = issuer_source();
    let gate = gate_with(source.clone());

    for token in ["not-a-jwt", "a.b", "a.b.c.d", "!!!.???.###"] {
        let result = gate
            .authorize(Some(&format!("Bearer {token}")), &GET_DRINKS_DETAIL)
            .await;
        assert_eq!(result.unwrap_err(), AuthError::MalformedToken, "{token}");
    }
    assert_eq!(source.fetch_count(), 0);
}

#[tokio::test]
async fn test_token_without_key_id_is_malformed() {
    let gate = gate_with(issuer_source());
    let header = TokenBuilder::new().without_kid().bearer();

    let result = gate.authorize(Some(&header), &GET_DRINKS_DETAIL).await;

    assert_eq!(result.unwrap_err(), AuthError::MalformedToken);
}

#[tokio::test]
async fn test_token_signed_with_untrusted_key_has_invalid_signature() {
    let gate = gate_with(issuer_source());

    // Claims the trusted key id but is signed by a different key.
    let forged = TokenBuilder::new()
        .permissions(&["get:drinks-detail"])
        .signed_with(ROGUE_PEM)
        .bearer();
    // Names a key id the issuer never published.
    let unknown = TokenBuilder::new()
        .permissions(&["get:drinks-detail"])
        .kid(ROGUE_KID)
        .signed_with(ROGUE_PEM)
        .bearer();

    for header in [forged, unknown] {
        let result = gate.authorize(Some(&header), &GET_DRINKS_DETAIL).await;
        assert_eq!(result.unwrap_err(), AuthError::InvalidSignature);
    }
}

#[tokio::test]
async fn test_expired_token_with_valid_signature_is_expired() {
    let gate = gate_with(issuer_source());
    let header = TokenBuilder::new()
        .permissions(&["get:drinks-detail"])
        .expires_in(-3600)
        .bearer();

    let result = gate.authorize(Some(&header), &GET_DRINKS_DETAIL).await;

    assert_eq!(result.unwrap_err(), AuthError::TokenExpired);
}

#[tokio::test]
async fn test_expired_token_with_untrusted_signature_reports_signature() {
    let gate = gate_with(issuer_source());
    let header = TokenBuilder::new()
        .signed_with(ROGUE_PEM)
        .expires_in(-3600)
        .bearer();

    let result = gate.authorize(Some(&header), &GET_DRINKS_DETAIL).await;

    assert_eq!(result.unwrap_err(), AuthError::InvalidSignature);
}

#[tokio::test]
async fn test_wrong_audience_or_issuer_is_invalid_claims() {
    let gate = gate_with(issuer_source());

    let wrong_audience = TokenBuilder::new()
        .permissions(&["get:drinks-detail"])
        .audience(json!("someone-else"))
        .bearer();
    let wrong_issuer = TokenBuilder::new()
        .permissions(&["get:drinks-detail"])
        .issuer("https://evil.example.com/")
        .bearer();

    for header in [wrong_audience, wrong_issuer] {
        let result = gate.authorize(Some(&header), &GET_DRINKS_DETAIL).await;
        assert_eq!(result.unwrap_err(), AuthError::InvalidClaims);
    }
}

#[tokio::test]
async fn test_audience_array_containing_expected_audience_is_accepted() {
    let gate = gate_with(issuer_source());
    let header = TokenBuilder::new()
        .permissions(&["get:drinks-detail"])
        .audience(json!(["drinks", "https://dev-drinks.us.auth0.com/userinfo"]))
        .bearer();

    let claims = gate
        .authorize(Some(&header), &GET_DRINKS_DETAIL)
        .await
        .expect("token should be accepted");

    assert!(claims.audience().contains("drinks"));
}

// --- Permission Checker through the Gate ---

#[tokio::test]
async fn test_token_without_permissions_claim_is_reported_distinctly() {
    let gate = gate_with(issuer_source());
    let header = TokenBuilder::new().without_permissions().bearer();

    let result = gate.authorize(Some(&header), &GET_DRINKS_DETAIL).await;

    let err = result.unwrap_err();
    assert_eq!(err, AuthError::PermissionsMissingInClaims);
    assert_eq!(err.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_end_to_end_single_permission_token() {
    let gate = gate_with(issuer_source());
    let header = TokenBuilder::new().permissions(&["get:drinks-detail"]).bearer();

    let claims = gate
        .authorize(Some(&header), &GET_DRINKS_DETAIL)
        .await
        .expect("detail read should be authorized");
    assert_eq!(claims.subject(), "auth0|barista");
    assert!(claims.permissions().unwrap().contains(&Permission::from("get:drinks-detail")));

    let denied = gate.authorize(Some(&header), &POST_DRINKS).await.unwrap_err();
    assert_eq!(denied, AuthError::Forbidden);
    assert_eq!(denied.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_keys_are_fetched_once_and_then_served_from_cache() {
    let source = issuer_source();
    let gate = gate_with(source.clone());
    let header = TokenBuilder::new().permissions(&["get:drinks-detail"]).bearer();

    for _ in 0..3 {
        gate.authorize(Some(&header), &GET_DRINKS_DETAIL)
            .await
            .expect("token should be accepted");
    }

    assert_eq!(source.fetch_count(), 1);
}
