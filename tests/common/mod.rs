#![allow(dead_code)]

use drinks_api::{
    AppConfig, GateState, build_gate,
    auth::{KeySetSource, MockKeySetSource},
};
use jsonwebtoken::{
    Algorithm, EncodingKey, Header, encode,
    jwk::{Jwk, JwkSet},
};
use serde_json::json;
use std::{sync::Arc, time::SystemTime};

// --- RSA Fixtures ---

pub const TRUSTED_KID: &str = "trusted-key";
pub const ROGUE_KID: &str = "rogue-key";

pub const TRUSTED_PEM: &str = include_str!("../fixtures/trusted.pem");
pub const ROGUE_PEM: &str = include_str!("../fixtures/rogue.pem");

pub fn trusted_modulus() -> &'static str {
    include_str!("../fixtures/trusted.n").trim()
}

pub fn rogue_modulus() -> &'static str {
    include_str!("../fixtures/rogue.n").trim()
}

/// Public half of an RSA fixture, as the issuer would publish it.
pub fn rsa_jwk(kid: &str, modulus: &str) -> Jwk {
    serde_json::from_value(json!({
        "kty": "RSA",
        "use": "sig",
        "alg": "RS256",
        "kid": kid,
        "n": modulus,
        "e": "AQAB",
    }))
    .expect("fixture JWK is valid")
}

/// The key set the issuer publishes: only the trusted key.
pub fn issuer_key_set() -> JwkSet {
    JwkSet {
        keys: vec![rsa_jwk(TRUSTED_KID, trusted_modulus())],
    }
}

pub fn now() -> i64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64
}

// --- Token Builder ---

/// Builds RS256 tokens shaped like the identity provider's, with every knob a test
/// may want to turn. Defaults produce a token the default `AppConfig` accepts.
pub struct TokenBuilder {
    kid: Option<String>,
    pem: &'static str,
    issuer: String,
    audience: serde_json::Value,
    expires_in: i64,
    permissions: Option<Vec<String>>,
}

impl TokenBuilder {
    pub fn new() -> Self {
        let config = AppConfig::default();
        Self {
            kid: Some(TRUSTED_KID.to_string()),
            pem: TRUSTED_PEM,
            issuer: config.issuer(),
            audience: json!(config.api_audience),
            expires_in: 3600,
            permissions: Some(vec![]),
        }
    }

    pub fn permissions(mut self, permissions: &[&str]) -> Self {
        self.permissions = Some(permissions.iter().map(|p| p.to_string()).collect());
        self
    }

    pub fn without_permissions(mut self) -> Self {
        self.permissions = None;
        self
    }

    pub fn kid(mut self, kid: &str) -> Self {
        self.kid = Some(kid.to_string());
        self
    }

    pub fn without_kid(mut self) -> Self {
        self.kid = None;
        self
    }

    pub fn signed_with(mut self, pem: &'static str) -> Self {
        self.pem = pem;
        self
    }

    pub fn issuer(mut self, issuer: &str) -> Self {
        self.issuer = issuer.to_string();
        self
    }

    pub fn audience(mut self, audience: serde_json::Value) -> Self {
        self.audience = audience;
        self
    }

    /// Negative values produce an already expired token.
    pub fn expires_in(mut self, seconds: i64) -> Self {
        self.expires_in = seconds;
        self
    }

    pub fn build(self) -> String {
        let now = now();
        let mut claims = json!({
            "iss": self.issuer,
            "sub": "auth0|barista",
            "aud": self.audience,
            "iat": now,
            "exp": now + self.expires_in,
        });
        if let Some(permissions) = self.permissions {
            claims["permissions"] = json!(permissions);
        }

        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.kid;

        let key = EncodingKey::from_rsa_pem(self.pem.as_bytes()).expect("fixture PEM is valid");
        encode(&header, &claims, &key).expect("token encodes")
    }

    pub fn bearer(self) -> String {
        format!("Bearer {}", self.build())
    }
}

// --- Gate Setup ---

pub fn issuer_source() -> Arc<MockKeySetSource> {
    Arc::new(MockKeySetSource::new(issuer_key_set()))
}

pub fn gate_with(source: Arc<dyn KeySetSource>) -> GateState {
    build_gate(&AppConfig::default(), source)
}
