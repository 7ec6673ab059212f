use serde::{Deserialize, Serialize};
use std::{borrow::Cow, collections::HashSet, fmt};

/// Permission
///
/// A single capability string such as `post:drinks`. Route registrations use the
/// `static` values below; token payloads deserialize into owned values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Permission {
    fn from(name: &str) -> Self {
        Self(Cow::Owned(name.to_string()))
    }
}

impl From<String> for Permission {
    fn from(name: String) -> Self {
        Self(Cow::Owned(name))
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Capabilities required by the protected drink routes.
pub static GET_DRINKS_DETAIL: Permission = Permission::from_static("get:drinks-detail");
pub static POST_DRINKS: Permission = Permission::from_static("post:drinks");
pub static PATCH_DRINKS: Permission = Permission::from_static("patch:drinks");
pub static DELETE_DRINKS: Permission = Permission::from_static("delete:drinks");

/// Audience
///
/// Identity providers emit `aud` either as one string or as an array of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    One(String),
    Many(Vec<String>),
}

impl Audience {
    pub fn contains(&self, audience: &str) -> bool {
        match self {
            Audience::One(aud) => aud == audience,
            Audience::Many(auds) => auds.iter().any(|aud| aud == audience),
        }
    }
}

/// Claims
///
/// The verified payload of a bearer token. The only way to obtain one outside this
/// crate is through `CredentialVerifier::verify`, which checks the signature before
/// deserializing, so fields are read-only.
///
/// `permissions` stays an `Option`: a token with no permission scoping at all is
/// reported differently from a token that lacks one particular permission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    iss: String,
    sub: String,
    aud: Audience,
    exp: u64,
    #[serde(default)]
    iat: Option<u64>,
    #[serde(default)]
    permissions: Option<HashSet<Permission>>,
}

impl Claims {
    pub fn issuer(&self) -> &str {
        &self.iss
    }

    pub fn subject(&self) -> &str {
        &self.sub
    }

    pub fn audience(&self) -> &Audience {
        &self.aud
    }

    /// Expiry as seconds since the Unix epoch.
    pub fn expires_at(&self) -> u64 {
        self.exp
    }

    pub fn issued_at(&self) -> Option<u64> {
        self.iat
    }

    pub fn permissions(&self) -> Option<&HashSet<Permission>> {
        self.permissions.as_ref()
    }
}

#[cfg(test)]
impl Claims {
    pub(crate) fn for_test(permissions: Option<&[&str]>) -> Self {
        Self {
            iss: "https://issuer.test/".to_string(),
            sub: "auth0|tester".to_string(),
            aud: Audience::One("drinks".to_string()),
            exp: u64::MAX,
            iat: None,
            permissions: permissions.map(|names| names.iter().map(|&n| Permission::from(n)).collect()),
        }
    }
}
