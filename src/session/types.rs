//! Identity and session payloads shared by the store, the controller and the
//! route guard. The credential is wrapped in `SecretString` and must never be
//! logged.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Opaque bearer token issued by `POST auth/login`.
#[derive(Clone)]
pub struct Credential(SecretString);

impl Credential {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }

    /// Raw token for the `Authorization` header and the store record only.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.expose_secret().trim().is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

impl PartialEq for Credential {
    fn eq(&self, other: &Self) -> bool {
        self.expose() == other.expose()
    }
}

impl Eq for Credential {}

impl<'de> Deserialize<'de> for Credential {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}

/// Operator role. `admin` and `military` are the only roles the gate knows;
/// anything else is kept verbatim but never satisfies a role requirement.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum UserRole {
    Admin,
    Military,
    Unrecognized(String),
}

impl UserRole {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Admin => "admin",
            Self::Military => "military",
            Self::Unrecognized(raw) => raw,
        }
    }

    #[must_use]
    pub const fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized(_))
    }
}

impl From<String> for UserRole {
    fn from(value: String) -> Self {
        match value.as_str() {
            "admin" => Self::Admin,
            "military" => Self::Military,
            _ => Self::Unrecognized(value),
        }
    }
}

impl From<&str> for UserRole {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<UserRole> for String {
    fn from(role: UserRole) -> Self {
        match role {
            UserRole::Unrecognized(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
/// Identity record returned by the API. The stored copy is a cache and is
/// never used for authorization until `GET /auth/me` confirms it.
pub struct UserProfile {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub role: UserRole,
}

/// Account identifier accepted by `POST auth/login`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoginIdentifier {
    Username(String),
    Email(String),
}

/// Login form input. The password is only exposed while serializing the
/// request body.
#[derive(Clone, Debug)]
pub struct LoginCredentials {
    pub identifier: LoginIdentifier,
    pub password: SecretString,
}

impl LoginCredentials {
    #[must_use]
    pub fn username(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            identifier: LoginIdentifier::Username(username.into()),
            password: SecretString::from(password.into()),
        }
    }

    #[must_use]
    pub fn email(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            identifier: LoginIdentifier::Email(email.into()),
            password: SecretString::from(password.into()),
        }
    }
}

impl Serialize for LoginCredentials {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(2))?;
        match &self.identifier {
            LoginIdentifier::Username(username) => map.serialize_entry("username", username)?,
            LoginIdentifier::Email(email) => map.serialize_entry("email", email)?,
        }
        map.serialize_entry("password", self.password.expose_secret())?;
        map.end()
    }
}

/// `data` payload of a successful login.
#[derive(Clone, Debug, Deserialize)]
pub struct LoginGrant {
    pub token: Credential,
    pub user: UserProfile,
}
