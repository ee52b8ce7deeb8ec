//! Identity types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::AuthError;

/// Dashboard role for authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Store administrator with catalog and pricing access.
    Admin,
    /// Operations staff working deliveries and riders.
    SubAdmin,
}

impl Role {
    /// Get role as its wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::SubAdmin => "SUB_ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(Role::Admin),
            "SUB_ADMIN" => Ok(Role::SubAdmin),
            other => Err(AuthError::UnknownRole(other.to_string())),
        }
    }
}

/// Account status reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProfileStatus {
    /// Account is active.
    Active,
    /// Account is disabled or suspended.
    Inactive,
    /// Status was missing, unrecognised, or the profile could not be read.
    #[default]
    #[serde(other)]
    Unknown,
}

/// User profile attached to an identity.
///
/// Known fields are typed; anything else the backend sends is kept in
/// `extra` so it survives a save/load cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Profile {
    /// Backend user id (numeric ids are kept as their decimal string).
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "id_from_string_or_number"
    )]
    pub id: Option<String>,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Email address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Phone number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Account status.
    #[serde(default)]
    pub status: ProfileStatus,
    /// Remaining fields, preserved verbatim.
    ///
    /// Keys that name a typed field above are never written out; the typed
    /// field wins.
    #[serde(flatten, serialize_with = "serialize_extra")]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

const PROFILE_FIELDS: [&str; 5] = ["id", "name", "email", "phone", "status"];

fn serialize_extra<S>(
    extra: &serde_json::Map<String, serde_json::Value>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_map(
        extra
            .iter()
            .filter(|(key, _)| !PROFILE_FIELDS.contains(&key.as_str())),
    )
}

impl Profile {
    /// Profile used when the persisted profile cannot be decoded.
    ///
    /// All optional fields are empty and the status is [`ProfileStatus::Unknown`].
    pub fn placeholder() -> Self {
        Self::default()
    }

    /// Check whether this is the placeholder profile.
    pub fn is_placeholder(&self) -> bool {
        *self == Self::placeholder()
    }
}

fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(Option::<RawId>::deserialize(deserializer)?.map(|raw| match raw {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    }))
}

/// An authenticated identity.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    /// Bearer token for API calls.
    pub token: String,
    /// Dashboard role.
    pub role: Role,
    /// Login name.
    pub username: String,
    /// User profile.
    pub profile: Profile,
}

impl Identity {
    /// Create a new identity.
    pub fn new(
        token: impl Into<String>,
        role: Role,
        username: impl Into<String>,
        profile: Profile,
    ) -> Self {
        Self {
            token: token.into(),
            role,
            username: username.into(),
            profile,
        }
    }

    /// Same identity carrying a different token.
    pub fn with_token(&self, token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            ..self.clone()
        }
    }

    /// Check if the identity has the given role.
    pub fn has_role(&self, role: Role) -> bool {
        self.role == role
    }

    /// Name to show in the UI.
    pub fn display_name(&self) -> &str {
        self.profile.name.as_deref().unwrap_or(&self.username)
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("token", &"<redacted>")
            .field("role", &self.role)
            .field("username", &self.username)
            .field("profile", &self.profile)
            .finish()
    }
}

/// Login form input.
#[derive(Clone, Serialize)]
pub struct LoginCredentials {
    /// Email or username.
    pub identifier: String,
    /// Password.
    pub credential: String,
}

impl LoginCredentials {
    /// Create new credentials.
    pub fn new(identifier: impl Into<String>, credential: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            credential: credential.into(),
        }
    }
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("identifier", &self.identifier)
            .field("credential", &"<redacted>")
            .finish()
    }
}
