//! Customer role enum.

use serde::{Deserialize, Deserializer, Serialize, de};

/// Error returned when a role string is not one the backend issues.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid user role: {0}")]
pub struct RoleError(pub String);

/// Role attached to a banking identity.
///
/// Serialized exactly as the backend spells it: `"USER"` or `"ADMIN"`.
/// Deserialization goes through [`FromStr`](std::str::FromStr), so it accepts
/// the same spellings as parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    /// Retail customer.
    #[default]
    User,
    /// Bank staff with access to the admin console.
    Admin,
}

impl UserRole {
    /// Whether this role may open admin pages.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }

    /// The wire spelling of this role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Admin => "ADMIN",
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UserRole {
    type Err = RoleError;

    /// Parses the backend spelling. JWT claims occasionally carry a `ROLE_`
    /// prefix, which is accepted and ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.strip_prefix("ROLE_").unwrap_or(s) {
            "USER" => Ok(Self::User),
            "ADMIN" => Ok(Self::Admin),
            _ => Err(RoleError(s.to_owned())),
        }
    }
}

impl<'de> Deserialize<'de> for UserRole {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}
