//! Authenticated identity published by the session.

use serde::{Deserialize, Serialize};

use super::{Email, UserId, UserRole};

/// Who is logged in.
///
/// A fresh login fills every field from the login response. A restored session
/// only knows what the token validation endpoint returns, so `name` and
/// `email` are `None` until the next login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Backend user identifier.
    pub user_id: UserId,
    /// Full name, when known.
    pub name: Option<String>,
    /// Login name.
    pub username: String,
    /// Contact email, when known.
    pub email: Option<Email>,
    /// Permission level.
    pub role: UserRole,
}

impl Identity {
    /// Name to greet the user with: full name, then email, then username.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .or_else(|| self.email.as_ref().map(Email::as_str))
            .unwrap_or(&self.username)
    }

    /// Whether this identity may open admin pages.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}
