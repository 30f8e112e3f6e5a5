//! Page access predicates.
//!
//! Route guards call these instead of inspecting the session themselves, so
//! every page applies the same rule.

use serde::{Deserialize, Serialize};

use crate::SessionState;

/// Access level a page requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    /// Anyone may view the page.
    Public,
    /// Requires a logged-in identity.
    Protected,
    /// Requires a logged-in identity with the `ADMIN` role.
    Admin,
}

/// Whether a protected page may render.
#[must_use]
pub const fn can_view_protected(session: &SessionState) -> bool {
    session.identity().is_some()
}

/// Whether an admin page may render.
#[must_use]
pub const fn can_view_admin(session: &SessionState) -> bool {
    match session.identity() {
        Some(identity) => identity.is_admin(),
        None => false,
    }
}

/// Whether a page with the given access level may render.
#[must_use]
pub const fn can_view(access: Access, session: &SessionState) -> bool {
    match access {
        Access::Public => true,
        Access::Protected => can_view_protected(session),
        Access::Admin => can_view_admin(session),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Identity, UserId, UserRole};

    fn authenticated(role: UserRole) -> SessionState {
        SessionState::Authenticated(Identity {
            user_id: UserId::new("u1"),
            name: None,
            username: "alice".to_owned(),
            email: None,
            role,
        })
    }

    #[test]
    fn test_public_always_viewable() {
        assert!(can_view(Access::Public, &SessionState::Uninitialized));
        assert!(can_view(Access::Public, &SessionState::Unauthenticated));
    }

    #[test]
    fn test_protected_requires_identity() {
        assert!(!can_view_protected(&SessionState::Loading));
        assert!(!can_view_protected(&SessionState::Unauthenticated));
        assert!(can_view_protected(&authenticated(UserRole::User)));
    }

    #[test]
    fn test_admin_requires_admin_role() {
        assert!(!can_view_admin(&SessionState::Unauthenticated));
        assert!(!can_view_admin(&authenticated(UserRole::User)));
        assert!(can_view_admin(&authenticated(UserRole::Admin)));
    }
}
