//! Session lifecycle state.

use serde::{Deserialize, Serialize};

use super::Identity;

/// Published state of the client session.
///
/// ```text
/// Uninitialized -> Loading -> Authenticated | Unauthenticated
/// Authenticated  --logout / failed revalidation--> Unauthenticated
/// Unauthenticated --login--> Authenticated
/// ```
///
/// `Loading` only occurs once, while the persisted credential from a previous
/// run is being validated.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "status", content = "identity", rename_all = "snake_case")]
pub enum SessionState {
    /// Nothing has happened yet.
    #[default]
    Uninitialized,
    /// Startup validation of a persisted token is in flight.
    Loading,
    /// A user is logged in.
    Authenticated(Identity),
    /// Nobody is logged in.
    Unauthenticated,
}

impl SessionState {
    /// Whether the state may still change into `Authenticated` on its own.
    ///
    /// Route guards must wait instead of redirecting while this is true.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Uninitialized | Self::Loading)
    }

    /// The logged-in identity, if any.
    #[must_use]
    pub const fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Authenticated(identity) => Some(identity),
            _ => None,
        }
    }

    /// Whether a user is logged in.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::{UserId, UserRole};

    #[test]
    fn test_pending_states() {
        assert!(SessionState::Uninitialized.is_pending());
        assert!(SessionState::Loading.is_pending());
        assert!(!SessionState::Unauthenticated.is_pending());
    }

    #[test]
    fn test_identity_only_when_authenticated() {
        let identity = Identity {
            user_id: UserId::new("u1"),
            name: None,
            username: "alice".to_owned(),
            email: None,
            role: UserRole::User,
        };
        let state = SessionState::Authenticated(identity.clone());
        assert_eq!(state.identity(), Some(&identity));
        assert!(SessionState::Loading.identity().is_none());
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(SessionState::Unauthenticated).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "unauthenticated" }));
    }
}
