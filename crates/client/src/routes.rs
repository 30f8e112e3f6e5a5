//! Route table and guard.
//!
//! Pages never inspect the session directly. They ask [`guard`] (or a
//! [`RouteGuard`] bound to a session manager) whether they may render, and
//! follow the returned [`Navigation`] otherwise.

use tokio::sync::watch;

use securebank_core::{Access, Identity, SessionState, can_view};

/// Where unauthenticated visitors to a protected page are sent.
pub const LOGIN_PATH: &str = "/login";

/// Landing page after login, and where non-admins are sent from `/admin`.
pub const DASHBOARD_PATH: &str = "/dashboard";

/// Landing page for admins logging in without a specific destination.
pub const ADMIN_PATH: &str = "/admin";

/// A page of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    Home,
    Login,
    Register,
    Dashboard,
    PersonalFinance,
    BankOverview,
    AlertsCenter,
    AdminDashboard,
}

impl Page {
    /// Every page, in navigation order.
    pub const ALL: [Self; 8] = [
        Self::Home,
        Self::Login,
        Self::Register,
        Self::Dashboard,
        Self::PersonalFinance,
        Self::BankOverview,
        Self::AlertsCenter,
        Self::AdminDashboard,
    ];

    /// Look up the page mounted at `path`. A trailing slash is ignored.
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        let path = match path.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        };
        Self::ALL.into_iter().find(|page| page.path() == path)
    }

    /// Path the page is mounted at.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::Login => LOGIN_PATH,
            Self::Register => "/register",
            Self::Dashboard => DASHBOARD_PATH,
            Self::PersonalFinance => "/personal-finance",
            Self::BankOverview => "/banking",
            Self::AlertsCenter => "/alerts",
            Self::AdminDashboard => ADMIN_PATH,
        }
    }

    /// Human-readable title.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Home => "Home",
            Self::Login => "Login",
            Self::Register => "Register",
            Self::Dashboard => "Dashboard",
            Self::PersonalFinance => "Personal Finance",
            Self::BankOverview => "Bank Overview",
            Self::AlertsCenter => "Alerts",
            Self::AdminDashboard => "Admin",
        }
    }

    /// Access level required to render the page.
    #[must_use]
    pub const fn access(self) -> Access {
        match self {
            Self::Home | Self::Login | Self::Register => Access::Public,
            Self::Dashboard | Self::PersonalFinance | Self::BankOverview | Self::AlertsCenter => {
                Access::Protected
            }
            Self::AdminDashboard => Access::Admin,
        }
    }
}

/// Outcome of guarding a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// The page may render.
    Render(Page),
    /// The session is not settled yet; show a loading indicator and ask again.
    Pending,
    /// Go elsewhere. `from` is the originally requested path, for returning
    /// after login.
    Redirect {
        to: &'static str,
        from: Option<String>,
    },
    /// No page is mounted at the path.
    NotFound,
}

impl std::fmt::Display for Navigation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Render(page) => write!(f, "render {} ({})", page.title(), page.path()),
            Self::Pending => f.write_str("pending"),
            Self::Redirect { to, from: Some(from) } => write!(f, "redirect to {to} (from {from})"),
            Self::Redirect { to, from: None } => write!(f, "redirect to {to}"),
            Self::NotFound => f.write_str("not found"),
        }
    }
}

/// Decide what to do with a visit to `path` in the given session state.
///
/// Public pages always render. Protected pages render for any identity and
/// send everyone else to `/login`, remembering `path`. The admin page renders
/// only for admins and sends everyone else to `/dashboard`.
#[must_use]
pub fn guard(state: &SessionState, path: &str) -> Navigation {
    let Some(page) = Page::from_path(path) else {
        return Navigation::NotFound;
    };
    let access = page.access();
    if access == Access::Public {
        return Navigation::Render(page);
    }
    if state.is_pending() {
        return Navigation::Pending;
    }
    if can_view(access, state) {
        return Navigation::Render(page);
    }
    match access {
        Access::Admin => Navigation::Redirect {
            to: DASHBOARD_PATH,
            from: None,
        },
        Access::Public | Access::Protected => Navigation::Redirect {
            to: LOGIN_PATH,
            from: Some(page.path().to_owned()),
        },
    }
}

/// Where to go after a successful login.
///
/// `from` defaults to `/dashboard`. Admins headed for the dashboard land on
/// `/admin` instead.
#[must_use]
pub fn post_login_destination(identity: &Identity, from: Option<&str>) -> String {
    let from = from.filter(|f| !f.trim().is_empty()).unwrap_or(DASHBOARD_PATH);
    if identity.is_admin() && from == DASHBOARD_PATH {
        ADMIN_PATH.to_owned()
    } else {
        from.to_owned()
    }
}

/// Navigation bar entries for the given state.
///
/// Empty while the session is pending.
#[must_use]
pub fn navigation_links(state: &SessionState) -> Vec<Page> {
    match state {
        SessionState::Uninitialized | SessionState::Loading => Vec::new(),
        SessionState::Unauthenticated => vec![Page::Login, Page::Register],
        SessionState::Authenticated(_) => Page::ALL
            .into_iter()
            .filter(|page| page.access() != Access::Public && can_view(page.access(), state))
            .collect(),
    }
}

/// Guard bound to a live session.
#[derive(Debug, Clone)]
pub struct RouteGuard {
    state: watch::Receiver<SessionState>,
}

impl RouteGuard {
    /// Bind to a session's state channel (see
    /// [`SessionManager::subscribe`](crate::SessionManager::subscribe)).
    #[must_use]
    pub const fn new(state: watch::Receiver<SessionState>) -> Self {
        Self { state }
    }

    /// Guard `path` against the current state, possibly `Pending`.
    #[must_use]
    pub fn check(&self, path: &str) -> Navigation {
        guard(&self.state.borrow(), path)
    }

    /// Wait for the session to settle, then guard `path`.
    ///
    /// If the session manager is dropped first, guards against the last
    /// published state.
    pub async fn resolve(&mut self, path: &str) -> Navigation {
        if let Ok(state) = self.state.wait_for(|state| !state.is_pending()).await {
            return guard(&state, path);
        }
        guard(&self.state.borrow(), path)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use securebank_core::{UserId, UserRole};

    use super::*;

    fn signed_in(role: UserRole) -> SessionState {
        SessionState::Authenticated(Identity {
            user_id: UserId::new("u1"),
            name: None,
            username: "alice".to_owned(),
            email: None,
            role,
        })
    }

    #[test]
    fn test_page_lookup() {
        assert_eq!(Page::from_path("/"), Some(Page::Home));
        assert_eq!(Page::from_path("/banking/"), Some(Page::BankOverview));
        assert_eq!(Page::from_path("/nope"), None);
        for page in Page::ALL {
            assert_eq!(Page::from_path(page.path()), Some(page));
        }
    }

    #[test]
    fn test_protected_page_redirects_to_login() {
        assert_eq!(
            guard(&SessionState::Unauthenticated, "/alerts"),
            Navigation::Redirect {
                to: "/login",
                from: Some("/alerts".to_owned()),
            }
        );
        assert_eq!(
            guard(&signed_in(UserRole::User), "/alerts"),
            Navigation::Render(Page::AlertsCenter)
        );
    }

    #[test]
    fn test_admin_page() {
        let redirect = Navigation::Redirect {
            to: "/dashboard",
            from: None,
        };
        assert_eq!(guard(&signed_in(UserRole::User), "/admin"), redirect);
        assert_eq!(guard(&SessionState::Unauthenticated, "/admin"), redirect);
        assert_eq!(
            guard(&signed_in(UserRole::Admin), "/admin"),
            Navigation::Render(Page::AdminDashboard)
        );
    }

    #[test]
    fn test_pending_session() {
        assert_eq!(guard(&SessionState::Loading, "/dashboard"), Navigation::Pending);
        assert_eq!(guard(&SessionState::Uninitialized, "/admin"), Navigation::Pending);
        assert_eq!(
            guard(&SessionState::Loading, "/login"),
            Navigation::Render(Page::Login)
        );
        assert_eq!(guard(&SessionState::Loading, "/missing"), Navigation::NotFound);
    }

    #[test]
    fn test_post_login_destination() {
        let user = signed_in(UserRole::User);
        let admin = signed_in(UserRole::Admin);
        let user = user.identity().unwrap();
        let admin = admin.identity().unwrap();

        assert_eq!(post_login_destination(user, None), "/dashboard");
        assert_eq!(post_login_destination(admin, None), "/admin");
        assert_eq!(post_login_destination(admin, Some("/dashboard")), "/admin");
        assert_eq!(post_login_destination(admin, Some("/alerts")), "/alerts");
        assert_eq!(post_login_destination(user, Some("/banking")), "/banking");
    }

    #[test]
    fn test_navigation_links() {
        assert!(navigation_links(&SessionState::Loading).is_empty());
        assert_eq!(
            navigation_links(&SessionState::Unauthenticated),
            vec![Page::Login, Page::Register]
        );
        assert_eq!(
            navigation_links(&signed_in(UserRole::User)),
            vec![
                Page::Dashboard,
                Page::PersonalFinance,
                Page::BankOverview,
                Page::AlertsCenter
            ]
        );
        assert_eq!(
            navigation_links(&signed_in(UserRole::Admin)).last(),
            Some(&Page::AdminDashboard)
        );
    }

    #[tokio::test]
    async fn test_resolve_waits_for_settled_state() {
        let (tx, rx) = watch::channel(SessionState::Loading);
        let mut route_guard = RouteGuard::new(rx);
        assert_eq!(route_guard.check("/dashboard"), Navigation::Pending);

        let waiter = tokio::spawn(async move { route_guard.resolve("/dashboard").await });
        tx.send(signed_in(UserRole::User)).unwrap();

        assert_eq!(waiter.await.unwrap(), Navigation::Render(Page::Dashboard));
    }

    #[tokio::test]
    async fn test_resolve_after_sender_dropped() {
        let (tx, rx) = watch::channel(SessionState::Loading);
        let mut route_guard = RouteGuard::new(rx);
        drop(tx);
        assert_eq!(route_guard.resolve("/dashboard").await, Navigation::Pending);
    }
}
