//! End-to-end session lifecycle against the mock bank.
//!
//! Every test runs the real `ApiClient` and a file-backed credential store in
//! a temporary directory. A "reload" is a fresh `SessionManager` over the same
//! credentials file.

#![allow(clippy::unwrap_used)]

use std::path::Path;
use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tempfile::TempDir;

use securebank_client::{
    ApiClient, ApiError, ClientConfig, CredentialStore, Navigation, Page, Registration,
    RouteGuard, SessionError, SessionManager, post_login_destination,
};
use securebank_core::{SessionState, UserRole, can_view_admin, can_view_protected};
use securebank_integration_tests::{MockBank, SEEDED_PASSWORD};

fn session_for(api_base_url: &str, credentials: &Path) -> SessionManager {
    let mut config = ClientConfig::new(api_base_url).unwrap();
    config.credentials_path = credentials.to_path_buf();
    let store = CredentialStore::file(&config.credentials_path);
    let api = ApiClient::new(config, store.clone()).unwrap();
    SessionManager::new(api, store)
}

struct Harness {
    bank: MockBank,
    dir: TempDir,
}

impl Harness {
    async fn new() -> Self {
        Self {
            bank: MockBank::spawn().await.unwrap(),
            dir: TempDir::new().unwrap(),
        }
    }

    fn credentials(&self) -> std::path::PathBuf {
        self.dir.path().join("credentials.json")
    }

    /// A new client process sharing the persisted credential.
    fn reload(&self) -> SessionManager {
        session_for(&self.bank.api_base_url(), &self.credentials())
    }
}

fn password(p: &str) -> SecretString {
    SecretString::from(p)
}

#[tokio::test]
async fn test_fresh_start_without_token() {
    let h = Harness::new().await;
    let session = h.reload();

    assert_eq!(session.restore_session().await, SessionState::Unauthenticated);
    assert_eq!(h.bank.validate_calls(), 0);
    assert!(!can_view_protected(&session.state()));
}

#[tokio::test]
async fn test_login_persists_and_survives_reload() {
    let h = Harness::new().await;
    let session = h.reload();
    session.restore_session().await;

    let identity = session
        .login("alice", &password(SEEDED_PASSWORD))
        .await
        .unwrap();
    assert_eq!(identity.display_name(), "Alice Doe");
    assert_eq!(identity.role, UserRole::User);

    let raw: Value = serde_json::from_str(&std::fs::read_to_string(h.credentials()).unwrap()).unwrap();
    assert!(raw["token"].as_str().unwrap().starts_with("mock-"));
    assert_eq!(
        raw["userId"].as_str(),
        h.bank.user_id("alice").as_deref()
    );

    let reloaded = h.reload();
    let state = reloaded.restore_session().await;
    let restored = state.identity().unwrap();
    assert_eq!(restored.username, "alice");
    assert_eq!(restored.role, UserRole::User);
    assert_eq!(Some(restored.user_id.as_str().to_owned()), h.bank.user_id("alice"));
    assert_eq!(h.bank.validate_calls(), 1);
}

#[tokio::test]
async fn test_invalid_credentials() {
    let h = Harness::new().await;
    let session = h.reload();
    session.restore_session().await;

    let failure = session
        .login("alice", &password("wrong-password"))
        .await
        .unwrap_err();

    assert_eq!(failure.message(), "Invalid credentials");
    assert_eq!(session.state(), SessionState::Unauthenticated);
    assert!(session.store().load().unwrap().is_none());
}

#[tokio::test]
async fn test_expired_token_is_cleared_on_restore() {
    let h = Harness::new().await;
    h.reload()
        .login("alice", &password(SEEDED_PASSWORD))
        .await
        .unwrap();
    h.bank.expire_tokens();

    let session = h.reload();
    assert_eq!(session.restore_session().await, SessionState::Unauthenticated);
    assert!(session.store().load().unwrap().is_none());
    assert!(!h.credentials().exists());

    // Nothing left to validate.
    assert_eq!(h.reload().restore_session().await, SessionState::Unauthenticated);
    assert_eq!(h.bank.validate_calls(), 1);
}

#[tokio::test]
async fn test_logout_removes_bearer_header() {
    let h = Harness::new().await;
    let session = h.reload();
    session
        .login("bob", &password(SEEDED_PASSWORD))
        .await
        .unwrap();

    let echoed: Value = session.backend().get_json("/debug/headers").await.unwrap();
    let authorization = echoed["authorization"].as_str().unwrap();
    let stored = session.store().load().unwrap().unwrap();
    assert_eq!(
        authorization,
        format!("Bearer {}", stored.token.expose_secret())
    );

    session.logout();
    session.logout();

    assert_eq!(session.state(), SessionState::Unauthenticated);
    assert!(session.store().load().unwrap().is_none());
    let echoed: Value = session.backend().get_json("/debug/headers").await.unwrap();
    assert!(echoed["authorization"].is_null());
}

#[tokio::test]
async fn test_authorized_page_fetch() {
    let h = Harness::new().await;
    let session = h.reload();

    let err = session
        .backend()
        .get_json::<Value>("/accounts/my")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Status { status, message: None } if status.as_u16() == 401));

    session
        .login("bob", &password(SEEDED_PASSWORD))
        .await
        .unwrap();
    let accounts: Value = session.backend().get_json("/accounts/my").await.unwrap();
    assert_eq!(accounts[0]["branchCode"], "BR002");
}

#[tokio::test]
async fn test_unreachable_backend() {
    let h = Harness::new().await;
    h.reload()
        .login("alice", &password(SEEDED_PASSWORD))
        .await
        .unwrap();

    // Nothing listens on a port we bound and released.
    let closed = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead_url = format!("http://{}/api", closed.local_addr().unwrap());
    drop(closed);

    let session = session_for(&dead_url, &h.credentials());
    assert_eq!(session.restore_session().await, SessionState::Unauthenticated);
    assert!(session.store().load().unwrap().is_none());

    let failure = session
        .login("alice", &password(SEEDED_PASSWORD))
        .await
        .unwrap_err();
    assert_eq!(failure.message(), "Login failed");
    assert!(matches!(failure.cause(), SessionError::NetworkFailure(_)));
}

#[tokio::test]
async fn test_logout_during_pending_restore() {
    let h = Harness::new().await;
    h.reload()
        .login("alice", &password(SEEDED_PASSWORD))
        .await
        .unwrap();

    let session = Arc::new(h.reload());
    h.bank.pause_validation();
    let restore = tokio::spawn({
        let session = Arc::clone(&session);
        async move { session.restore_session().await }
    });

    h.bank.validation_started().await;
    assert_eq!(session.state(), SessionState::Loading);
    session.logout();
    h.bank.resume_validation();

    assert_eq!(restore.await.unwrap(), SessionState::Unauthenticated);
    assert!(session.identity().is_none());
    assert!(session.store().load().unwrap().is_none());
}

#[tokio::test]
async fn test_stale_rejection_keeps_new_login() {
    let h = Harness::new().await;
    h.reload()
        .login("alice", &password(SEEDED_PASSWORD))
        .await
        .unwrap();
    h.bank.expire_tokens();

    let session = Arc::new(h.reload());
    h.bank.pause_validation();
    let restore = tokio::spawn({
        let session = Arc::clone(&session);
        async move { session.restore_session().await }
    });

    h.bank.validation_started().await;
    session
        .login("bob", &password(SEEDED_PASSWORD))
        .await
        .unwrap();
    h.bank.resume_validation();

    let state = restore.await.unwrap();
    assert_eq!(state.identity().unwrap().username, "bob");
    let stored = session.store().load().unwrap().unwrap();
    assert!(stored.token.expose_secret().ends_with("-bob"));
}

#[tokio::test]
async fn test_route_guard_waits_for_restore() {
    let h = Harness::new().await;
    h.reload()
        .login("alice", &password(SEEDED_PASSWORD))
        .await
        .unwrap();

    let session = Arc::new(h.reload());
    let mut guard = RouteGuard::new(session.subscribe());
    h.bank.pause_validation();
    let restore = tokio::spawn({
        let session = Arc::clone(&session);
        async move { session.restore_session().await }
    });

    h.bank.validation_started().await;
    assert_eq!(guard.check("/dashboard"), Navigation::Pending);
    assert_eq!(guard.check("/"), Navigation::Render(Page::Home));

    h.bank.resume_validation();
    assert_eq!(
        guard.resolve("/dashboard").await,
        Navigation::Render(Page::Dashboard)
    );
    assert_eq!(
        guard.check("/admin"),
        Navigation::Redirect {
            to: "/dashboard",
            from: None
        }
    );
    restore.await.unwrap();
}

#[tokio::test]
async fn test_admin_login_lands_on_admin() {
    let h = Harness::new().await;
    let session = h.reload();
    session.restore_session().await;

    let mut guard = RouteGuard::new(session.subscribe());
    assert_eq!(
        guard.resolve("/alerts").await,
        Navigation::Redirect {
            to: "/login",
            from: Some("/alerts".to_owned())
        }
    );

    let identity = session
        .login("root", &password(SEEDED_PASSWORD))
        .await
        .unwrap();

    assert_eq!(identity.display_name(), "admin@securebank.test");
    assert!(can_view_admin(&session.state()));
    assert_eq!(post_login_destination(&identity, None), "/admin");
    assert_eq!(post_login_destination(&identity, Some("/alerts")), "/alerts");
    assert_eq!(
        guard.resolve("/admin").await,
        Navigation::Render(Page::AdminDashboard)
    );
}

#[tokio::test]
async fn test_register_then_login() {
    let h = Harness::new().await;
    let session = h.reload();
    session.restore_session().await;

    let mut registration = Registration {
        name: "Carol Poe".to_owned(),
        username: "carol".to_owned(),
        email: "carol@securebank.test".to_owned(),
        password: password("hunter22"),
        phone: Some("5550100".to_owned()),
        branch_code: "BR003".to_owned(),
    };

    let confirmation = session.register(&registration).await.unwrap();
    assert_eq!(confirmation["message"], "User registered successfully");
    assert_eq!(session.state(), SessionState::Unauthenticated);
    assert!(session.store().load().unwrap().is_none());

    let failure = session.register(&registration).await.unwrap_err();
    assert_eq!(failure.message(), "Username already exists");

    registration.username = "carol2".to_owned();
    registration.email = "carol-at-nowhere".to_owned();
    let failure = session.register(&registration).await.unwrap_err();
    assert_eq!(failure.message(), "Invalid email format");

    let identity = session
        .login("carol", &password("hunter22"))
        .await
        .unwrap();
    assert_eq!(identity.display_name(), "Carol Poe");
    assert_eq!(h.bank.user_id("carol"), Some(identity.user_id.into_inner()));
}
