//! Integration tests for the SecureBank client session.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p securebank-integration-tests
//! ```
//!
//! No external services are needed. Each test spawns a [`MockBank`], an axum
//! server on `127.0.0.1:0` that speaks the backend's `/auth` contract, and
//! points a real [`ApiClient`](securebank_client::ApiClient) at it.
//!
//! # Mock contract
//!
//! | Route | Behaviour |
//! |-------|-----------|
//! | `POST /api/auth/login` | `200 {token, userId, name, email, role}` or `400 {"error": "Invalid credentials"}` |
//! | `POST /api/auth/register` | `200 {message, userId, email}` or `400 {"error": ...}` |
//! | `POST /api/auth/validate` | `200 {valid, username?, role?}`; `400 {"error": "Invalid token"}` without a bearer header |
//! | `GET /api/accounts/my` | Accounts of the bearer's user, `401` with an empty body otherwise |
//! | `GET /api/debug/headers` | Echoes the `Authorization` header it received |

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::Notify;

use securebank_core::UserRole;

/// Password of every seeded user.
pub const SEEDED_PASSWORD: &str = "secret123";

#[derive(Debug, Clone)]
struct UserRecord {
    user_id: String,
    name: Option<String>,
    email: String,
    password: String,
    role: UserRole,
    branch_code: String,
}

#[derive(Default)]
struct BankState {
    users: Mutex<HashMap<String, UserRecord>>,
    /// Live token -> username.
    tokens: Mutex<HashMap<String, String>>,
    issued: AtomicUsize,
    validate_calls: AtomicUsize,
    /// While set, validation waits for this to be notified.
    validation_gate: Mutex<Option<Arc<Notify>>>,
    validation_started: Notify,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl BankState {
    fn seeded() -> Self {
        let state = Self::default();
        {
            let mut users = lock(&state.users);
            users.insert(
                "alice".to_owned(),
                UserRecord {
                    user_id: "3f6c1a2e-0000-4000-8000-000000000001".to_owned(),
                    name: Some("Alice Doe".to_owned()),
                    email: "alice@securebank.test".to_owned(),
                    password: SEEDED_PASSWORD.to_owned(),
                    role: UserRole::User,
                    branch_code: "BR001".to_owned(),
                },
            );
            users.insert(
                "bob".to_owned(),
                UserRecord {
                    user_id: "3f6c1a2e-0000-4000-8000-000000000002".to_owned(),
                    name: Some("Bob Roe".to_owned()),
                    email: "bob@securebank.test".to_owned(),
                    password: SEEDED_PASSWORD.to_owned(),
                    role: UserRole::User,
                    branch_code: "BR002".to_owned(),
                },
            );
            // No name: display falls back to the email.
            users.insert(
                "root".to_owned(),
                UserRecord {
                    user_id: "3f6c1a2e-0000-4000-8000-000000000003".to_owned(),
                    name: None,
                    email: "admin@securebank.test".to_owned(),
                    password: SEEDED_PASSWORD.to_owned(),
                    role: UserRole::Admin,
                    branch_code: "HQ".to_owned(),
                },
            );
        }
        state
    }

    fn issue_token(&self, username: &str) -> String {
        let n = self.issued.fetch_add(1, Ordering::SeqCst);
        let token = format!("mock-{n}-{username}");
        lock(&self.tokens).insert(token.clone(), username.to_owned());
        token
    }

    /// User behind a live bearer token.
    fn bearer_user(&self, headers: &HeaderMap) -> Option<(String, UserRecord)> {
        let token = bearer(headers)?;
        let username = lock(&self.tokens).get(token).cloned()?;
        let user = lock(&self.users).get(&username).cloned()?;
        Some((username, user))
    }
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct LoginBody {
    username: String,
    password: String,
}

async fn login(State(state): State<Arc<BankState>>, Json(body): Json<LoginBody>) -> Response {
    let user = lock(&state.users)
        .get(&body.username)
        .filter(|user| user.password == body.password)
        .cloned();
    let Some(user) = user else {
        tracing::debug!(username = %body.username, "Mock login rejected");
        return error(StatusCode::BAD_REQUEST, "Invalid credentials");
    };

    let token = state.issue_token(&body.username);
    Json(json!({
        "token": token,
        "userId": user.user_id,
        "name": user.name,
        "email": user.email,
        "role": user.role,
    }))
    .into_response()
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterBody {
    name: String,
    username: String,
    email: String,
    password: String,
    branch_code: String,
}

async fn register(State(state): State<Arc<BankState>>, Json(body): Json<RegisterBody>) -> Response {
    let mut users = lock(&state.users);
    if users.contains_key(&body.username) {
        return error(StatusCode::BAD_REQUEST, "Username already exists");
    }
    if users.values().any(|user| user.email == body.email) {
        return error(StatusCode::BAD_REQUEST, "Email already exists");
    }

    let user_id = format!("3f6c1a2e-0000-4000-8000-{:012}", users.len() + 1);
    users.insert(
        body.username,
        UserRecord {
            user_id: user_id.clone(),
            name: Some(body.name),
            email: body.email.clone(),
            password: body.password,
            role: UserRole::User,
            branch_code: body.branch_code,
        },
    );

    Json(json!({
        "message": "User registered successfully",
        "userId": user_id,
        "email": body.email,
    }))
    .into_response()
}

async fn validate(State(state): State<Arc<BankState>>, headers: HeaderMap) -> Response {
    state.validate_calls.fetch_add(1, Ordering::SeqCst);
    let gate = lock(&state.validation_gate).clone();
    state.validation_started.notify_one();
    if let Some(gate) = gate {
        gate.notified().await;
    }

    if bearer(&headers).is_none() {
        return error(StatusCode::BAD_REQUEST, "Invalid token");
    }
    match state.bearer_user(&headers) {
        Some((username, user)) => Json(json!({
            "valid": true,
            "username": username,
            "role": user.role,
        }))
        .into_response(),
        None => Json(json!({ "valid": false })).into_response(),
    }
}

async fn my_accounts(State(state): State<Arc<BankState>>, headers: HeaderMap) -> Response {
    let Some((_, user)) = state.bearer_user(&headers) else {
        return StatusCode::UNAUTHORIZED.into_response();
    };
    Json(json!([{
        "accountNumber": format!("{}-0001", user.branch_code),
        "branchCode": user.branch_code,
        "balance": "0.00",
        "owner": user.user_id,
    }]))
    .into_response()
}

async fn echo_headers(headers: HeaderMap) -> Response {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    Json(json!({ "authorization": authorization })).into_response()
}

// ─────────────────────────────────────────────────────────────────────────────
// Server
// ─────────────────────────────────────────────────────────────────────────────

/// In-process mock of the SecureBank backend.
///
/// Seeded with `alice` and `bob` (role `USER`) and `root` (role `ADMIN`), all
/// with password [`SEEDED_PASSWORD`]. The server runs until the test's runtime
/// shuts down.
#[derive(Clone)]
pub struct MockBank {
    addr: SocketAddr,
    state: Arc<BankState>,
}

impl MockBank {
    /// Bind to an ephemeral local port and start serving.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the listener cannot be bound.
    pub async fn spawn() -> std::io::Result<Self> {
        let state = Arc::new(BankState::seeded());
        let app = Router::new()
            .route("/api/auth/login", post(login))
            .route("/api/auth/register", post(register))
            .route("/api/auth/validate", post(validate))
            .route("/api/accounts/my", get(my_accounts))
            .route("/api/debug/headers", get(echo_headers))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "Mock bank stopped");
            }
        });

        Ok(Self { addr, state })
    }

    /// Base URL to configure the client with, e.g. `http://127.0.0.1:4321/api`.
    #[must_use]
    pub fn api_base_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    /// Backend-side user ID of a seeded or registered user.
    #[must_use]
    pub fn user_id(&self, username: &str) -> Option<String> {
        lock(&self.state.users)
            .get(username)
            .map(|user| user.user_id.clone())
    }

    /// Issue a token for `username` without going through `/auth/login`.
    #[must_use]
    pub fn issue_token(&self, username: &str) -> String {
        self.state.issue_token(username)
    }

    /// Invalidate every issued token, as if they all expired.
    pub fn expire_tokens(&self) {
        lock(&self.state.tokens).clear();
    }

    /// Number of `/auth/validate` requests received.
    #[must_use]
    pub fn validate_calls(&self) -> usize {
        self.state.validate_calls.load(Ordering::SeqCst)
    }

    /// Hold every `/auth/validate` request until [`resume_validation`](Self::resume_validation).
    pub fn pause_validation(&self) {
        *lock(&self.state.validation_gate) = Some(Arc::new(Notify::new()));
    }

    /// Release held `/auth/validate` requests and stop holding new ones.
    ///
    /// Releases one waiter; pause around a single request at a time.
    pub fn resume_validation(&self) {
        if let Some(gate) = lock(&self.state.validation_gate).take() {
            gate.notify_one();
        }
    }

    /// Wait until a `/auth/validate` request has arrived.
    pub async fn validation_started(&self) {
        self.state.validation_started.notified().await;
    }
}
