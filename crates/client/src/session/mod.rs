//! Session manager.
//!
//! Single source of truth for who is logged in. Owns the persisted credential
//! (it is the only writer of [`CredentialStore`]), makes the `/auth` calls, and
//! publishes [`SessionState`] through a `tokio::sync::watch` channel that the
//! route guard and pages subscribe to.
//!
//! # Lifecycle
//!
//! 1. [`SessionManager::restore_session`] once at startup: `Loading`, then
//!    `Authenticated` if the persisted token validates, else `Unauthenticated`
//! 2. [`SessionManager::login`] / [`SessionManager::logout`] move between the
//!    two steady states
//! 3. Calling `restore_session` again re-validates silently, without
//!    returning to `Loading`
//!
//! # Stale results
//!
//! Results are applied under a lock together with a generation check. A
//! validation that started before a logout (or a newer login) is discarded; a
//! login that started before a logout is discarded and reported as failed.

mod error;

pub use error::{AuthFailure, AuthResult, LOGIN_FAILED, REGISTRATION_FAILED, SessionError};

use std::sync::{Mutex, MutexGuard, PoisonError};

use secrecy::SecretString;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use securebank_core::{Identity, SessionState, UserId, UserRole};

use crate::api::{ApiClient, AuthBackend, Registration, ValidateResponse};
use crate::store::{CredentialStore, StoredCredential};

/// Counters bumped by transitions that invalidate in-flight work.
#[derive(Debug, Default, Clone, Copy)]
struct Generation {
    /// Bumped by logout and by successful login.
    session: u64,
    /// Bumped by logout only.
    logouts: u64,
}

/// Owns the client session.
///
/// Share it behind an `Arc`; every method takes `&self`.
pub struct SessionManager<B = ApiClient> {
    backend: B,
    store: CredentialStore,
    state: watch::Sender<SessionState>,
    generation: Mutex<Generation>,
}

impl<B> std::fmt::Debug for SessionManager<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("state", &*self.state.borrow())
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl<B: AuthBackend> SessionManager<B> {
    /// Create a session manager in the `Uninitialized` state.
    #[must_use]
    pub fn new(backend: B, store: CredentialStore) -> Self {
        let (state, _) = watch::channel(SessionState::Uninitialized);
        Self {
            backend,
            store,
            state,
            generation: Mutex::new(Generation::default()),
        }
    }

    /// Subscribe to session state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// The logged-in identity, if any.
    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.state.borrow().identity().cloned()
    }

    /// Read-only access to the credential store (e.g. for an HTTP client).
    #[must_use]
    pub const fn store(&self) -> &CredentialStore {
        &self.store
    }

    /// The backend this manager talks to.
    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// Validate the persisted credential and publish the outcome.
    ///
    /// Never fails: every error path (no token, unreadable store, network
    /// failure, rejected or invalid token) ends in `Unauthenticated` with the
    /// persisted credential cleared. Without a persisted token no request is
    /// made.
    #[instrument(skip(self))]
    pub async fn restore_session(&self) -> SessionState {
        let started = {
            let generation = self.lock();
            self.state.send_if_modified(|state| {
                if matches!(state, SessionState::Uninitialized) {
                    *state = SessionState::Loading;
                    true
                } else {
                    false
                }
            });
            generation.session
        };

        let credential = match self.store.load() {
            Ok(Some(credential)) => credential,
            Ok(None) => {
                debug!("No persisted credential");
                self.apply_validation(started, None);
                return self.state();
            }
            Err(e) => {
                warn!(error = %e, "Discarding unreadable credential");
                self.apply_validation(started, None);
                return self.state();
            }
        };

        let outcome = self
            .backend
            .validate()
            .await
            .map_err(SessionError::from)
            .and_then(|response| identity_from_validation(response, credential.user_id));

        match outcome {
            Ok(identity) => {
                if self.apply_validation(started, Some(identity.clone())) {
                    info!(username = %identity.username, role = %identity.role, "Session restored");
                }
            }
            Err(e) => {
                if self.apply_validation(started, None) {
                    info!(reason = %e, "Persisted session rejected");
                }
            }
        }

        self.state()
    }

    /// Log in with username and password.
    ///
    /// On success the token and user ID are persisted and the new identity is
    /// published. On failure storage and identity are untouched; a session
    /// that was never restored settles to `Unauthenticated` so route guards
    /// stop waiting.
    ///
    /// # Errors
    ///
    /// Returns an [`AuthFailure`] carrying the backend's `error` message, or
    /// `"Login failed"` when it sent none.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &SecretString) -> AuthResult<Identity> {
        let logouts = self.lock().logouts;

        let response = match self.backend.login(username, password).await {
            Ok(response) => response,
            Err(e) => {
                self.settle_uninitialized();
                return Err(AuthFailure::new(e, LOGIN_FAILED));
            }
        };

        if response.token.trim().is_empty() {
            self.settle_uninitialized();
            return Err(AuthFailure::new(
                SessionError::UnexpectedResponse("login response carried no token".to_string()),
                LOGIN_FAILED,
            ));
        }

        let identity = Identity {
            user_id: response.user_id.clone(),
            name: response.name,
            username: username.to_owned(),
            email: response.email,
            role: response.role,
        };
        let credential = StoredCredential {
            token: SecretString::from(response.token),
            user_id: response.user_id,
        };

        let mut generation = self.lock();
        if generation.logouts != logouts {
            info!("Discarding login that completed after logout");
            return Err(AuthFailure::new(SessionError::Superseded, LOGIN_FAILED));
        }
        if let Err(e) = self.store.save(&credential) {
            drop(generation);
            self.settle_uninitialized();
            return Err(AuthFailure::new(e, LOGIN_FAILED));
        }
        generation.session += 1;
        self.publish(SessionState::Authenticated(identity.clone()));
        drop(generation);

        info!(role = %identity.role, "Logged in");
        Ok(identity)
    }

    /// Create a new account. Does not log in.
    ///
    /// # Errors
    ///
    /// Returns an [`AuthFailure`] describing the first invalid field, the
    /// backend's `error` message, or `"Registration failed"`.
    #[instrument(skip_all, fields(username = %registration.username))]
    pub async fn register(&self, registration: &Registration) -> AuthResult<serde_json::Value> {
        registration
            .validate()
            .map_err(|e| AuthFailure::new(e, REGISTRATION_FAILED))?;

        let confirmation = self
            .backend
            .register(registration)
            .await
            .map_err(|e| AuthFailure::new(e, REGISTRATION_FAILED))?;

        info!("Registered new account");
        Ok(confirmation)
    }

    /// Clear the persisted credential and the published identity.
    ///
    /// Idempotent and infallible; a storage error is logged, not returned.
    #[instrument(skip(self))]
    pub fn logout(&self) {
        let mut generation = self.lock();
        generation.session += 1;
        generation.logouts += 1;
        self.clear_credential();
        if self.publish(SessionState::Unauthenticated) {
            info!("Logged out");
        }
    }

    /// Apply a validation result if nothing invalidated it meanwhile.
    ///
    /// `None` means the credential is unusable: clear it and publish
    /// `Unauthenticated`. Returns whether the result was applied.
    fn apply_validation(&self, started: u64, identity: Option<Identity>) -> bool {
        let generation = self.lock();
        if generation.session != started {
            debug!("Discarding stale session validation");
            return false;
        }
        match identity {
            Some(mut identity) => {
                if let Some(current) = self.state.borrow().identity()
                    && current.username == identity.username
                    && current.user_id == identity.user_id
                {
                    identity.name.clone_from(&current.name);
                    identity.email.clone_from(&current.email);
                }
                self.publish(SessionState::Authenticated(identity));
            }
            None => {
                self.clear_credential();
                self.publish(SessionState::Unauthenticated);
            }
        }
        true
    }

    /// Move `Uninitialized` to `Unauthenticated`; any other state is kept.
    fn settle_uninitialized(&self) {
        let _guard = self.lock();
        self.state.send_if_modified(|state| {
            if matches!(state, SessionState::Uninitialized) {
                *state = SessionState::Unauthenticated;
                true
            } else {
                false
            }
        });
    }

    fn clear_credential(&self) {
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear persisted credential");
        }
    }

    /// Publish a new state, notifying subscribers only on change.
    fn publish(&self, next: SessionState) -> bool {
        self.state.send_if_modified(|state| {
            if *state == next {
                false
            } else {
                *state = next;
                true
            }
        })
    }

    fn lock(&self) -> MutexGuard<'_, Generation> {
        self.generation
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Turn a validation response into an identity, or explain why not.
fn identity_from_validation(
    response: ValidateResponse,
    user_id: UserId,
) -> Result<Identity, SessionError> {
    if !response.valid {
        return Err(SessionError::TokenInvalid);
    }
    let username = response
        .username
        .filter(|username| !username.trim().is_empty())
        .ok_or_else(|| SessionError::UnexpectedResponse("validation carried no username".into()))?;
    let role = response
        .role
        .ok_or_else(|| SessionError::UnexpectedResponse("validation carried no role".into()))?
        .parse::<UserRole>()
        .map_err(|e| SessionError::UnexpectedResponse(e.to_string()))?;

    Ok(Identity {
        user_id,
        name: None,
        username,
        email: None,
        role,
    })
}
