//! SecureBank Client - Session lifecycle for the SecureBank front end.
//!
//! # Architecture
//!
//! - [`SessionManager`] owns the persisted credential and publishes
//!   [`SessionState`](securebank_core::SessionState) on a watch channel
//! - [`ApiClient`] reads the credential store and attaches the bearer token
//!   to every request
//! - [`routes`] turns the published state into render/redirect decisions
//!
//! # Example
//!
//! ```rust,ignore
//! use securebank_client::{ApiClient, ClientConfig, CredentialStore, RouteGuard, SessionManager};
//!
//! let config = ClientConfig::from_env()?;
//! let store = CredentialStore::file(&config.credentials_path);
//! let api = ApiClient::new(config, store.clone())?;
//! let session = SessionManager::new(api, store);
//!
//! let mut guard = RouteGuard::new(session.subscribe());
//! session.restore_session().await;
//! let navigation = guard.resolve("/dashboard").await;
//! ```
//!
//! # Modules
//!
//! - [`config`] - Environment-driven configuration
//! - [`store`] - Persisted token and user ID
//! - [`api`] - HTTP client and the `/auth` backend seam
//! - [`session`] - Session manager and its errors
//! - [`routes`] - Route table and guard

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod routes;
pub mod session;
pub mod store;

pub use api::{ApiClient, ApiError, AuthBackend, LoginResponse, Registration, RegistrationError};
pub use config::{ClientConfig, ConfigError};
pub use routes::{Navigation, Page, RouteGuard, guard, navigation_links, post_login_destination};
pub use session::{AuthFailure, AuthResult, SessionError, SessionManager};
pub use store::{CredentialStore, StoreError, StoredCredential};
