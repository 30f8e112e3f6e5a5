//! SecureBank REST API client.
//!
//! Every request built here is decorated from the credential store: with a
//! persisted token it carries `Authorization: Bearer <token>`, without one the
//! header is left off entirely.
//!
//! # Example
//!
//! ```rust,ignore
//! use securebank_client::{ApiClient, ClientConfig, CredentialStore};
//!
//! let config = ClientConfig::from_env()?;
//! let store = CredentialStore::file(&config.credentials_path);
//! let api = ApiClient::new(config, store)?;
//!
//! let accounts: serde_json::Value = api.get_json("/accounts/my").await?;
//! ```

mod error;
mod types;

pub use error::ApiError;
pub use types::{LoginResponse, Registration, RegistrationError, ValidateResponse};

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, header};
use secrecy::{ExposeSecret, SecretString};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, instrument, warn};

use crate::config::ClientConfig;
use crate::store::CredentialStore;
use types::{ErrorBody, LoginRequest};

// ─────────────────────────────────────────────────────────────────────────────
// Auth backend seam
// ─────────────────────────────────────────────────────────────────────────────

/// The three `/auth` calls the session manager depends on.
///
/// [`ApiClient`] is the production implementation; tests substitute scripted
/// backends.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// `POST /auth/login`.
    async fn login(&self, username: &str, password: &SecretString)
    -> Result<LoginResponse, ApiError>;

    /// `POST /auth/register`. Returns the backend's confirmation payload.
    async fn register(&self, registration: &Registration) -> Result<serde_json::Value, ApiError>;

    /// `POST /auth/validate` for whatever token is currently persisted.
    async fn validate(&self) -> Result<ValidateResponse, ApiError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// HTTP client
// ─────────────────────────────────────────────────────────────────────────────

/// HTTP client for the banking API.
///
/// Cheap to clone; clones share the connection pool and the credential store.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    config: ClientConfig,
    credentials: CredentialStore,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("api_base_url", &self.inner.config.api_base_url.as_str())
            .field("credentials", &self.inner.credentials)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client that reads its bearer token from `credentials`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Request` if the underlying HTTP client cannot be
    /// built (e.g. TLS backend initialization fails).
    pub fn new(config: ClientConfig, credentials: CredentialStore) -> Result<Self, ApiError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.http_timeout)
            .build()
            .map_err(ApiError::Request)?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                config,
                credentials,
            }),
        })
    }

    /// Get the client configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Build a request for an API path, attaching the persisted bearer token
    /// when one exists.
    #[must_use]
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .inner
            .client
            .request(method, self.inner.config.endpoint(path));

        match self.inner.credentials.token() {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    /// `GET` a JSON resource.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails, the server answers with a
    /// non-success status, or the body does not decode as `T`.
    #[instrument(skip(self))]
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        send(self.request(Method::GET, path)).await
    }

    /// `POST` a JSON body and decode the JSON response.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails, the server answers with a
    /// non-success status, or the body does not decode as `T`.
    #[instrument(skip(self, body))]
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        send(self.request(Method::POST, path).json(body)).await
    }
}

#[async_trait]
impl AuthBackend for ApiClient {
    #[instrument(skip(self, password))]
    async fn login(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<LoginResponse, ApiError> {
        let body = LoginRequest {
            username,
            password: password.expose_secret(),
        };
        self.post_json("/auth/login", &body).await
    }

    #[instrument(skip_all, fields(username = %registration.username))]
    async fn register(&self, registration: &Registration) -> Result<serde_json::Value, ApiError> {
        self.post_json("/auth/register", registration).await
    }

    #[instrument(skip(self))]
    async fn validate(&self) -> Result<ValidateResponse, ApiError> {
        send(self.request(Method::POST, "/auth/validate")).await
    }
}

/// Send a request and decode a JSON body, mapping failures to `ApiError`.
///
/// An empty success body decodes as JSON `null`.
async fn send<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, ApiError> {
    let response = builder.send().await.map_err(|e| {
        warn!(error = %e, "Request to banking API failed");
        ApiError::Request(e)
    })?;

    let status = response.status();
    let text = response.text().await.map_err(ApiError::Request)?;

    if status.is_success() {
        let body: &str = if text.trim().is_empty() { "null" } else { &text };
        return serde_json::from_str(body).map_err(|e| ApiError::Response(e.to_string()));
    }

    let message = serde_json::from_str::<ErrorBody>(&text)
        .unwrap_or_default()
        .error
        .filter(|message| !message.trim().is_empty());

    debug!(%status, error = ?message, "Banking API returned an error");
    Err(ApiError::Status { status, message })
}
