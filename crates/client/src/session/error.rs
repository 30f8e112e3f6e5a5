//! Session error types.

use reqwest::StatusCode;
use thiserror::Error;

use crate::api::{ApiError, RegistrationError};
use crate::store::StoreError;

/// Fallback message for a failed login when the backend gave none.
pub const LOGIN_FAILED: &str = "Login failed";

/// Fallback message for a failed registration when the backend gave none.
pub const REGISTRATION_FAILED: &str = "Registration failed";

/// Errors that can occur during session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The backend could not be reached.
    #[error("could not reach the banking server: {0}")]
    NetworkFailure(#[source] ApiError),

    /// The backend answered with a structured error (bad credentials,
    /// duplicate username, ...).
    #[error("request rejected with {status}: {}", .message.as_deref().unwrap_or("no details"))]
    AuthRejected {
        /// HTTP status.
        status: StatusCode,
        /// Backend-supplied message, if any.
        message: Option<String>,
    },

    /// The validation endpoint did not confirm the persisted token.
    #[error("token is invalid or expired")]
    TokenInvalid,

    /// A success response that did not carry what the session needs.
    #[error("unexpected response from the banking server: {0}")]
    UnexpectedResponse(String),

    /// Reading or writing the persisted credential failed.
    #[error("credential storage failed: {0}")]
    Storage(#[from] StoreError),

    /// Registration payload failed local validation.
    #[error(transparent)]
    InvalidRegistration(#[from] RegistrationError),

    /// A logout happened while the request was in flight.
    #[error("session ended before login completed")]
    Superseded,
}

impl From<ApiError> for SessionError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Status { status, message } => Self::AuthRejected { status, message },
            ApiError::Response(detail) => Self::UnexpectedResponse(detail),
            err @ ApiError::Request(_) => Self::NetworkFailure(err),
        }
    }
}

impl SessionError {
    /// Message suitable for showing the user, if this error carries one.
    #[must_use]
    pub fn user_message(&self) -> Option<String> {
        match self {
            Self::AuthRejected {
                message: Some(message),
                ..
            } => Some(message.clone()),
            Self::InvalidRegistration(err) => Some(err.to_string()),
            Self::Superseded => Some("Session ended before login completed".to_string()),
            _ => None,
        }
    }
}

/// Failure result of [`login`](super::SessionManager::login) and
/// [`register`](super::SessionManager::register).
///
/// Always carries a human-readable message: the backend's own when it sent
/// one, otherwise a fixed fallback.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct AuthFailure {
    message: String,
    #[source]
    cause: SessionError,
}

impl AuthFailure {
    pub(crate) fn new(cause: impl Into<SessionError>, fallback: &str) -> Self {
        let cause = cause.into();
        let message = cause
            .user_message()
            .unwrap_or_else(|| fallback.to_string());
        Self { message, cause }
    }

    /// Message to show the user.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// What went wrong underneath.
    #[must_use]
    pub const fn cause(&self) -> &SessionError {
        &self.cause
    }
}

/// Result type for operations that report an [`AuthFailure`].
pub type AuthResult<T> = std::result::Result<T, AuthFailure>;
