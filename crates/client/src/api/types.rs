//! Wire types for the `/auth` endpoints.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

use securebank_core::{Email, EmailError, UserId, UserRole};

/// Body of `POST /auth/login`. Not `Debug`: it carries the password.
#[derive(Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Success body of `POST /auth/login`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    #[serde(deserialize_with = "UserId::deserialize_lenient")]
    pub user_id: UserId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<Email>,
    pub role: UserRole,
}

impl std::fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginResponse")
            .field("token", &"[REDACTED]")
            .field("user_id", &self.user_id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("role", &self.role)
            .finish()
    }
}

/// Body of `POST /auth/validate`.
///
/// `username` and `role` are only present when `valid` is true.
#[derive(Debug, Deserialize)]
pub struct ValidateResponse {
    pub valid: bool,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// Error body shared by every endpoint.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Registration
// ─────────────────────────────────────────────────────────────────────────────

const MAX_NAME_LENGTH: usize = 100;
const MAX_USERNAME_LENGTH: usize = 50;
const MAX_EMAIL_LENGTH: usize = 100;
const MIN_PASSWORD_LENGTH: usize = 6;
const MAX_PHONE_LENGTH: usize = 15;

/// A registration payload rejected before it reached the backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("{0} is required")]
    Required(&'static str),

    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("Password must be at least 6 characters")]
    PasswordTooShort,

    #[error("Invalid email format")]
    InvalidEmail(#[source] EmailError),
}

/// Body of `POST /auth/register`.
///
/// The backend opens a default account at `branch_code` for the new user.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    /// Full name as printed on the account.
    pub name: String,
    pub username: String,
    pub email: String,
    #[serde(serialize_with = "expose")]
    pub password: SecretString,
    /// Contact number, optional.
    pub phone: Option<String>,
    /// Branch where the default account is opened.
    pub branch_code: String,
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("name", &self.name)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("phone", &self.phone)
            .field("branch_code", &self.branch_code)
            .finish()
    }
}

impl Registration {
    /// Check the payload against the backend's field rules.
    ///
    /// # Errors
    ///
    /// Returns the first `RegistrationError` found, checking fields in form
    /// order.
    pub fn validate(&self) -> Result<(), RegistrationError> {
        required("Name", &self.name, MAX_NAME_LENGTH)?;
        required("Username", &self.username, MAX_USERNAME_LENGTH)?;
        required("Email", &self.email, MAX_EMAIL_LENGTH)?;
        Email::parse(&self.email).map_err(RegistrationError::InvalidEmail)?;

        let password = self.password.expose_secret();
        if password.is_empty() {
            return Err(RegistrationError::Required("Password"));
        }
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(RegistrationError::PasswordTooShort);
        }

        if let Some(phone) = &self.phone
            && phone.chars().count() > MAX_PHONE_LENGTH
        {
            return Err(RegistrationError::TooLong {
                field: "Phone",
                max: MAX_PHONE_LENGTH,
            });
        }

        if self.branch_code.trim().is_empty() {
            return Err(RegistrationError::Required("Branch code"));
        }
        Ok(())
    }
}

fn required(field: &'static str, value: &str, max: usize) -> Result<(), RegistrationError> {
    if value.trim().is_empty() {
        return Err(RegistrationError::Required(field));
    }
    if value.chars().count() > max {
        return Err(RegistrationError::TooLong { field, max });
    }
    Ok(())
}

fn expose<S: Serializer>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}
