//! Session commands: `login`, `logout`, `register`, `whoami`.

use secrecy::SecretString;
use securebank_client::{AuthFailure, ClientConfig, Registration, post_login_destination};
use securebank_core::SessionState;

use super::{connect, emit};

/// Log in and print where the user lands.
///
/// # Errors
///
/// Returns the session's [`AuthFailure`] (its message is the one to show), or
/// an error if the HTTP client cannot be built.
pub async fn login(
    config: ClientConfig,
    username: &str,
    password: &SecretString,
    from: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = connect(config)?;
    let identity = session
        .login(username, password)
        .await
        .map_err(report)?;

    emit(format_args!(
        "Welcome, {} ({})",
        identity.display_name(),
        identity.role
    ));
    emit(format_args!(
        "Next: {}",
        post_login_destination(&identity, from)
    ));
    Ok(())
}

/// Forget the persisted session. Succeeds even if nobody was logged in.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built.
pub fn logout(config: ClientConfig) -> Result<(), Box<dyn std::error::Error>> {
    let session = connect(config)?;
    session.logout();
    emit("Logged out");
    Ok(())
}

/// Create an account and print the backend's confirmation.
///
/// # Errors
///
/// Returns the session's [`AuthFailure`].
pub async fn register(
    config: ClientConfig,
    registration: &Registration,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = connect(config)?;
    let confirmation = session.register(registration).await.map_err(report)?;

    match confirmation.get("message").and_then(|m| m.as_str()) {
        Some(message) => emit(message),
        None => emit("Registration successful"),
    }
    emit("Log in to continue");
    Ok(())
}

/// Restore the persisted session and print the identity as JSON.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built or the identity
/// cannot be serialized.
pub async fn whoami(config: ClientConfig) -> Result<(), Box<dyn std::error::Error>> {
    let session = connect(config)?;
    match session.restore_session().await {
        SessionState::Authenticated(identity) => {
            emit(serde_json::to_string_pretty(&identity)?);
        }
        _ => emit("Not logged in"),
    }
    Ok(())
}

/// Log the underlying cause; the failure's own message goes to the user.
fn report(failure: AuthFailure) -> AuthFailure {
    tracing::debug!(cause = %failure.cause(), "Auth request failed");
    failure
}
