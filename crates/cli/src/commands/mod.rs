//! CLI command implementations.

pub mod auth;
pub mod browse;

use std::fmt::Display;

use securebank_client::{ApiClient, ApiError, ClientConfig, CredentialStore, SessionManager};

/// Build a session manager over the file-backed credential store.
fn connect(config: ClientConfig) -> Result<SessionManager, ApiError> {
    let store = CredentialStore::file(&config.credentials_path);
    tracing::debug!(api = %config.api_base_url, store = ?store.path(), "Connecting");
    let api = ApiClient::new(config, store.clone())?;
    Ok(SessionManager::new(api, store))
}

/// Write a line of command output to stdout.
#[allow(clippy::print_stdout)]
fn emit(line: impl Display) {
    println!("{line}");
}
