//! Page and API access commands: `visit`, `get`.

use securebank_client::{ClientConfig, RouteGuard, navigation_links};

use super::{connect, emit};

/// Restore the session, then print what visiting `path` would do and the
/// navigation bar for the resulting state.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built.
pub async fn visit(config: ClientConfig, path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let session = connect(config)?;
    let mut guard = RouteGuard::new(session.subscribe());

    let state = session.restore_session().await;
    let navigation = guard.resolve(path).await;

    emit(&navigation);

    let links: Vec<&str> = navigation_links(&state)
        .into_iter()
        .map(|page| page.path())
        .collect();
    emit(format_args!("Navigation: {}", links.join(" ")));
    Ok(())
}

/// `GET` an API path with the persisted token and pretty-print the JSON.
///
/// # Errors
///
/// Returns an error if the request fails or the response is not JSON.
pub async fn get(config: ClientConfig, path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let session = connect(config)?;
    let api = session.backend();
    let body: serde_json::Value = api.get_json(path).await?;
    emit(serde_json::to_string_pretty(&body)?);
    Ok(())
}
