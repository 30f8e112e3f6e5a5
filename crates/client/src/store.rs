//! Persisted credential storage.
//!
//! The token and user ID survive restarts as a single JSON object:
//!
//! ```json
//! { "token": "<bearer token>", "userId": "<user id>" }
//! ```
//!
//! Both keys are written together and removed together. Reading is public so
//! the HTTP client can decorate requests; writing is crate-private so the
//! session manager stays the only writer.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use securebank_core::UserId;

/// Errors from reading or writing the persisted credential.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem error.
    #[error("credential store I/O error at {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// The file exists but is not a credential object.
    #[error("credential store is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    /// Only one of `token` / `userId` is present.
    #[error("credential store holds a partial credential")]
    Partial,
}

/// Token and user ID remembered between runs.
#[derive(Clone)]
pub struct StoredCredential {
    /// Bearer token issued at login.
    pub token: SecretString,
    /// Backend user ID returned alongside the token.
    pub user_id: UserId,
}

impl std::fmt::Debug for StoredCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredCredential")
            .field("token", &"[REDACTED]")
            .field("user_id", &self.user_id)
            .finish()
    }
}

/// On-disk record. Fields are optional so a partial file can be detected
/// instead of failing to parse.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Record {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_id: Option<String>,
}

impl Record {
    fn into_credential(self) -> Result<Option<StoredCredential>, StoreError> {
        match (self.token, self.user_id) {
            (Some(token), Some(user_id)) => Ok(Some(StoredCredential {
                token: SecretString::from(token),
                user_id: UserId::new(user_id),
            })),
            (None, None) => Ok(None),
            _ => Err(StoreError::Partial),
        }
    }
}

enum Backend {
    File(PathBuf),
    Memory(Mutex<Option<StoredCredential>>),
}

/// Handle to the process-wide credential store.
///
/// Cheap to clone; every clone refers to the same underlying storage.
#[derive(Clone)]
pub struct CredentialStore {
    inner: Arc<Backend>,
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.inner.as_ref() {
            Backend::File(path) => f.debug_tuple("CredentialStore::File").field(path).finish(),
            Backend::Memory(_) => f.write_str("CredentialStore::Memory"),
        }
    }
}

impl CredentialStore {
    /// A store backed by a JSON file.
    ///
    /// Nothing is touched until the first read or write; parent directories
    /// are created on the first save.
    #[must_use]
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::new(Backend::File(path.into())),
        }
    }

    /// A store that lives only as long as the process.
    #[must_use]
    pub fn memory() -> Self {
        Self {
            inner: Arc::new(Backend::Memory(Mutex::new(None))),
        }
    }

    /// Path of the backing file, if file-backed.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self.inner.as_ref() {
            Backend::File(path) => Some(path),
            Backend::Memory(_) => None,
        }
    }

    /// Read the persisted credential.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the file cannot be read, does not parse, or
    /// holds only half a credential.
    pub fn load(&self) -> Result<Option<StoredCredential>, StoreError> {
        match self.inner.as_ref() {
            Backend::File(path) => {
                let contents = match std::fs::read_to_string(path) {
                    Ok(contents) => contents,
                    Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
                    Err(source) => {
                        return Err(StoreError::Io {
                            path: path.clone(),
                            source,
                        });
                    }
                };
                if contents.trim().is_empty() {
                    return Ok(None);
                }
                let record: Record = serde_json::from_str(&contents)?;
                record.into_credential()
            }
            Backend::Memory(slot) => Ok(slot
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()),
        }
    }

    /// The persisted bearer token, if any.
    ///
    /// Read errors and partial records count as "no token" so a broken file
    /// never produces a malformed `Authorization` header.
    #[must_use]
    pub fn token(&self) -> Option<SecretString> {
        match self.load() {
            Ok(credential) => credential.map(|c| c.token),
            Err(e) => {
                debug!(error = %e, "Ignoring unreadable credential store");
                None
            }
        }
    }

    /// Persist token and user ID together.
    #[instrument(skip_all, fields(user_id = %credential.user_id))]
    pub(crate) fn save(&self, credential: &StoredCredential) -> Result<(), StoreError> {
        match self.inner.as_ref() {
            Backend::File(path) => {
                let record = Record {
                    token: Some(credential.token.expose_secret().to_owned()),
                    user_id: Some(credential.user_id.as_str().to_owned()),
                };
                let json = serde_json::to_string_pretty(&record)?;
                write_atomically(path, json.as_bytes())
            }
            Backend::Memory(slot) => {
                *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(credential.clone());
                Ok(())
            }
        }
    }

    /// Remove token and user ID together. Clearing an empty store is a no-op.
    #[instrument(skip_all)]
    pub(crate) fn clear(&self) -> Result<(), StoreError> {
        match self.inner.as_ref() {
            Backend::File(path) => match std::fs::remove_file(path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
                Err(source) => {
                    warn!(path = %path.display(), error = %source, "Failed to remove credential file");
                    Err(StoreError::Io {
                        path: path.clone(),
                        source,
                    })
                }
            },
            Backend::Memory(slot) => {
                *slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
                Ok(())
            }
        }
    }
}

/// Write through a sibling temp file and rename, so readers never observe a
/// half-written credential.
fn write_atomically(path: &Path, contents: &[u8]) -> Result<(), StoreError> {
    let io_err = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    std::fs::write(&tmp, contents).map_err(io_err)?;
    restrict_permissions(&tmp).map_err(io_err)?;
    std::fs::rename(&tmp, path).map_err(io_err)
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
#[allow(clippy::unnecessary_wraps)]
const fn restrict_permissions(_path: &Path) -> io::Result<()> {
    Ok(())
}
