//! Durable storage for the session credential and the cached profile.
//!
//! The file store keeps both entries in one JSON record
//! (`{ "token": .., "user": .. }`) with restricted permissions (0600). Writes go
//! to a sibling temp file that is renamed over the record, so readers see the
//! old record or the new one and never a mix. Entries are decoded
//! independently: a damaged `user` entry does not hide a valid `token`.

use crate::session::types::{Credential, UserProfile};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, warn};

/// Default record filename inside the session directory.
pub const SESSION_FILE: &str = "session.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session store I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode session record: {0}")]
    Json(#[from] serde_json::Error),
}

/// Whatever the store currently holds. Either half may be missing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StoredSession {
    pub credential: Option<Credential>,
    pub profile: Option<UserProfile>,
}

impl StoredSession {
    /// A session exists only when a credential is present.
    #[must_use]
    pub const fn has_credential(&self) -> bool {
        self.credential.is_some()
    }
}

pub trait SessionStore: Send + Sync {
    /// Replaces the whole record.
    ///
    /// # Errors
    /// Returns an error if the record cannot be encoded or written.
    fn save(&self, credential: &Credential, profile: &UserProfile) -> Result<(), StoreError>;

    /// # Errors
    /// Returns an error only for storage failures; missing or damaged entries
    /// load as `None`.
    fn load(&self) -> Result<StoredSession, StoreError>;

    /// Removes both entries. Clearing an empty store succeeds.
    ///
    /// # Errors
    /// Returns an error if an existing record cannot be removed.
    fn clear(&self) -> Result<(), StoreError>;
}

#[derive(Serialize)]
struct Record<'a> {
    token: &'a str,
    user: &'a UserProfile,
}

/// JSON file backed store that survives process restarts.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl SessionStore for FileSessionStore {
    fn save(&self, credential: &Credential, profile: &UserProfile) -> Result<(), StoreError> {
        let parent = self.parent_dir();
        fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;

        let contents = serde_json::to_string_pretty(&Record {
            token: credential.expose(),
            user: profile,
        })?;

        let temp = write_private(parent, contents.as_bytes()).map_err(|e| self.io_error(e))?;
        temp.persist(&self.path).map_err(|e| self.io_error(e.error))?;

        debug!(path = %self.path.display(), "session record saved");

        Ok(())
    }

    fn load(&self) -> Result<StoredSession, StoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(StoredSession::default()),
            Err(e) => return Err(self.io_error(e)),
        };

        let Ok(record) = serde_json::from_str::<Value>(&contents) else {
            warn!(path = %self.path.display(), "session record is not valid JSON, ignoring it");
            return Ok(StoredSession::default());
        };

        Ok(decode_record(&record))
    }

    fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "session record cleared");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}

fn decode_record(record: &Value) -> StoredSession {
    let credential = record
        .get("token")
        .and_then(Value::as_str)
        .map(Credential::new)
        .filter(|credential| !credential.is_empty());

    let profile = record
        .get("user")
        .filter(|user| !user.is_null())
        .and_then(|user| match serde_json::from_value::<UserProfile>(user.clone()) {
            Ok(profile) => Some(profile),
            Err(e) => {
                warn!("cached profile could not be decoded: {e}");
                None
            }
        });

    StoredSession {
        credential,
        profile,
    }
}

/// Writes `contents` to a uniquely named temp file in `dir`, owner-only.
fn write_private(dir: &Path, contents: &[u8]) -> io::Result<NamedTempFile> {
    let mut file = NamedTempFile::new_in(dir)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.as_file().set_permissions(fs::Permissions::from_mode(0o600))?;
    }

    file.write_all(contents)?;
    file.as_file().sync_all()?;
    Ok(file)
}

/// Process-local store, for embedders that do not persist sessions and for tests.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    inner: Mutex<StoredSession>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts with arbitrary contents, including half-written ones.
    #[must_use]
    pub fn with_contents(contents: StoredSession) -> Self {
        Self {
            inner: Mutex::new(contents),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn save(&self, credential: &Credential, profile: &UserProfile) -> Result<(), StoreError> {
        *self.inner.lock() = StoredSession {
            credential: Some(credential.clone()),
            profile: Some(profile.clone()),
        };
        Ok(())
    }

    fn load(&self) -> Result<StoredSession, StoreError> {
        Ok(self.inner.lock().clone())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.inner.lock() = StoredSession::default();
        Ok(())
    }
}
