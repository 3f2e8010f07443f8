//! Durable session storage.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use crate::infra::error::InfraError;
use crate::lock::mutex_lock;

use super::Session;

const SOURCE: &str = "session::storage";

/// Where the current session survives process restarts.
pub trait SessionStorage: Send + Sync {
    fn load(&self) -> Result<Option<Session>, InfraError>;
    fn save(&self, session: &Session) -> Result<(), InfraError>;
    /// Removing an absent record is not an error.
    fn remove(&self) -> Result<(), InfraError>;
}

/// JSON file holding the full session record.
#[derive(Debug, Clone)]
pub struct FileSessionStorage {
    path: PathBuf,
}

impl FileSessionStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<state dir>/recipeez/session.json`, falling back to the local data dir.
    pub fn default_path() -> PathBuf {
        dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("recipeez")
            .join("session.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStorage for FileSessionStorage {
    fn load(&self) -> Result<Option<Session>, InfraError> {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(InfraError::io(&self.path, err)),
        };
        let session = serde_json::from_slice(&raw)
            .map_err(|err| InfraError::session_format(&self.path, err))?;
        debug!(path = %self.path.display(), "Loaded persisted session");
        Ok(Some(session))
    }

    fn save(&self, session: &Session) -> Result<(), InfraError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|err| InfraError::io(parent, err))?;
        }
        let raw = serde_json::to_vec_pretty(session)
            .map_err(|err| InfraError::session_format(&self.path, err))?;
        let mut file = open_private(&self.path).map_err(|err| InfraError::io(&self.path, err))?;
        file.write_all(&raw).map_err(|err| InfraError::io(&self.path, err))?;
        Ok(())
    }

    fn remove(&self) -> Result<(), InfraError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(InfraError::io(&self.path, err)),
        }
    }
}

/// Truncating open that leaves the file owner-only before any byte is written.
/// The record holds a bearer token.
#[cfg(unix)]
fn open_private(path: &Path) -> std::io::Result<fs::File> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // `mode` only applies on creation; narrow a file left by an older run.
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    Ok(file)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> std::io::Result<fs::File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

/// Process-local storage; nothing outlives the process.
#[derive(Debug, Default)]
pub struct MemorySessionStorage {
    slot: Mutex<Option<Session>>,
}

impl MemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a record already "persisted", as after a previous run.
    pub fn with_session(session: Session) -> Self {
        Self {
            slot: Mutex::new(Some(session)),
        }
    }
}

impl SessionStorage for MemorySessionStorage {
    fn load(&self) -> Result<Option<Session>, InfraError> {
        Ok(mutex_lock(&self.slot, SOURCE, "load").clone())
    }

    fn save(&self, session: &Session) -> Result<(), InfraError> {
        *mutex_lock(&self.slot, SOURCE, "save") = Some(session.clone());
        Ok(())
    }

    fn remove(&self) -> Result<(), InfraError> {
        *mutex_lock(&self.slot, SOURCE, "remove") = None;
        Ok(())
    }
}
