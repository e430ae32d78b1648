//! Session store with atomic saves.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use super::Session;

/// Directory under the user data dir that holds redsol state.
const STATE_DIR_NAME: &str = "redsol";

/// Default name for the session file.
const SESSION_FILE_NAME: &str = "session.json";

/// Errors that can occur during session operations.
#[derive(Error, Debug)]
pub enum SessionError {
    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The session file was written by a newer version.
    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },

    /// No user data directory could be determined.
    #[error("could not determine a data directory for the session file")]
    NoDataDir,
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Reads and writes the session file.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Creates a store for the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates a store at `<data dir>/redsol/session.json`.
    pub fn default_location() -> SessionResult<Self> {
        let data_dir = dirs::data_dir().ok_or(SessionError::NoDataDir)?;
        Ok(Self::new(data_dir.join(STATE_DIR_NAME).join(SESSION_FILE_NAME)))
    }

    /// Path of the session file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Saves the session atomically.
    ///
    /// Writes to a temporary file next to the target, then renames it over
    /// the target.
    pub fn save(&self, session: &Session) -> SessionResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(session)?;
        let temp_path = self.path.with_extension("json.tmp");

        let mut file = fs::File::create(&temp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;

        fs::rename(&temp_path, &self.path)?;
        debug!(path = %self.path.display(), user = %session.current_user, "Session saved");
        Ok(())
    }

    /// Loads the session.
    ///
    /// Returns `Ok(None)` if there is no session file.
    pub fn load(&self) -> SessionResult<Option<Session>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(SessionError::Io(e)),
        };

        let session: Session = serde_json::from_str(&content)?;
        if session.version > Session::CURRENT_VERSION {
            return Err(SessionError::VersionMismatch {
                expected: Session::CURRENT_VERSION,
                found: session.version,
            });
        }
        Ok(Some(session))
    }

    /// Removes the session file. A missing file is not an error.
    pub fn clear(&self) -> SessionResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "Session cleared");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SessionError::Io(e)),
        }
    }

    /// Returns true if a session file exists.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }
}
