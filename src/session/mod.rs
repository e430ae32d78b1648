//! Client session persistence.
//!
//! A session is the logged-in owner, the session id issued at login and the
//! owner record itself. It is stored in a small JSON file so the console can
//! restore it on the next start, and cleared on logout.

pub mod store;

pub use store::{SessionError, SessionResult, SessionStore};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::Owner;

/// Persisted session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Session file format version
    pub version: u32,
    /// Identifier of the logged-in owner (e.g. "carlos")
    pub current_user: String,
    /// Opaque session token
    pub session_id: String,
    /// Owner record as returned by the backend
    pub user: Owner,
    /// When the session was saved
    pub saved_at: DateTime<Utc>,
}

impl Session {
    /// Current session format version
    pub const CURRENT_VERSION: u32 = 1;

    /// Creates a session stamped with the current time.
    pub fn new(current_user: impl Into<String>, session_id: impl Into<String>, user: Owner) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            current_user: current_user.into(),
            session_id: session_id.into(),
            user,
            saved_at: Utc::now(),
        }
    }
}

/// Generates a random session token.
///
/// Used when the backend does not hand one out. The token carries no
/// security guarantee; it only correlates requests of one console session.
pub fn generate_session_id() -> String {
    format!("session_{}", Uuid::new_v4().simple())
}
