//! Session state and token persistence
//!
//! The token is the only resource shared between the connection manager
//! (writer), the workflow engine (reader) and the store (persistence). Readers
//! always go through [`SessionState`] at the point of use instead of caching it.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::workflow::SessionView;

/// Guest identity confirmation level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    /// Not verified yet
    #[default]
    Anonymous,
    /// Reservation confirmed
    Verified,
}

impl VerificationStatus {
    /// Whether gated actions may run
    #[must_use]
    pub fn is_verified(self) -> bool {
        self == VerificationStatus::Verified
    }
}

/// The one live session of a widget instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Opaque bearer token
    pub token: String,
    /// Server-side session id
    pub session_id: String,
    /// Current verification status
    pub verification_status: VerificationStatus,
    /// Whether the server resumed an earlier conversation
    pub restored: bool,
}

/// Session as seen by the glue layer
///
/// Verification status only changes through [`SessionState::establish`] and
/// [`SessionState::update_verification`], i.e. through server frames.
#[derive(Debug, Default)]
pub struct SessionState {
    current: Option<Session>,
}

impl SessionState {
    /// Create an empty state (no session yet)
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the session with the one announced by a `session` frame
    pub fn establish(&mut self, session: Session) {
        debug!(
            session_id = %session.session_id,
            restored = session.restored,
            "Session established"
        );
        self.current = Some(session);
    }

    /// Merge a `session_update`
    ///
    /// Returns `true` when the status moved from anonymous to verified.
    pub fn update_verification(&mut self, status: VerificationStatus) -> bool {
        match self.current.as_mut() {
            Some(session) => {
                let became_verified =
                    !session.verification_status.is_verified() && status.is_verified();
                session.verification_status = status;
                became_verified
            }
            None => {
                warn!("session_update received before session");
                false
            }
        }
    }

    /// Drop the session (reset or destroy)
    pub fn clear(&mut self) {
        self.current = None;
    }

    /// Current session, if any
    #[must_use]
    pub fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }
}

impl SessionView for SessionState {
    fn verification_status(&self) -> VerificationStatus {
        self.current
            .as_ref()
            .map(|s| s.verification_status)
            .unwrap_or_default()
    }

    fn session_token(&self) -> Option<String> {
        self.current.as_ref().map(|s| s.token.clone())
    }
}

/// Durable storage for the session token across restarts
pub trait SessionStore: Send + Sync {
    /// Stored token, if any
    fn load(&self) -> Option<String>;

    /// Persist a token
    fn save(&self, token: &str);

    /// Forget the token
    fn clear(&self);
}

/// In-memory store (tests and ephemeral embeds)
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    token: Mutex<Option<String>>,
}

impl MemorySessionStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with a token
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Option<String> {
        self.token.lock().ok().and_then(|t| t.clone())
    }

    fn save(&self, token: &str) {
        if let Ok(mut guard) = self.token.lock() {
            *guard = Some(token.to_string());
        }
    }

    fn clear(&self) {
        if let Ok(mut guard) = self.token.lock() {
            *guard = None;
        }
    }
}

/// File-backed store, one token per file
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Store at an explicit path
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store under the platform data directory (`~/.local/share/concierge/session`)
    #[must_use]
    pub fn default_location() -> Self {
        let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::new(base.join("concierge").join("session"))
    }

    /// Path of the token file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, token: &str) -> Result<()> {
        let storage_err = |e: std::io::Error| Error::Storage(format!("{}: {e}", self.path.display()));
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(storage_err)?;
        }
        fs::write(&self.path, token).map_err(storage_err)
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Option<String> {
        let token = fs::read_to_string(&self.path).ok()?;
        let token = token.trim();
        (!token.is_empty()).then(|| token.to_string())
    }

    fn save(&self, token: &str) {
        match self.write(token) {
            Ok(()) => debug!(path = %self.path.display(), "Session token persisted"),
            Err(e) => warn!(error = %e, "Failed to persist session token"),
        }
    }

    fn clear(&self) {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to remove session token")
            }
        }
    }
}

#[cfg(test)]
mod tests;
