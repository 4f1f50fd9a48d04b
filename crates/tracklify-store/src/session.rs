//! Session persistence
//!
//! The dashboard treats authentication as an opaque collaborator: something
//! signs the user in and leaves a session behind. This module persists that
//! session under `~/.tracklify/session.json` so the feed can be scoped to a
//! principal across restarts.

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Validity buffer before expiry, so a session is not treated as live while
/// it is about to lapse mid-fetch
const EXPIRY_GRACE_SECS: i64 = 30;

/// A persisted authenticated session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub principal_id: String,
    #[serde(default)]
    pub email: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn new(principal_id: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            principal_id: principal_id.into(),
            email: None,
            expires_at,
        }
    }

    /// Check if the session is still valid (not expired)
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now + Duration::seconds(EXPIRY_GRACE_SECS)
    }
}

/// On-disk session store
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Store at the default location under the home directory
    pub fn open_default() -> Option<Self> {
        let home = dirs::home_dir()?;
        Some(Self::at(home.join(".tracklify").join("session.json")))
    }

    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }

    /// Load the persisted session, if any
    pub fn load(&self) -> Option<Session> {
        let content = fs::read_to_string(&self.path).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Persist the session to disk (best effort)
    pub fn save(&self, session: &Session) {
        if let Some(parent) = self.path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        if let Ok(content) = serde_json::to_string_pretty(session) {
            let _ = fs::write(&self.path, content);
        }
    }

    /// Remove the persisted session
    pub fn clear(&self) {
        let _ = fs::remove_file(&self.path);
    }

    /// The principal of the current valid session, if one exists
    pub fn current_principal(&self, now: DateTime<Utc>) -> Option<String> {
        self.load()
            .filter(|s| s.is_valid(now))
            .map(|s| s.principal_id)
    }
}
