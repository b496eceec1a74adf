//! Persisted Instagram login session

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::error::UploadResult;

/// Device identity presented to Instagram; kept stable across logins
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIds {
    pub device_id: String,
    pub uuid: String,
    pub phone_id: String,
}

impl DeviceIds {
    pub fn generate() -> Self {
        let seed = Uuid::new_v4().simple().to_string();
        Self {
            device_id: format!("android-{}", &seed[..16]),
            uuid: Uuid::new_v4().to_string(),
            phone_id: Uuid::new_v4().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstagramSession {
    pub username: String,
    pub user_id: String,
    /// Value of the `ig-set-authorization` header returned by login
    pub authorization: String,
    pub device: DeviceIds,
    pub created_at: DateTime<Utc>,
}

/// JSON file holding at most one session
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored session, `None` when absent or unreadable
    pub fn load(&self) -> Option<InstagramSession> {
        let content = std::fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&content) {
            Ok(session) => Some(session),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Ignoring unreadable Instagram session file");
                None
            }
        }
    }

    /// Stored session for `username` only
    pub fn load_for(&self, username: &str) -> Option<InstagramSession> {
        self.load()
            .filter(|s| s.username.eq_ignore_ascii_case(username))
    }

    pub fn save(&self, session: &InstagramSession) -> UploadResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(session)?)?;
        Ok(())
    }
}
