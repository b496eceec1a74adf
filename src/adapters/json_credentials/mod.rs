// JSON credential store - platform credentials in `<app_dir>/creds.json`

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

/// File name of the store inside the application directory
pub const CREDENTIALS_FILE: &str = "creds.json";

/// Credential store backed by one pretty-printed JSON object keyed by platform
pub struct JsonCredentialStore {
    path: PathBuf,
    // serializes read-modify-write cycles of `set_platform_credentials`
    write_lock: Mutex<()>,
}

impl JsonCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Store at the conventional location inside `app_dir`
    pub fn in_app_dir(app_dir: &Path) -> Self {
        Self::new(app_dir.join(CREDENTIALS_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw JSON object; a missing or unparsable file reads as empty
    async fn read_object(&self) -> Map<String, Value> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %self.path.display(), error = %e, "Cannot read credential store");
                }
                return Map::new();
            }
        };

        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(map)) => map,
            Ok(_) => {
                warn!(path = %self.path.display(), "Credential store is not a JSON object, ignoring it");
                Map::new()
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Credential store is not valid JSON, ignoring it");
                Map::new()
            }
        }
    }
}

#[async_trait]
impl CredentialStorePort for JsonCredentialStore {
    async fn load_all(&self) -> Result<CredentialMap, DomainError> {
        let mut credentials = CredentialMap::new();
        for (name, value) in self.read_object().await {
            match PlatformId::parse(&name) {
                Ok(platform) => {
                    credentials.insert(platform, CredentialBlob::new(value));
                }
                Err(_) => warn!(key = %name, "Skipping credential entry with an invalid platform name"),
            }
        }
        Ok(credentials)
    }

    async fn get_platform_credentials(&self, platform: &PlatformId) -> Result<CredentialBlob, DomainError> {
        Ok(self
            .load_all()
            .await?
            .remove(platform)
            .unwrap_or_default())
    }

    async fn set_platform_credentials(
        &self,
        platform: &PlatformId,
        credentials: CredentialBlob,
    ) -> Result<(), DomainError> {
        let _guard = self.write_lock.lock().await;

        let mut object = self.read_object().await;
        object.insert(platform.to_string(), credentials.into_value());

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                DomainError::CredentialStore(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        let content = serde_json::to_string_pretty(&Value::Object(object))
            .map_err(|e| DomainError::CredentialStore(format!("Failed to encode credentials: {}", e)))?;
        tokio::fs::write(&self.path, content).await.map_err(|e| {
            DomainError::CredentialStore(format!("Failed to write {}: {}", self.path.display(), e))
        })?;

        debug!(%platform, path = %self.path.display(), "Saved credentials");
        Ok(())
    }

    fn store_path(&self) -> String {
        self.path.display().to_string()
    }
}
