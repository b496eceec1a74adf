// TOML config adapter - Configuration management using TOML files

use crate::domain::errors::*;
use crate::ports::*;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Table holding this tool's settings in a TOML file
pub const CONFIG_SECTION: &str = "crosspost";

/// YouTube requires non-final chunks to be a multiple of 256 KiB
pub const CHUNK_ALIGNMENT: usize = 256 * 1024;

/// Configuration keys
pub mod keys {
    pub const LOG_LEVEL: &str = "log_level";
    pub const MAX_CONCURRENT: &str = "max_concurrent";
    pub const APP_DIR: &str = "app_dir";
    pub const REQUEST_TIMEOUT_SECS: &str = "request_timeout_secs";
    pub const UPLOAD_CHUNK_SIZE: &str = "upload_chunk_size";
    pub const YOUTUBE_PRIVACY_STATUS: &str = "youtube_privacy_status";
    pub const YOUTUBE_UPLOAD_BASE: &str = "youtube_upload_base";
    pub const GOOGLE_AUTH_URL: &str = "google_auth_url";
    pub const GOOGLE_TOKEN_URL: &str = "google_token_url";
    pub const TIKTOK_API_BASE: &str = "tiktok_api_base";
    pub const INSTAGRAM_API_BASE: &str = "instagram_api_base";
    pub const INSTAGRAM_UPLOAD_BASE: &str = "instagram_upload_base";

    /// Keys whose values must be absolute http(s) URLs
    pub const URLS: [&str; 6] = [
        YOUTUBE_UPLOAD_BASE,
        GOOGLE_AUTH_URL,
        GOOGLE_TOKEN_URL,
        TIKTOK_API_BASE,
        INSTAGRAM_API_BASE,
        INSTAGRAM_UPLOAD_BASE,
    ];
}

/// Application directory when none is configured: `~/.video_uploader`
pub fn default_app_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".video_uploader"))
        .unwrap_or_else(|| PathBuf::from(".video_uploader"))
}

fn default_entries() -> Vec<(&'static str, String)> {
    vec![
        (keys::LOG_LEVEL, "info".to_string()),
        (keys::MAX_CONCURRENT, "3".to_string()),
        (keys::APP_DIR, default_app_dir().to_string_lossy().to_string()),
        (keys::REQUEST_TIMEOUT_SECS, "300".to_string()),
        (keys::UPLOAD_CHUNK_SIZE, (1024 * 1024).to_string()),
        (keys::YOUTUBE_PRIVACY_STATUS, "public".to_string()),
        (keys::YOUTUBE_UPLOAD_BASE, "https://www.googleapis.com".to_string()),
        (keys::GOOGLE_AUTH_URL, "https://accounts.google.com/o/oauth2/auth".to_string()),
        (keys::GOOGLE_TOKEN_URL, "https://oauth2.googleapis.com/token".to_string()),
        (keys::TIKTOK_API_BASE, "https://open.tiktokapis.com".to_string()),
        (keys::INSTAGRAM_API_BASE, "https://i.instagram.com/api/v1".to_string()),
        (keys::INSTAGRAM_UPLOAD_BASE, "https://i.instagram.com".to_string()),
    ]
}

/// TOML configuration adapter
pub struct TomlConfigAdapter {
    config: Arc<RwLock<BTreeMap<String, String>>>,
    config_file_path: Arc<RwLock<Option<PathBuf>>>,
}

impl TomlConfigAdapter {
    /// Create an adapter holding the default configuration
    pub fn new() -> Self {
        let config = default_entries()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();

        Self {
            config: Arc::new(RwLock::new(config)),
            config_file_path: Arc::new(RwLock::new(None)),
        }
    }

    /// Get default config file path: `<config_dir>/crosspost/config.toml`
    pub fn get_default_config_path() -> PathBuf {
        if let Some(config_dir) = dirs::config_dir() {
            config_dir.join("crosspost").join("config.toml")
        } else {
            PathBuf::from("crosspost.toml")
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, String>> {
        self.config.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<String, String>> {
        self.config.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn remember_path(&self, path: PathBuf) {
        let mut config_path = self
            .config_file_path
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *config_path = Some(path);
    }

    /// Serialize config to TOML string
    fn serialize_config(&self) -> Result<String, DomainError> {
        let section: toml::Table = self
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), toml::Value::String(v.clone())))
            .collect();
        let mut document = toml::Table::new();
        document.insert(CONFIG_SECTION.to_string(), toml::Value::Table(section));

        toml::to_string_pretty(&document)
            .map_err(|e| DomainError::ConfigError(format!("Failed to serialize config: {}", e)))
    }

    /// Merge the `[crosspost]` table of a TOML document into the config
    fn deserialize_config(&self, toml_content: &str) -> Result<(), DomainError> {
        let parsed: toml::Table = toml::from_str(toml_content)
            .map_err(|e| DomainError::ConfigError(format!("Failed to parse TOML config: {}", e)))?;

        let Some(section) = parsed.get(CONFIG_SECTION) else {
            tracing::warn!("Config file has no [{}] table", CONFIG_SECTION);
            return Ok(());
        };
        let table = section.as_table().ok_or_else(|| {
            DomainError::ConfigError(format!("[{}] must be a table", CONFIG_SECTION))
        })?;

        let mut config = self.write();
        for (key, value) in table {
            let value = match value {
                toml::Value::String(s) => s.clone(),
                toml::Value::Integer(i) => i.to_string(),
                toml::Value::Boolean(b) => b.to_string(),
                toml::Value::Float(f) => f.to_string(),
                other => {
                    return Err(DomainError::ConfigError(format!(
                        "Unsupported value for {}: {}",
                        key, other
                    )))
                }
            };
            config.insert(key.clone(), value);
        }

        Ok(())
    }
}

impl Default for TomlConfigAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_positive(key: &str, value: &str) -> Result<u64, DomainError> {
    match value.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(DomainError::ConfigError(format!(
            "{} must be a positive integer, got {:?}",
            key, value
        ))),
    }
}

#[async_trait]
impl ConfigPort for TomlConfigAdapter {
    async fn get_config(&self, key: &str) -> Result<Option<String>, DomainError> {
        Ok(self.read().get(key).cloned())
    }

    async fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, DomainError> {
        Ok(self
            .read()
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.to_string()))
    }

    async fn set_config(&self, key: &str, value: &str) -> Result<(), DomainError> {
        self.write().insert(key.to_string(), value.to_string());
        tracing::debug!("Set config {} = {}", key, value);
        Ok(())
    }

    async fn load_config(&self, file_path: &str) -> Result<(), DomainError> {
        let path = PathBuf::from(file_path);

        if !path.exists() {
            return Err(DomainError::FsFail(format!(
                "Config file does not exist: {}",
                file_path
            )));
        }

        let content = std::fs::read_to_string(&path)
            .map_err(|e| DomainError::FsFail(format!("Failed to read config file: {}", e)))?;

        self.deserialize_config(&content)?;
        self.remember_path(path);
        tracing::debug!("Loaded config from {}", file_path);
        Ok(())
    }

    async fn save_config(&self, file_path: &str) -> Result<(), DomainError> {
        let path = PathBuf::from(file_path);

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                DomainError::FsFail(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = self.serialize_config()?;
        std::fs::write(&path, content)
            .map_err(|e| DomainError::FsFail(format!("Failed to write config file: {}", e)))?;

        self.remember_path(path);
        Ok(())
    }

    async fn load_default_config(&self) -> Result<(), DomainError> {
        let mut config = self.write();
        for (key, value) in default_entries() {
            config.insert(key.to_string(), value);
        }
        Ok(())
    }

    async fn validate_config(&self) -> Result<(), DomainError> {
        let config = self.read();

        if let Some(log_level) = config.get(keys::LOG_LEVEL) {
            LogLevel::parse(log_level).map_err(|e| DomainError::ConfigError(e.to_string()))?;
        }

        for key in [keys::MAX_CONCURRENT, keys::REQUEST_TIMEOUT_SECS] {
            if let Some(value) = config.get(key) {
                parse_positive(key, value)?;
            }
        }

        if let Some(value) = config.get(keys::UPLOAD_CHUNK_SIZE) {
            let size = parse_positive(keys::UPLOAD_CHUNK_SIZE, value)?;
            if size % CHUNK_ALIGNMENT as u64 != 0 {
                return Err(DomainError::ConfigError(format!(
                    "{} must be a multiple of {} bytes",
                    keys::UPLOAD_CHUNK_SIZE,
                    CHUNK_ALIGNMENT
                )));
            }
        }

        if let Some(privacy) = config.get(keys::YOUTUBE_PRIVACY_STATUS) {
            if !matches!(privacy.as_str(), "public" | "unlisted" | "private") {
                return Err(DomainError::ConfigError(format!(
                    "{} must be public, unlisted or private, got {:?}",
                    keys::YOUTUBE_PRIVACY_STATUS,
                    privacy
                )));
            }
        }

        for key in keys::URLS {
            if let Some(value) = config.get(key) {
                let parsed = url::Url::parse(value)
                    .map_err(|e| DomainError::ConfigError(format!("{} is not a URL: {}", key, e)))?;
                if !matches!(parsed.scheme(), "http" | "https") {
                    return Err(DomainError::ConfigError(format!(
                        "{} must be an http(s) URL",
                        key
                    )));
                }
            }
        }

        if config.get(keys::APP_DIR).is_some_and(|dir| dir.trim().is_empty()) {
            return Err(DomainError::ConfigError(format!(
                "{} cannot be empty",
                keys::APP_DIR
            )));
        }

        Ok(())
    }

    async fn get_all_config_keys(&self) -> Result<Vec<String>, DomainError> {
        Ok(self.read().keys().cloned().collect())
    }

    async fn get_config_file_path(&self) -> Result<String, DomainError> {
        let config_path = self
            .config_file_path
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(config_path
            .clone()
            .unwrap_or_else(Self::get_default_config_path)
            .to_string_lossy()
            .to_string())
    }
}
