// Ports - Interface definitions (contracts)

use std::path::Path;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::error::UploadResult;
use async_trait::async_trait;

/// Port for publishing a video to one platform
#[async_trait]
pub trait PlatformAdapter: Send + Sync {
    /// Identifier this adapter is registered under
    fn platform(&self) -> PlatformId;

    /// Human-readable platform name
    fn display_name(&self) -> &str;

    /// Authenticate, transfer the video and publish it.
    ///
    /// May take arbitrarily long (network transfers, interactive consent).
    /// Failures carry a message suitable for showing to the user.
    async fn upload(
        &self,
        video_path: &Path,
        description: &str,
        tags: &str,
        credentials: &CredentialBlob,
    ) -> UploadResult<PlatformPayload>;

    /// Cheap local check of the credential blob; never touches the network
    fn validate_credentials(&self, credentials: &CredentialBlob) -> CredentialCheck;
}

/// Result of a local credential check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialCheck {
    pub valid: bool,
    pub message: String,
}

impl CredentialCheck {
    pub fn ok() -> Self {
        Self {
            valid: true,
            message: "OK".to_string(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: message.into(),
        }
    }
}

/// Port for persisted platform credentials
#[async_trait]
pub trait CredentialStorePort: Send + Sync {
    /// Load the credentials of every platform
    async fn load_all(&self) -> Result<CredentialMap, DomainError>;

    /// Credentials for one platform, empty when none are stored
    async fn get_platform_credentials(
        &self,
        platform: &PlatformId,
    ) -> Result<CredentialBlob, DomainError>;

    /// Replace one platform's credentials and persist the store
    async fn set_platform_credentials(
        &self,
        platform: &PlatformId,
        credentials: CredentialBlob,
    ) -> Result<(), DomainError>;

    /// Location of the backing file
    fn store_path(&self) -> String;
}

/// Port for file system operations
#[async_trait]
pub trait FsPort: Send + Sync {
    /// Check if a regular file exists
    async fn file_exists(&self, file_path: &str) -> Result<bool, DomainError>;

    /// Get file size
    async fn get_file_size(&self, file_path: &str) -> Result<u64, DomainError>;
}

/// Port for configuration management
#[async_trait]
pub trait ConfigPort: Send + Sync {
    /// Get configuration value
    async fn get_config(&self, key: &str) -> Result<Option<String>, DomainError>;

    /// Get configuration value with default
    async fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, DomainError>;

    /// Set configuration value
    async fn set_config(&self, key: &str, value: &str) -> Result<(), DomainError>;

    /// Load configuration from file
    async fn load_config(&self, file_path: &str) -> Result<(), DomainError>;

    /// Save configuration to file
    async fn save_config(&self, file_path: &str) -> Result<(), DomainError>;

    /// Load default configuration
    async fn load_default_config(&self) -> Result<(), DomainError>;

    /// Validate configuration
    async fn validate_config(&self) -> Result<(), DomainError>;

    /// Get all configuration keys
    async fn get_all_config_keys(&self) -> Result<Vec<String>, DomainError>;

    /// Get configuration file path
    async fn get_config_file_path(&self) -> Result<String, DomainError>;
}

/// Port for logging and observability
#[async_trait]
pub trait LogPort: Send + Sync {
    /// Log info message
    async fn info(&self, message: &str);

    /// Log warning message
    async fn warn(&self, message: &str);

    /// Log error message
    async fn error(&self, message: &str);

    /// Log debug message
    async fn debug(&self, message: &str);

    /// Log structured event
    async fn log_event(&self, event: &LogEvent);
}

/// Log event with structured data
#[derive(Debug, Clone)]
pub struct LogEvent {
    pub level: LogLevel,
    pub message: String,
    pub timestamp: std::time::SystemTime,
    pub context: std::collections::HashMap<String, String>,
}

impl LogEvent {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            timestamp: std::time::SystemTime::now(),
            context: std::collections::HashMap::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl ToString) -> Self {
        self.context.insert(key.to_string(), value.to_string());
        self
    }
}

/// Log level enumeration
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Parse log level from string
    pub fn parse(level_str: &str) -> Result<Self, DomainError> {
        match level_str.trim().to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(DomainError::BadArgs(format!(
                "Invalid log level: {}. Valid levels: trace, debug, info, warn, error",
                level_str
            ))),
        }
    }

    /// Directive understood by `tracing_subscriber::EnvFilter`
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}
