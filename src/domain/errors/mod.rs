// Domain errors - Error types for the domain layer

use std::fmt;

/// Domain-specific error types
#[derive(Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Invalid arguments provided
    BadArgs(String),
    /// Upload request names no platform at all
    EmptyPlatformSet,
    /// File not found
    FileNotFound(String),
    /// Platform identifier is not known to this build
    UnknownPlatform(String),
    /// File system operation failed
    FsFail(String),
    /// Configuration could not be loaded or is invalid
    ConfigError(String),
    /// Credential store could not be read or written
    CredentialStore(String),
    /// Internal error
    InternalError(String),
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainError::BadArgs(msg) => write!(f, "Bad arguments: {}", msg),
            DomainError::EmptyPlatformSet => write!(f, "Select at least one platform"),
            DomainError::FileNotFound(path) => write!(f, "File not found: {}", path),
            DomainError::UnknownPlatform(name) => write!(
                f,
                "Unknown platform: {}. Valid platforms: youtube, tiktok, instagram",
                name
            ),
            DomainError::FsFail(msg) => write!(f, "File system error: {}", msg),
            DomainError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            DomainError::CredentialStore(msg) => write!(f, "Credential store error: {}", msg),
            DomainError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for DomainError {}
