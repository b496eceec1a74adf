//! Error handling module for platform uploads

use thiserror::Error;

/// Failure raised by a platform adapter while uploading
#[derive(Error, Debug)]
pub enum UploadError {
    /// A required credential field is absent
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    /// A credential file named in the credentials does not exist
    #[error("{what} not found: {path}")]
    CredentialFileNotFound { what: String, path: String },

    /// The video file could not be read
    #[error("Video file not found: {path}")]
    VideoNotFound { path: String },

    /// Authentication with the platform failed
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The platform answered with a non-success status
    #[error("Platform rejected the request ({status}): {body}")]
    Rejected { status: u16, body: String },

    /// The platform answered with something we could not interpret
    #[error("Unexpected response: {0}")]
    Protocol(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON encoding or decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl UploadError {
    pub fn missing(field: &str) -> Self {
        UploadError::MissingCredentials(field.to_string())
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        UploadError::Protocol(message.into())
    }
}

/// Result type alias for adapter operations
pub type UploadResult<T> = std::result::Result<T, UploadError>;
