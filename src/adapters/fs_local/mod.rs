// Local filesystem adapter - File system operations

use crate::domain::errors::*;
use crate::ports::*;
use async_trait::async_trait;
use std::path::Path;

/// Local filesystem adapter
#[derive(Debug, Default, Clone)]
pub struct FsLocalAdapter;

impl FsLocalAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FsPort for FsLocalAdapter {
    async fn file_exists(&self, file_path: &str) -> Result<bool, DomainError> {
        Ok(tokio::fs::metadata(Path::new(file_path))
            .await
            .map(|m| m.is_file())
            .unwrap_or(false))
    }

    async fn get_file_size(&self, file_path: &str) -> Result<u64, DomainError> {
        let metadata = tokio::fs::metadata(file_path)
            .await
            .map_err(|e| DomainError::FsFail(format!("Failed to get file size: {}", e)))?;
        Ok(metadata.len())
    }
}
