// Upload interactor - Turns an upload request into a running multi-platform upload

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::engine::{RunHandle, UploadOrchestrator};
use crate::ports::*;

/// Upload request as entered by the user
#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    pub video_path: String,
    pub description: String,
    pub tags: String,
    pub platforms: Vec<String>,
}

/// Interactor for the upload use case
pub struct UploadInteractor {
    orchestrator: Arc<UploadOrchestrator>,
    credential_store: Arc<dyn CredentialStorePort>,
    fs_port: Arc<dyn FsPort>,
    log_port: Arc<dyn LogPort>,
}

impl UploadInteractor {
    /// Create new upload interactor with injected ports
    pub fn new(
        orchestrator: Arc<UploadOrchestrator>,
        credential_store: Arc<dyn CredentialStorePort>,
        fs_port: Arc<dyn FsPort>,
        log_port: Arc<dyn LogPort>,
    ) -> Self {
        Self {
            orchestrator,
            credential_store,
            fs_port,
            log_port,
        }
    }

    /// Platforms that can be uploaded to, with their display names
    pub fn supported_platforms(&self) -> Vec<(PlatformId, String)> {
        self.orchestrator
            .registry()
            .iter()
            .map(|(id, adapter)| (id.clone(), adapter.display_name().to_string()))
            .collect()
    }

    /// Validate the request and resolve credentials into a task descriptor
    pub async fn prepare(&self, request: UploadRequest) -> Result<TaskDescriptor, DomainError> {
        let video_path = request.video_path.trim();
        if video_path.is_empty() {
            return Err(DomainError::BadArgs(
                "Select an existing video file".to_string(),
            ));
        }
        if !self.fs_port.file_exists(video_path).await? {
            return Err(DomainError::FileNotFound(video_path.to_string()));
        }

        let platforms = request
            .platforms
            .iter()
            .map(|name| PlatformId::parse(name))
            .collect::<Result<BTreeSet<_>, _>>()?;
        if platforms.is_empty() {
            return Err(DomainError::EmptyPlatformSet);
        }

        let registry = self.orchestrator.registry();
        for platform in platforms.iter().filter(|p| !registry.contains(p)) {
            self.log_port
                .warn(&format!("No uploader for platform {}; it will be skipped", platform))
                .await;
        }

        let credentials = self.credential_store.load_all().await?;
        self.log_port
            .debug(&format!(
                "Loaded credentials for {} platform(s) from {}",
                credentials.len(),
                self.credential_store.store_path()
            ))
            .await;

        TaskDescriptor::new(
            video_path,
            request.description,
            request.tags,
            platforms,
            credentials,
        )
    }

    /// Validate the request and start uploading in the background
    pub async fn start(&self, request: UploadRequest) -> Result<RunHandle, DomainError> {
        let task = self.prepare(request).await?;

        self.log_port
            .info(&format!(
                "Starting upload of {} to: {}",
                task.video_path().display(),
                task.platforms()
                    .iter()
                    .map(PlatformId::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
            .await;

        let video_path = task.video_path().display().to_string();
        let platform_count = task.platforms().len();
        let bytes = self.fs_port.get_file_size(&video_path).await?;
        let handle = self.orchestrator.submit(task)?;
        self.log_port
            .log_event(
                &LogEvent::new(LogLevel::Debug, "Upload run submitted")
                    .with("run_id", handle.run_id())
                    .with("video", video_path)
                    .with("bytes", bytes)
                    .with("platforms", platform_count),
            )
            .await;
        Ok(handle)
    }
}
