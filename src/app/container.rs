use std::sync::Arc;
use std::time::Duration;

use crate::adapters::http::build_client;
use crate::adapters::{
    FsLocalAdapter, InstagramAdapter, InstagramConfig, JsonCredentialStore, TikTokAdapter,
    TikTokConfig, TracingLogAdapter, YouTubeAdapter, YouTubeConfig,
};
use crate::app::{credentials_interactor::CredentialsInteractor, upload_interactor::UploadInteractor};
use crate::config_initialization::AppSettings;
use crate::domain::errors::DomainError;
use crate::engine::{AdapterRegistry, OrchestratorConfig, UploadOrchestrator};
use crate::ports::{CredentialStorePort, FsPort, LogPort, PlatformAdapter};

/// TikTok publish status polling
const TIKTOK_POLL_INTERVAL: Duration = Duration::from_secs(5);
const TIKTOK_MAX_STATUS_POLLS: u32 = 24;
/// Instagram configure retries while the reel transcodes
const INSTAGRAM_CONFIGURE_DELAY: Duration = Duration::from_secs(4);
const INSTAGRAM_MAX_CONFIGURE_ATTEMPTS: u32 = 10;

pub trait AppContainer: Send + Sync {
    fn upload_interactor(&self) -> Arc<UploadInteractor>;
    fn credentials_interactor(&self) -> Arc<CredentialsInteractor>;
}

pub struct DefaultAppContainer {
    upload_interactor: Arc<UploadInteractor>,
    credentials_interactor: Arc<CredentialsInteractor>,
}

impl DefaultAppContainer {
    /// Wire the built-in platform adapters from resolved settings
    pub fn new(settings: &AppSettings) -> Result<Self, DomainError> {
        Ok(Self::with_registry(settings, Self::builtin_registry(settings)?))
    }

    /// Wire the application around a given set of platform adapters
    pub fn with_registry(settings: &AppSettings, registry: AdapterRegistry) -> Self {
        let fs_port = Arc::new(FsLocalAdapter::new());
        let log_port = Arc::new(TracingLogAdapter::new(settings.log_level));
        let credential_store = Arc::new(JsonCredentialStore::new(settings.credentials_file()));

        let orchestrator = Arc::new(UploadOrchestrator::new(
            registry.clone(),
            OrchestratorConfig::with_max_concurrent(settings.max_concurrent),
        ));

        let upload_interactor = Arc::new(UploadInteractor::new(
            orchestrator,
            Arc::clone(&credential_store) as Arc<dyn CredentialStorePort>,
            Arc::clone(&fs_port) as Arc<dyn FsPort>,
            Arc::clone(&log_port) as Arc<dyn LogPort>,
        ));

        let credentials_interactor = Arc::new(CredentialsInteractor::new(
            Arc::clone(&credential_store) as Arc<dyn CredentialStorePort>,
            registry,
            Arc::clone(&log_port) as Arc<dyn LogPort>,
        ));

        Self {
            upload_interactor,
            credentials_interactor,
        }
    }

    /// YouTube, TikTok and Instagram adapters sharing one HTTP client
    pub fn builtin_registry(settings: &AppSettings) -> Result<AdapterRegistry, DomainError> {
        let http = build_client(settings.request_timeout)?;

        let youtube = YouTubeAdapter::new(
            http.clone(),
            YouTubeConfig {
                upload_base: settings.youtube_upload_base.clone(),
                auth_url: settings.google_auth_url.clone(),
                token_url: settings.google_token_url.clone(),
                privacy_status: settings.youtube_privacy_status.clone(),
                chunk_size: settings.upload_chunk_size,
                default_token_file: settings.youtube_token_file(),
            },
        );

        let tiktok = TikTokAdapter::new(
            http.clone(),
            TikTokConfig {
                api_base: settings.tiktok_api_base.clone(),
                privacy_level: "PUBLIC_TO_EVERYONE".to_string(),
                poll_interval: TIKTOK_POLL_INTERVAL,
                max_status_polls: TIKTOK_MAX_STATUS_POLLS,
            },
        );

        let instagram = InstagramAdapter::new(
            http,
            InstagramConfig {
                api_base: settings.instagram_api_base.clone(),
                upload_base: settings.instagram_upload_base.clone(),
                session_file: settings.instagram_session_file(),
                configure_retry_delay: INSTAGRAM_CONFIGURE_DELAY,
                max_configure_attempts: INSTAGRAM_MAX_CONFIGURE_ATTEMPTS,
            },
        );

        Ok(AdapterRegistry::new()
            .with(Arc::new(youtube) as Arc<dyn PlatformAdapter>)
            .with(Arc::new(tiktok) as Arc<dyn PlatformAdapter>)
            .with(Arc::new(instagram) as Arc<dyn PlatformAdapter>))
    }
}

impl AppContainer for DefaultAppContainer {
    fn upload_interactor(&self) -> Arc<UploadInteractor> {
        Arc::clone(&self.upload_interactor)
    }

    fn credentials_interactor(&self) -> Arc<CredentialsInteractor> {
        Arc::clone(&self.credentials_interactor)
    }
}
