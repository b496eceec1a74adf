use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;
use tempfile::TempDir;

use crosspost_cli::adapters::{FsLocalAdapter, JsonCredentialStore, TomlConfigAdapter};
use crosspost_cli::app::{AppContainer, DefaultAppContainer, UploadInteractor, UploadRequest};
use crosspost_cli::config_initialization::{resolve_settings, AppSettings, CliOverrides};
use crosspost_cli::domain::model::*;
use crosspost_cli::engine::AdapterRegistry;
use crosspost_cli::error::{UploadError, UploadResult};
use crosspost_cli::ports::{CredentialCheck, LogEvent, LogLevel, LogPort, PlatformAdapter};
use crosspost_cli::{DomainError, OrchestratorConfig, UploadOrchestrator};

/// Adapter that succeeds only when the stored credentials carry a token
struct TokenAdapter(PlatformId);

#[async_trait]
impl PlatformAdapter for TokenAdapter {
    fn platform(&self) -> PlatformId {
        self.0.clone()
    }

    fn display_name(&self) -> &str {
        "Token platform"
    }

    async fn upload(
        &self,
        _video_path: &Path,
        description: &str,
        _tags: &str,
        credentials: &CredentialBlob,
    ) -> UploadResult<PlatformPayload> {
        let token = credentials
            .get_str("access_token")
            .ok_or_else(|| UploadError::missing("access_token"))?;
        Ok(PlatformPayload::new(json!({ "token": token, "description": description })))
    }

    fn validate_credentials(&self, credentials: &CredentialBlob) -> CredentialCheck {
        match credentials.get_str("access_token") {
            Some(_) => CredentialCheck::ok(),
            None => CredentialCheck::invalid("Access token missing"),
        }
    }
}

async fn settings(app_dir: &Path) -> AppSettings {
    let overrides = CliOverrides {
        app_dir: Some(app_dir.to_path_buf()),
        ..Default::default()
    };
    resolve_settings(&TomlConfigAdapter::new(), &overrides, |_| None)
        .await
        .unwrap()
}

async fn container(app_dir: &Path) -> DefaultAppContainer {
    let registry = AdapterRegistry::new()
        .with(Arc::new(TokenAdapter(PlatformId::tiktok())) as Arc<dyn PlatformAdapter>)
        .with(Arc::new(TokenAdapter(PlatformId::youtube())) as Arc<dyn PlatformAdapter>);
    DefaultAppContainer::with_registry(&settings(app_dir).await, registry)
}

fn video(dir: &TempDir) -> String {
    let path = dir.path().join("clip.mp4");
    std::fs::write(&path, b"frames").unwrap();
    path.to_string_lossy().to_string()
}

#[tokio::test]
async fn test_upload_uses_stored_credentials() {
    let dir = TempDir::new().unwrap();
    let app = container(dir.path()).await;

    app.credentials_interactor()
        .set("TikTok", CredentialBlob::from_pairs([("access_token", "act.1")]))
        .await
        .unwrap();

    let request = UploadRequest {
        video_path: video(&dir),
        description: "hello".to_string(),
        tags: String::new(),
        platforms: vec!["tiktok".to_string(), "youtube".to_string()],
    };
    let result = app.upload_interactor().start(request).await.unwrap().wait().await.unwrap();

    let tiktok = result.get(&PlatformId::tiktok()).unwrap();
    assert_eq!(tiktok.payload().unwrap().as_value()["token"], "act.1");

    let youtube = result.get(&PlatformId::youtube()).unwrap();
    assert_eq!(youtube.error_message(), Some("Missing credentials: access_token"));
    assert_eq!(result.summary().to_string(), "1 of 2 succeeded");
}

#[tokio::test]
async fn test_upload_request_validation() {
    let dir = TempDir::new().unwrap();
    let app = container(dir.path()).await;
    let interactor = app.upload_interactor();

    let no_platforms = UploadRequest {
        video_path: video(&dir),
        ..Default::default()
    };
    assert_eq!(
        interactor.start(no_platforms).await.unwrap_err(),
        DomainError::EmptyPlatformSet
    );

    let missing_video = UploadRequest {
        video_path: dir.path().join("nope.mp4").to_string_lossy().to_string(),
        platforms: vec!["tiktok".to_string()],
        ..Default::default()
    };
    assert!(matches!(
        interactor.start(missing_video).await.unwrap_err(),
        DomainError::FileNotFound(_)
    ));

    let empty_path = UploadRequest {
        video_path: "  ".to_string(),
        platforms: vec!["tiktok".to_string()],
        ..Default::default()
    };
    assert!(matches!(
        interactor.start(empty_path).await.unwrap_err(),
        DomainError::BadArgs(_)
    ));

    let bad_name = UploadRequest {
        video_path: video(&dir),
        platforms: vec!["you tube".to_string()],
        ..Default::default()
    };
    assert!(matches!(
        interactor.start(bad_name).await.unwrap_err(),
        DomainError::BadArgs(_)
    ));
}

#[tokio::test]
async fn test_empty_video_is_left_to_the_uploaders() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.mp4");
    std::fs::write(&path, b"").unwrap();
    let app = container(dir.path()).await;

    let request = UploadRequest {
        video_path: path.to_string_lossy().to_string(),
        platforms: vec!["tiktok".to_string()],
        ..Default::default()
    };
    let task = app.upload_interactor().prepare(request).await.unwrap();
    assert_eq!(task.video_path(), path.as_path());
}

/// Log port that keeps structured events
#[derive(Default)]
struct RecordingLog {
    events: Mutex<Vec<LogEvent>>,
}

#[async_trait]
impl LogPort for RecordingLog {
    async fn info(&self, _message: &str) {}
    async fn warn(&self, _message: &str) {}
    async fn error(&self, _message: &str) {}
    async fn debug(&self, _message: &str) {}

    async fn log_event(&self, event: &LogEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

#[tokio::test]
async fn test_start_records_submitted_run() {
    let dir = TempDir::new().unwrap();
    let video = video(&dir);
    let log = Arc::new(RecordingLog::default());
    let registry = AdapterRegistry::new()
        .with(Arc::new(TokenAdapter(PlatformId::tiktok())) as Arc<dyn PlatformAdapter>);
    let interactor = UploadInteractor::new(
        Arc::new(UploadOrchestrator::new(registry, OrchestratorConfig::default())),
        Arc::new(JsonCredentialStore::in_app_dir(dir.path())),
        Arc::new(FsLocalAdapter::new()),
        log.clone(),
    );

    let handle = interactor
        .start(UploadRequest {
            video_path: video.clone(),
            platforms: vec!["tiktok".to_string(), "vimeo".to_string()],
            ..Default::default()
        })
        .await
        .unwrap();
    let run_id = handle.run_id().to_string();
    handle.wait().await.unwrap();

    let events = log.events.lock().unwrap();
    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert_eq!(event.level, LogLevel::Debug);
    assert_eq!(event.message, "Upload run submitted");
    assert_eq!(event.context["run_id"], run_id);
    assert_eq!(event.context["video"], video);
    assert_eq!(event.context["bytes"], "6");
    assert_eq!(event.context["platforms"], "2");
}

#[tokio::test]
async fn test_prepare_carries_full_credential_map() {
    let dir = TempDir::new().unwrap();
    let app = container(dir.path()).await;
    let credentials = app.credentials_interactor();
    credentials
        .set("tiktok", CredentialBlob::from_pairs([("access_token", "a")]))
        .await
        .unwrap();
    credentials
        .set("youtube", CredentialBlob::from_pairs([("access_token", "b")]))
        .await
        .unwrap();

    let task = app
        .upload_interactor()
        .prepare(UploadRequest {
            video_path: video(&dir),
            platforms: vec!["YouTube".to_string(), "vimeo".to_string()],
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(task.platforms().len(), 2);
    assert_eq!(task.credentials().len(), 2);
    assert_eq!(task.credentials_for(&PlatformId::youtube()).get_str("access_token"), Some("b"));
}

#[tokio::test]
async fn test_credentials_show_masks_secrets() {
    let dir = TempDir::new().unwrap();
    let app = container(dir.path()).await;
    let credentials = app.credentials_interactor();

    credentials
        .set("tiktok", CredentialBlob::from_pairs([("access_token", "act.secret"), ("cookies_file", "/tmp/c.txt")]))
        .await
        .unwrap();

    let shown = credentials.show().await.unwrap();
    let tiktok = &shown[&PlatformId::tiktok()];
    assert_eq!(tiktok.get_str("access_token"), Some("ac******"));
    assert_eq!(tiktok.get_str("cookies_file"), Some("/tmp/c.txt"));
    assert!(credentials.store_path().ends_with("creds.json"));
}

#[tokio::test]
async fn test_credentials_validate_and_unknown_platforms() {
    let dir = TempDir::new().unwrap();
    let app = container(dir.path()).await;
    let credentials = app.credentials_interactor();

    credentials
        .set("youtube", CredentialBlob::from_pairs([("access_token", "x")]))
        .await
        .unwrap();

    let checks = credentials.validate(None).await.unwrap();
    assert_eq!(checks.len(), 2);
    for (platform, check) in &checks {
        assert_eq!(check.valid, *platform == PlatformId::youtube(), "{}", platform);
    }

    let single = credentials.validate(Some("tiktok")).await.unwrap();
    assert_eq!(single[0].1.message, "Access token missing");

    assert!(matches!(
        credentials.validate(Some("vimeo")).await.unwrap_err(),
        DomainError::UnknownPlatform(_)
    ));
    assert!(matches!(
        credentials.set("vimeo", CredentialBlob::empty()).await.unwrap_err(),
        DomainError::UnknownPlatform(_)
    ));
}

#[tokio::test]
async fn test_builtin_container_registers_three_platforms() {
    let dir = TempDir::new().unwrap();
    let app = DefaultAppContainer::new(&settings(dir.path()).await).unwrap();

    let names: Vec<String> = app
        .upload_interactor()
        .supported_platforms()
        .into_iter()
        .map(|(id, _)| id.to_string())
        .collect();
    assert_eq!(names, vec!["instagram", "tiktok", "youtube"]);

    let checks = app.credentials_interactor().validate(None).await.unwrap();
    let messages: Vec<&str> = checks.iter().map(|(_, c)| c.message.as_str()).collect();
    assert_eq!(
        messages,
        vec![
            "Username or password missing",
            "Cookies file not found",
            "Client secrets file not found"
        ]
    );
}
