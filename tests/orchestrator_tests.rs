use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tempfile::TempDir;

use crosspost_cli::domain::model::*;
use crosspost_cli::engine::{AdapterRegistry, OrchestratorConfig, UploadEvent, UploadOrchestrator};
use crosspost_cli::error::{UploadError, UploadResult};
use crosspost_cli::ports::{CredentialCheck, PlatformAdapter};
use crosspost_cli::DomainError;

/// Test utilities for upload runs
mod test_utils {
    use super::*;

    #[derive(Clone)]
    pub enum Behavior {
        Succeed,
        Fail(&'static str),
        Panic(&'static str),
    }

    /// Adapter that sleeps, then behaves as told, tracking how many calls overlap
    pub struct MockAdapter {
        pub id: PlatformId,
        pub delay: Duration,
        pub behavior: Behavior,
        pub in_flight: Arc<AtomicUsize>,
        pub peak: Arc<AtomicUsize>,
        pub seen_credentials: Arc<Mutex<Vec<CredentialBlob>>>,
    }

    impl MockAdapter {
        pub fn new(name: &str, delay_ms: u64, behavior: Behavior) -> Self {
            Self {
                id: PlatformId::parse(name).unwrap(),
                delay: Duration::from_millis(delay_ms),
                behavior,
                in_flight: Arc::new(AtomicUsize::new(0)),
                peak: Arc::new(AtomicUsize::new(0)),
                seen_credentials: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub fn sharing(mut self, in_flight: &Arc<AtomicUsize>, peak: &Arc<AtomicUsize>) -> Self {
            self.in_flight = Arc::clone(in_flight);
            self.peak = Arc::clone(peak);
            self
        }
    }

    #[async_trait]
    impl PlatformAdapter for MockAdapter {
        fn platform(&self) -> PlatformId {
            self.id.clone()
        }

        fn display_name(&self) -> &str {
            self.id.as_str()
        }

        async fn upload(
            &self,
            _video_path: &Path,
            _description: &str,
            _tags: &str,
            credentials: &CredentialBlob,
        ) -> UploadResult<PlatformPayload> {
            self.seen_credentials.lock().unwrap().push(credentials.clone());
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            tokio::time::sleep(self.delay).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            match &self.behavior {
                Behavior::Succeed => Ok(PlatformPayload::new(json!({ "id": self.id.as_str() }))),
                Behavior::Fail(message) => Err(UploadError::Auth(message.to_string())),
                Behavior::Panic(message) => panic!("{}", message),
            }
        }

        fn validate_credentials(&self, _credentials: &CredentialBlob) -> CredentialCheck {
            CredentialCheck::ok()
        }
    }

    pub fn video() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("clip.mp4");
        std::fs::write(&path, b"not really a video").unwrap();
        (dir, path)
    }

    pub fn orchestrator(adapters: Vec<MockAdapter>, max_concurrent: usize) -> UploadOrchestrator {
        let registry = adapters.into_iter().fold(AdapterRegistry::new(), |registry, adapter| {
            registry.with(Arc::new(adapter) as Arc<dyn PlatformAdapter>)
        });
        UploadOrchestrator::new(registry, OrchestratorConfig::with_max_concurrent(max_concurrent))
    }

    pub fn task(video: &Path, platforms: &[&str]) -> TaskDescriptor {
        TaskDescriptor::new(
            video,
            "Sunset over the bay",
            "#travel sea",
            platforms.iter().map(|p| PlatformId::parse(p).unwrap()),
            CredentialMap::new(),
        )
        .unwrap()
    }

    pub fn percents(events: &[UploadEvent]) -> Vec<u8> {
        events
            .iter()
            .filter_map(|e| match e {
                UploadEvent::Progress { percent, .. } => Some(*percent),
                _ => None,
            })
            .collect()
    }

    pub fn statuses(events: &[UploadEvent], wanted: UnitStatus) -> Vec<String> {
        events
            .iter()
            .filter_map(|e| match e {
                UploadEvent::Status { platform, status } if *status == wanted => {
                    Some(platform.to_string())
                }
                _ => None,
            })
            .collect()
    }

    pub fn logs(events: &[UploadEvent]) -> Vec<String> {
        events
            .iter()
            .filter_map(|e| match e {
                UploadEvent::Log { message, .. } => Some(message.clone()),
                _ => None,
            })
            .collect()
    }
}

use test_utils::*;

fn three_platforms() -> Vec<MockAdapter> {
    vec![
        MockAdapter::new("youtube", 20, Behavior::Succeed),
        MockAdapter::new("tiktok", 10, Behavior::Succeed),
        MockAdapter::new("instagram", 30, Behavior::Succeed),
    ]
}

#[tokio::test]
async fn test_every_subset_dispatches_exactly_its_platforms() {
    let (_dir, video) = video();
    let all = ["youtube", "tiktok", "instagram"];

    for mask in 1..(1 << all.len()) {
        let subset: Vec<&str> = all
            .iter()
            .enumerate()
            .filter(|(i, _)| mask & (1 << i) != 0)
            .map(|(_, p)| *p)
            .collect();

        let orchestrator = orchestrator(three_platforms(), 3);
        let handle = orchestrator.submit(task(&video, &subset)).unwrap();
        let (events, result) = handle.collect().await.unwrap();

        assert_eq!(result.len(), subset.len(), "subset {:?}", subset);
        for platform in &subset {
            assert!(result.get(&PlatformId::parse(platform).unwrap()).unwrap().is_ok());
        }
        assert_eq!(statuses(&events, UnitStatus::Started).len(), subset.len());
        assert_eq!(percents(&events).last(), Some(&100));
    }
}

#[tokio::test]
async fn test_progress_is_monotonic_and_finished_is_last() {
    let (_dir, video) = video();
    let orchestrator = orchestrator(three_platforms(), 3);

    let handle = orchestrator
        .submit(task(&video, &["youtube", "tiktok", "instagram"]))
        .unwrap();
    let (events, result) = handle.collect().await.unwrap();

    assert_eq!(percents(&events), vec![33, 66, 100]);
    assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
    assert!(matches!(events.last(), Some(UploadEvent::Finished { result: r }) if *r == result));

    let logs = logs(&events);
    assert_eq!(logs.first().map(String::as_str), Some("Starting upload to 3 platform(s)..."));
    assert_eq!(logs.last().map(String::as_str), Some("Done: 3 of 3 succeeded."));
}

#[tokio::test]
async fn test_unregistered_platforms_are_excluded() {
    let (_dir, video) = video();
    let orchestrator = orchestrator(
        vec![
            MockAdapter::new("youtube", 5, Behavior::Succeed),
            MockAdapter::new("tiktok", 5, Behavior::Succeed),
        ],
        3,
    );

    let handle = orchestrator
        .submit(task(&video, &["youtube", "tiktok", "vimeo"]))
        .unwrap();
    let (events, result) = handle.collect().await.unwrap();

    assert_eq!(result.len(), 2);
    assert!(result.get(&PlatformId::parse("vimeo").unwrap()).is_none());
    assert_eq!(percents(&events), vec![50, 100]);
    assert_eq!(result.summary().to_string(), "2 of 2 succeeded");
}

#[tokio::test]
async fn test_all_unregistered_finishes_immediately() {
    let (_dir, video) = video();
    let orchestrator = orchestrator(three_platforms(), 3);

    let handle = orchestrator.submit(task(&video, &["vimeo", "rutube"])).unwrap();
    let (events, result) = handle.collect().await.unwrap();

    assert!(result.is_empty());
    assert_eq!(percents(&events), vec![100]);
    assert!(statuses(&events, UnitStatus::Started).is_empty());
    assert!(events.last().unwrap().is_terminal());
    assert_eq!(result.summary().kind, SummaryKind::NothingDispatched);
}

#[tokio::test]
async fn test_one_failure_does_not_affect_the_others() {
    let (_dir, video) = video();
    let orchestrator = orchestrator(
        vec![
            MockAdapter::new("youtube", 10, Behavior::Succeed),
            MockAdapter::new("tiktok", 5, Behavior::Fail("cookie file missing")),
            MockAdapter::new("instagram", 15, Behavior::Succeed),
        ],
        3,
    );

    let handle = orchestrator
        .submit(task(&video, &["youtube", "tiktok", "instagram"]))
        .unwrap();
    let (events, result) = handle.collect().await.unwrap();

    assert!(result.get(&PlatformId::youtube()).unwrap().is_ok());
    assert!(result.get(&PlatformId::instagram()).unwrap().is_ok());
    let tiktok = result.get(&PlatformId::tiktok()).unwrap();
    assert!(tiktok.error_message().unwrap().contains("cookie file missing"));

    assert_eq!(result.summary().to_string(), "2 of 3 succeeded");
    assert_eq!(result.summary().kind, SummaryKind::PartialSuccess);
    assert_eq!(statuses(&events, UnitStatus::Failed), vec!["tiktok"]);
    assert!(logs(&events)
        .iter()
        .any(|l| l.starts_with("Tiktok: error:") && l.contains("cookie file missing")));
}

#[tokio::test]
async fn test_adapter_panic_becomes_error_outcome() {
    let (_dir, video) = video();
    let orchestrator = orchestrator(
        vec![
            MockAdapter::new("youtube", 5, Behavior::Panic("token file corrupted")),
            MockAdapter::new("tiktok", 5, Behavior::Succeed),
        ],
        2,
    );

    let handle = orchestrator.submit(task(&video, &["youtube", "tiktok"])).unwrap();
    let (events, result) = handle.collect().await.unwrap();

    let youtube = result.get(&PlatformId::youtube()).unwrap();
    assert_eq!(
        youtube.error_message(),
        Some("Adapter panicked: token file corrupted")
    );
    assert!(result.get(&PlatformId::tiktok()).unwrap().is_ok());
    assert_eq!(percents(&events).last(), Some(&100));
}

#[tokio::test]
async fn test_concurrency_ceiling_is_honored() {
    let (_dir, video) = video();
    let in_flight = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let names = ["a1", "a2", "a3", "a4", "a5", "a6"];
    let adapters = names
        .iter()
        .map(|n| MockAdapter::new(n, 40, Behavior::Succeed).sharing(&in_flight, &peak))
        .collect();
    let orchestrator = orchestrator(adapters, 2);

    let result = orchestrator.submit(task(&video, &names)).unwrap().wait().await.unwrap();

    assert_eq!(result.len(), names.len());
    assert!(peak.load(Ordering::SeqCst) <= 2);
    assert!(peak.load(Ordering::SeqCst) >= 1);
}

#[tokio::test]
async fn test_queued_units_start_in_submission_order() {
    let (_dir, video) = video();
    let orchestrator = orchestrator(three_platforms(), 1);

    let handle = orchestrator
        .submit(task(&video, &["youtube", "tiktok", "instagram"]))
        .unwrap();
    let (events, _) = handle.collect().await.unwrap();

    // platforms are dispatched in identifier order
    assert_eq!(
        statuses(&events, UnitStatus::Started),
        vec!["instagram", "tiktok", "youtube"]
    );
}

#[tokio::test]
async fn test_outcomes_arrive_in_completion_order() {
    let (_dir, video) = video();
    let orchestrator = orchestrator(
        vec![
            MockAdapter::new("youtube", 300, Behavior::Succeed),
            MockAdapter::new("tiktok", 10, Behavior::Succeed),
            MockAdapter::new("instagram", 150, Behavior::Succeed),
        ],
        3,
    );

    let handle = orchestrator
        .submit(task(&video, &["youtube", "tiktok", "instagram"]))
        .unwrap();
    let (events, _) = handle.collect().await.unwrap();

    assert_eq!(
        statuses(&events, UnitStatus::Completed),
        vec!["tiktok", "instagram", "youtube"]
    );
}

#[tokio::test]
async fn test_missing_video_is_rejected_before_any_event() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.mp4");
    let orchestrator = orchestrator(three_platforms(), 3);

    let err = orchestrator.submit(task(&missing, &["youtube"])).unwrap_err();
    assert!(matches!(err, DomainError::FileNotFound(_)));
}

#[tokio::test]
async fn test_adapters_receive_their_own_credentials() {
    let (_dir, video) = video();
    let tiktok = MockAdapter::new("tiktok", 1, Behavior::Succeed);
    let seen = Arc::clone(&tiktok.seen_credentials);
    let orchestrator = orchestrator(vec![tiktok], 1);

    let mut credentials = CredentialMap::new();
    credentials.insert(
        PlatformId::tiktok(),
        CredentialBlob::from_pairs([("cookies_file", "/tmp/cookies.txt")]),
    );
    credentials.insert(
        PlatformId::instagram(),
        CredentialBlob::from_pairs([("username", "me"), ("password", "pw")]),
    );
    let task = TaskDescriptor::new(&video, "", "", [PlatformId::tiktok()], credentials).unwrap();

    orchestrator.submit(task).unwrap().wait().await.unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].get_str("cookies_file"), Some("/tmp/cookies.txt"));
    assert_eq!(seen[0].get_str("password"), None);
}
