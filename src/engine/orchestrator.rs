//! Parallel multi-platform upload orchestrator
//!
//! One [`TaskDescriptor`] becomes one run. Each dispatched platform is an
//! independent unit admitted through a semaphore, so at most `max_concurrent`
//! adapters are in flight and the rest wait in submission order. Units are
//! collected in completion order; a failing or panicking adapter only ever
//! produces an error outcome for its own platform.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, OwnedSemaphorePermit, Semaphore};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::model::*;
use crate::domain::rules::PlatformSelection;
use crate::engine::progress::{EventSink, ProgressCounter, UploadEvent};
use crate::engine::registry::AdapterRegistry;
use crate::engine::OrchestratorConfig;
use crate::ports::PlatformAdapter;

/// Fans upload requests out to the registered platform adapters
#[derive(Debug, Clone)]
pub struct UploadOrchestrator {
    registry: AdapterRegistry,
    config: OrchestratorConfig,
}

impl UploadOrchestrator {
    pub fn new(registry: AdapterRegistry, config: OrchestratorConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &AdapterRegistry {
        &self.registry
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Validate the request and start the run in the background.
    ///
    /// Fails synchronously, before any event is emitted, when the video file
    /// does not exist. Must be called from within a tokio runtime.
    pub fn submit(&self, task: TaskDescriptor) -> Result<RunHandle, DomainError> {
        if !task.video_path().is_file() {
            return Err(DomainError::FileNotFound(
                task.video_path().display().to_string(),
            ));
        }

        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            DomainError::InternalError(format!("Upload runs need a tokio runtime: {}", e))
        })?;

        let selection = PlatformSelection::resolve(task.platforms(), |p| self.registry.contains(p));
        let units = selection
            .dispatched
            .iter()
            .filter_map(|p| self.registry.get(p).map(|adapter| (p.clone(), adapter)))
            .collect();

        let run = UploadRun {
            run_id: Uuid::new_v4(),
            task: Arc::new(task),
            units,
            unregistered: selection.unregistered,
            max_concurrent: self.config.max_concurrent.max(1),
        };

        let run_id = run.run_id;
        let (sink, events) = EventSink::channel();
        let join = runtime.spawn(run.execute(sink));

        Ok(RunHandle {
            run_id,
            events,
            join,
        })
    }
}

/// Caller-side view of a running upload
#[derive(Debug)]
pub struct RunHandle {
    run_id: Uuid,
    events: mpsc::UnboundedReceiver<UploadEvent>,
    join: JoinHandle<AggregateResult>,
}

impl RunHandle {
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Whether the run has delivered its terminal event
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Next event of the run; `None` once the run is over and all events were read
    pub async fn next_event(&mut self) -> Option<UploadEvent> {
        self.events.recv().await
    }

    /// Read every remaining event and return them with the aggregate result
    pub async fn collect(mut self) -> Result<(Vec<UploadEvent>, AggregateResult), DomainError> {
        let mut events = Vec::new();
        while let Some(event) = self.events.recv().await {
            events.push(event);
        }
        let result = self.join.await.map_err(|e| {
            DomainError::InternalError(format!("Upload run {} aborted: {}", self.run_id, e))
        })?;
        Ok((events, result))
    }

    /// Wait for the aggregate result, discarding events
    pub async fn wait(self) -> Result<AggregateResult, DomainError> {
        self.collect().await.map(|(_, result)| result)
    }
}

/// State of one run, moved into the driver task
struct UploadRun {
    run_id: Uuid,
    task: Arc<TaskDescriptor>,
    units: Vec<(PlatformId, Arc<dyn PlatformAdapter>)>,
    unregistered: Vec<PlatformId>,
    max_concurrent: usize,
}

impl UploadRun {
    async fn execute(self, sink: EventSink) -> AggregateResult {
        let run_id = self.run_id;
        let total = self.units.len();

        for platform in &self.unregistered {
            debug!(%run_id, %platform, "No adapter registered, platform left out of the run");
        }

        if total == 0 {
            info!(%run_id, "No registered platform requested, nothing to upload");
            let result = AggregateResult::new();
            sink.progress(100, 0, 0);
            sink.log(format!("Done: {}.", result.summary()));
            sink.finished(result.clone());
            return result;
        }

        info!(
            %run_id,
            video = %self.task.video_path().display(),
            total,
            max_concurrent = self.max_concurrent,
            "Starting upload run"
        );
        sink.log(format!("Starting upload to {} platform(s)...", total));

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let counter = ProgressCounter::new(total);
        let mut units = JoinSet::new();
        let mut unit_platforms = HashMap::new();

        for (platform, adapter) in self.units {
            // Admission happens here, in submission order; units beyond the
            // ceiling wait for a finishing unit to hand back its permit.
            // The semaphore is never closed.
            let permit = Arc::clone(&semaphore).acquire_owned().await.ok();
            let unit = UploadUnit {
                platform: platform.clone(),
                adapter,
                task: Arc::clone(&self.task),
                sink: sink.clone(),
                counter: counter.clone(),
                permit,
            };
            let handle = units.spawn(unit.run());
            unit_platforms.insert(handle.id(), platform);
        }

        let mut result = AggregateResult::new();
        while let Some(joined) = units.join_next_with_id().await {
            let outcome = match joined {
                Ok((_, outcome)) => outcome,
                Err(join_error) => {
                    let Some(platform) = unit_platforms.get(&join_error.id()).cloned() else {
                        error!(%run_id, error = %join_error, "Unknown upload unit aborted");
                        continue;
                    };
                    error!(%run_id, %platform, error = %join_error, "Upload unit aborted");
                    sink.status(platform.clone(), UnitStatus::Failed);
                    sink.log(format!("{}: error: upload task aborted", platform.label()));
                    counter.complete_one(&sink);
                    PlatformOutcome::failed(
                        platform,
                        format!("Upload task aborted: {}", join_error),
                        Duration::ZERO,
                    )
                }
            };

            if !result.insert(outcome) {
                warn!(%run_id, "Duplicate outcome ignored");
            }
        }

        let summary = result.summary();
        info!(
            %run_id,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Upload run finished: {}",
            summary
        );
        sink.log(format!("Done: {}.", summary));
        sink.finished(result.clone());
        result
    }
}

/// One platform's share of a run
struct UploadUnit {
    platform: PlatformId,
    adapter: Arc<dyn PlatformAdapter>,
    task: Arc<TaskDescriptor>,
    sink: EventSink,
    counter: ProgressCounter,
    permit: Option<OwnedSemaphorePermit>,
}

impl UploadUnit {
    async fn run(self) -> PlatformOutcome {
        let started = Instant::now();
        self.sink.status(self.platform.clone(), UnitStatus::Started);
        self.sink
            .log(format!("Uploading to {}...", self.adapter.display_name()));
        debug!(platform = %self.platform, "Upload unit started");

        let outcome = match self.invoke_adapter().await {
            Ok(payload) => PlatformOutcome::succeeded(self.platform.clone(), payload, started.elapsed()),
            Err(message) => PlatformOutcome::failed(self.platform.clone(), message, started.elapsed()),
        };
        drop(self.permit);

        match outcome.error_message() {
            None => {
                info!(platform = %self.platform, elapsed_ms = outcome.elapsed_ms, "Upload succeeded");
                self.sink.status(self.platform.clone(), UnitStatus::Completed);
                self.sink
                    .log(format!("{}: uploaded successfully.", self.platform.label()));
            }
            Some(message) => {
                warn!(platform = %self.platform, error = %message, "Upload failed");
                self.sink.status(self.platform.clone(), UnitStatus::Failed);
                self.sink
                    .log(format!("{}: error: {}", self.platform.label(), message));
            }
        }

        self.counter.complete_one(&self.sink);
        outcome
    }

    /// Run the adapter in its own task so a panic surfaces as an error message
    async fn invoke_adapter(&self) -> Result<PlatformPayload, String> {
        let adapter = Arc::clone(&self.adapter);
        let task = Arc::clone(&self.task);
        let platform = self.platform.clone();

        let call = tokio::spawn(async move {
            let credentials = task.credentials_for(&platform);
            adapter
                .upload(task.video_path(), task.description(), task.tags(), &credentials)
                .await
        });

        match call.await {
            Ok(Ok(payload)) => Ok(payload),
            Ok(Err(e)) => Err(e.to_string()),
            Err(join_error) if join_error.is_panic() => Err(format!(
                "Adapter panicked: {}",
                panic_message(join_error.into_panic())
            )),
            Err(join_error) => Err(format!("Upload task cancelled: {}", join_error)),
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
