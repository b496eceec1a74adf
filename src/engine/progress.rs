//! Progress events and the shared completion counter of an upload run

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::trace;

use crate::domain::model::{AggregateResult, PlatformId, ProgressState, UnitStatus};

/// Notification emitted during a run, in emission order
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum UploadEvent {
    /// Human-readable log line
    Log { message: String, at: DateTime<Utc> },
    /// Overall completion, 0-100, never decreasing within a run
    Progress {
        percent: u8,
        completed: usize,
        total: usize,
    },
    /// Lifecycle change of one platform unit
    Status {
        platform: PlatformId,
        status: UnitStatus,
    },
    /// Terminal event, sent exactly once per run
    Finished { result: AggregateResult },
}

impl UploadEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadEvent::Finished { .. })
    }
}

/// Sending half of a run's event channel.
///
/// A dropped receiver does not stop the run; events are discarded instead.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<UploadEvent>,
}

impl EventSink {
    /// Create a sink and the receiver the subscriber reads from
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<UploadEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn log(&self, message: impl Into<String>) {
        self.emit(UploadEvent::Log {
            message: message.into(),
            at: Utc::now(),
        });
    }

    pub fn progress(&self, percent: u8, completed: usize, total: usize) {
        self.emit(UploadEvent::Progress {
            percent,
            completed,
            total,
        });
    }

    pub fn status(&self, platform: PlatformId, status: UnitStatus) {
        self.emit(UploadEvent::Status { platform, status });
    }

    pub fn finished(&self, result: AggregateResult) {
        self.emit(UploadEvent::Finished { result });
    }

    fn emit(&self, event: UploadEvent) {
        if self.tx.send(event).is_err() {
            trace!("Event subscriber gone, dropping event");
        }
    }
}

/// Completion counter shared by the units of one run
#[derive(Debug, Clone)]
pub struct ProgressCounter {
    state: Arc<Mutex<ProgressState>>,
}

impl ProgressCounter {
    pub fn new(total: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(ProgressState::new(total))),
        }
    }

    /// Count one finished unit and publish the new percentage.
    ///
    /// The progress event is sent while the lock is held so that events leave
    /// in counter order. Sending on an unbounded channel never blocks.
    pub fn complete_one(&self, sink: &EventSink) -> ProgressState {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let percent = state.advance();
        sink.progress(percent, state.completed(), state.total());
        *state
    }

    pub fn snapshot(&self) -> ProgressState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
