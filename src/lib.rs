//! Crosspost CLI Library
//!
//! Publishes one short video to several platforms (YouTube Shorts, TikTok,
//! Instagram Reels) in parallel. The [`engine`] fans an upload out to the
//! registered [`ports::PlatformAdapter`]s under a concurrency ceiling and
//! reports progress as a stream of [`engine::UploadEvent`]s.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod config_initialization;
pub mod domain;
pub mod engine;
pub mod error;
pub mod ports;

// Re-export commonly used types
pub use domain::errors::DomainError;
pub use domain::model::{AggregateResult, CredentialBlob, PlatformId, PlatformOutcome, TaskDescriptor};
pub use engine::{OrchestratorConfig, RunHandle, UploadEvent, UploadOrchestrator};
pub use error::{UploadError, UploadResult};
