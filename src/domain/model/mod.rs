// Domain models - Core types and data structures

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;

/// Platform identifier - normalized lowercase name such as `youtube`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlatformId(String);

impl PlatformId {
    pub const YOUTUBE: &'static str = "youtube";
    pub const TIKTOK: &'static str = "tiktok";
    pub const INSTAGRAM: &'static str = "instagram";

    /// Platforms shipped with this build, in display order
    pub const BUILTIN: [&'static str; 3] = [Self::YOUTUBE, Self::TIKTOK, Self::INSTAGRAM];

    /// Parse a platform identifier, accepting any casing and surrounding whitespace
    pub fn parse(name: &str) -> Result<Self, DomainError> {
        let normalized = name.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(DomainError::BadArgs(
                "Platform name cannot be empty".to_string(),
            ));
        }
        if !normalized
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(DomainError::BadArgs(format!(
                "Invalid platform name: {}",
                name
            )));
        }
        Ok(Self(normalized))
    }

    pub fn youtube() -> Self {
        Self(Self::YOUTUBE.to_string())
    }

    pub fn tiktok() -> Self {
        Self(Self::TIKTOK.to_string())
    }

    pub fn instagram() -> Self {
        Self(Self::INSTAGRAM.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name with the first letter capitalized, used in log lines
    pub fn label(&self) -> String {
        let mut chars = self.0.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

impl fmt::Display for PlatformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

/// Opaque per-platform credential blob. Its shape belongs to the adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialBlob(serde_json::Value);

impl CredentialBlob {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    /// Empty JSON object
    pub fn empty() -> Self {
        Self(serde_json::Value::Object(serde_json::Map::new()))
    }

    /// Build an object blob from key/value pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), serde_json::Value::String(v.into())))
            .collect();
        Self(serde_json::Value::Object(map))
    }

    /// String field, ignoring blanks
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }

    pub fn into_value(self) -> serde_json::Value {
        self.0
    }
}

impl Default for CredentialBlob {
    fn default() -> Self {
        Self::empty()
    }
}

/// Credentials for every platform, keyed by platform id
pub type CredentialMap = BTreeMap<PlatformId, CredentialBlob>;

/// Immutable description of one upload request
#[derive(Debug, Clone)]
pub struct TaskDescriptor {
    video_path: PathBuf,
    description: String,
    tags: String,
    platforms: BTreeSet<PlatformId>,
    credentials: CredentialMap,
}

impl TaskDescriptor {
    /// Create a new descriptor. The platform set must not be empty.
    pub fn new(
        video_path: impl Into<PathBuf>,
        description: impl Into<String>,
        tags: impl Into<String>,
        platforms: impl IntoIterator<Item = PlatformId>,
        credentials: CredentialMap,
    ) -> Result<Self, DomainError> {
        let video_path = video_path.into();
        if video_path.as_os_str().is_empty() {
            return Err(DomainError::BadArgs(
                "Video path cannot be empty".to_string(),
            ));
        }

        let platforms: BTreeSet<PlatformId> = platforms.into_iter().collect();
        if platforms.is_empty() {
            return Err(DomainError::EmptyPlatformSet);
        }

        Ok(Self {
            video_path,
            description: description.into(),
            tags: tags.into(),
            platforms,
            credentials,
        })
    }

    pub fn video_path(&self) -> &Path {
        &self.video_path
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn tags(&self) -> &str {
        &self.tags
    }

    pub fn platforms(&self) -> &BTreeSet<PlatformId> {
        &self.platforms
    }

    pub fn credentials(&self) -> &CredentialMap {
        &self.credentials
    }

    /// Credentials for one platform, or an empty blob when none were supplied
    pub fn credentials_for(&self, platform: &PlatformId) -> CredentialBlob {
        self.credentials.get(platform).cloned().unwrap_or_default()
    }
}

/// Opaque success value returned by an adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlatformPayload(serde_json::Value);

impl PlatformPayload {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }
}

/// Status of one platform outcome. Exactly one of payload / error message exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum OutcomeStatus {
    Ok { payload: PlatformPayload },
    Error { error_message: String },
}

/// Per-platform result of one upload attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformOutcome {
    pub platform: PlatformId,
    #[serde(flatten)]
    pub status: OutcomeStatus,
    pub finished_at: DateTime<Utc>,
    pub elapsed_ms: u64,
}

impl PlatformOutcome {
    pub fn succeeded(platform: PlatformId, payload: PlatformPayload, elapsed: Duration) -> Self {
        Self {
            platform,
            status: OutcomeStatus::Ok { payload },
            finished_at: Utc::now(),
            elapsed_ms: elapsed.as_millis() as u64,
        }
    }

    pub fn failed(platform: PlatformId, error_message: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            platform,
            status: OutcomeStatus::Error {
                error_message: error_message.into(),
            },
            finished_at: Utc::now(),
            elapsed_ms: elapsed.as_millis() as u64,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self.status, OutcomeStatus::Ok { .. })
    }

    pub fn payload(&self) -> Option<&PlatformPayload> {
        match &self.status {
            OutcomeStatus::Ok { payload } => Some(payload),
            OutcomeStatus::Error { .. } => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.status {
            OutcomeStatus::Ok { .. } => None,
            OutcomeStatus::Error { error_message } => Some(error_message),
        }
    }
}

/// Complete mapping of platform to outcome for one run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AggregateResult {
    outcomes: BTreeMap<PlatformId, PlatformOutcome>,
}

impl AggregateResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an outcome. Each platform is written once; a second write is rejected.
    pub fn insert(&mut self, outcome: PlatformOutcome) -> bool {
        if self.outcomes.contains_key(&outcome.platform) {
            return false;
        }
        self.outcomes.insert(outcome.platform.clone(), outcome);
        true
    }

    pub fn get(&self, platform: &PlatformId) -> Option<&PlatformOutcome> {
        self.outcomes.get(platform)
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PlatformId, &PlatformOutcome)> {
        self.outcomes.iter()
    }

    pub fn platforms(&self) -> impl Iterator<Item = &PlatformId> {
        self.outcomes.keys()
    }

    pub fn succeeded_count(&self) -> usize {
        self.outcomes.values().filter(|o| o.is_ok()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.len() - self.succeeded_count()
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary::from_counts(self.succeeded_count(), self.len())
    }
}

/// Overall shape of a finished run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryKind {
    AllSucceeded,
    PartialSuccess,
    AllFailed,
    NothingDispatched,
}

/// Count breakdown of an aggregate result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub kind: SummaryKind,
    pub succeeded: usize,
    pub failed: usize,
    pub total: usize,
}

impl RunSummary {
    pub fn from_counts(succeeded: usize, total: usize) -> Self {
        let kind = if total == 0 {
            SummaryKind::NothingDispatched
        } else if succeeded == total {
            SummaryKind::AllSucceeded
        } else if succeeded == 0 {
            SummaryKind::AllFailed
        } else {
            SummaryKind::PartialSuccess
        };

        Self {
            kind,
            succeeded,
            failed: total - succeeded,
            total,
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            SummaryKind::NothingDispatched => write!(f, "nothing to upload"),
            _ => write!(f, "{} of {} succeeded", self.succeeded, self.total),
        }
    }
}

/// Lifecycle of one platform unit as reported to subscribers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitStatus {
    Started,
    Completed,
    Failed,
}

impl fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitStatus::Started => write!(f, "started"),
            UnitStatus::Completed => write!(f, "completed"),
            UnitStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Completion counter of one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressState {
    completed: usize,
    total: usize,
}

impl ProgressState {
    pub fn new(total: usize) -> Self {
        Self { completed: 0, total }
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn is_done(&self) -> bool {
        self.completed >= self.total
    }

    /// Count one finished unit and return the new percentage
    pub fn advance(&mut self) -> u8 {
        if self.completed < self.total {
            self.completed += 1;
        }
        self.percentage()
    }

    /// floor(completed / total * 100); an empty run is complete
    pub fn percentage(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        ((self.completed * 100) / self.total) as u8
    }
}

#[cfg(test)]
mod tests;
