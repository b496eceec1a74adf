// Domain rules - Business logic and policies

use std::collections::BTreeSet;

use crate::domain::model::*;

/// Longest title YouTube accepts
pub const YOUTUBE_TITLE_MAX_CHARS: usize = 100;
/// Title used when the description is empty
pub const YOUTUBE_DEFAULT_TITLE: &str = "Shorts upload";
/// Caption limit shared by TikTok and Instagram
pub const SHORT_VIDEO_CAPTION_MAX_CHARS: usize = 2200;

/// Formatting of descriptions and tags for the individual platforms
pub struct CaptionFormatter;

impl CaptionFormatter {
    /// Tags as YouTube keywords, split on whitespace and otherwise kept as typed
    pub fn keyword_tags(tags: &str) -> Vec<String> {
        tags.split_whitespace().map(str::to_string).collect()
    }

    /// Description, then the tags as typed on the next line
    pub fn caption(description: &str, tags: &str, max_chars: Option<usize>) -> String {
        let caption = if tags.trim().is_empty() {
            description.to_string()
        } else {
            format!("{}\n{}", description, tags)
        };

        match max_chars {
            Some(max) => Self::truncate(&caption, max),
            None => caption,
        }
    }

    /// YouTube title: first 100 characters of the description, or a default
    pub fn youtube_title(description: &str) -> String {
        let title: String = description.chars().take(YOUTUBE_TITLE_MAX_CHARS).collect();
        let title = title.trim();
        if title.is_empty() {
            YOUTUBE_DEFAULT_TITLE.to_string()
        } else {
            title.to_string()
        }
    }

    /// Cut to `max_chars` characters, ending with "..." when shortened
    pub fn truncate(text: &str, max_chars: usize) -> String {
        if text.chars().count() <= max_chars {
            return text.to_string();
        }
        if max_chars <= 3 {
            return text.chars().take(max_chars).collect();
        }
        let mut cut: String = text.chars().take(max_chars - 3).collect();
        cut.push_str("...");
        cut
    }
}

/// Which requested platforms actually get dispatched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformSelection {
    pub dispatched: Vec<PlatformId>,
    pub unregistered: Vec<PlatformId>,
}

impl PlatformSelection {
    /// Split the request into platforms with an adapter and platforms without one.
    /// Platforms without an adapter are left out of the run, not reported as failures.
    pub fn resolve<F>(requested: &BTreeSet<PlatformId>, is_registered: F) -> Self
    where
        F: Fn(&PlatformId) -> bool,
    {
        let (dispatched, unregistered): (Vec<PlatformId>, Vec<PlatformId>) = requested
            .iter()
            .cloned()
            .partition(|platform| is_registered(platform));

        Self {
            dispatched,
            unregistered,
        }
    }

    pub fn total(&self) -> usize {
        self.dispatched.len()
    }
}

/// Hiding of secrets before credentials are shown to a user
pub struct CredentialMasking;

impl CredentialMasking {
    const SENSITIVE: [&'static str; 4] = ["password", "token", "secret", "cookie"];

    /// Whether a credential field holds a secret value rather than a path
    pub fn is_sensitive(key: &str) -> bool {
        let key = key.to_lowercase();
        if key.ends_with("_file") {
            return false;
        }
        Self::SENSITIVE.iter().any(|s| key.contains(s))
    }

    /// Keep the first two characters, star the rest
    pub fn mask(value: &str) -> String {
        let visible: String = value.chars().take(2).collect();
        if value.chars().count() <= 2 {
            return "*".repeat(value.chars().count().max(1));
        }
        format!("{}{}", visible, "*".repeat(6))
    }

    /// Copy of the blob with sensitive string fields masked
    pub fn masked(blob: &CredentialBlob) -> CredentialBlob {
        match blob.as_value() {
            serde_json::Value::Object(map) => {
                let masked = map
                    .iter()
                    .map(|(k, v)| {
                        let value = match v {
                            serde_json::Value::String(s) if Self::is_sensitive(k) => {
                                serde_json::Value::String(Self::mask(s))
                            }
                            other => other.clone(),
                        };
                        (k.clone(), value)
                    })
                    .collect();
                CredentialBlob::new(serde_json::Value::Object(masked))
            }
            other => CredentialBlob::new(other.clone()),
        }
    }
}
