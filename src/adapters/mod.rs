// Adapters - External system implementations

pub mod fs_local;
pub mod http;
pub mod instagram;
pub mod json_credentials;
pub mod tiktok;
pub mod toml_config;
pub mod tracing_log;
pub mod youtube;

// Re-export adapters
pub use fs_local::FsLocalAdapter;
pub use instagram::{InstagramAdapter, InstagramConfig};
pub use json_credentials::JsonCredentialStore;
pub use tiktok::{TikTokAdapter, TikTokConfig};
pub use toml_config::TomlConfigAdapter;
pub use tracing_log::TracingLogAdapter;
pub use youtube::{YouTubeAdapter, YouTubeConfig};
