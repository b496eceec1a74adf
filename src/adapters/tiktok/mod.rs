// TikTok adapter - publish-init, chunked transfer and status polling

pub mod cookies;

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::fs::File;
use tracing::{debug, info, warn};

use crate::adapters::http::{content_range, ensure_success, guess_video_mime, read_chunk, video_size};
use crate::domain::model::{CredentialBlob, PlatformId, PlatformPayload};
use crate::domain::rules::{CaptionFormatter, SHORT_VIDEO_CAPTION_MAX_CHARS};
use crate::error::{UploadError, UploadResult};
use crate::ports::{CredentialCheck, PlatformAdapter};

use self::cookies::CookieJar;

/// Files below this size are sent as one chunk
pub const MIN_CHUNKED_SIZE: u64 = 5 * 1024 * 1024;
/// Chunk size for larger files; the remainder rides on the last chunk
pub const CHUNK_SIZE: u64 = 10 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct TikTokConfig {
    pub api_base: String,
    pub privacy_level: String,
    pub poll_interval: Duration,
    pub max_status_polls: u32,
}

/// How a file is split for the upload URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkPlan {
    pub video_size: u64,
    pub chunk_size: u64,
    /// `(offset, len)` of every chunk, in order
    pub chunks: Vec<(u64, u64)>,
}

impl ChunkPlan {
    pub fn for_size(video_size: u64) -> Self {
        if video_size < MIN_CHUNKED_SIZE {
            return Self {
                video_size,
                chunk_size: video_size,
                chunks: vec![(0, video_size)],
            };
        }

        let count = (video_size / CHUNK_SIZE).max(1);
        let chunk_size = if count == 1 { video_size } else { CHUNK_SIZE };
        let chunks = (0..count)
            .map(|i| {
                let offset = i * CHUNK_SIZE;
                let len = if i + 1 == count { video_size - offset } else { CHUNK_SIZE };
                (offset, len)
            })
            .collect();

        Self {
            video_size,
            chunk_size,
            chunks,
        }
    }

    pub fn total_chunk_count(&self) -> usize {
        self.chunks.len()
    }
}

enum TikTokAuth {
    Session(CookieJar),
    Bearer(String),
}

impl TikTokAuth {
    fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self {
            TikTokAuth::Session(jar) => request.header(header::COOKIE, jar.header_value()),
            TikTokAuth::Bearer(token) => request.bearer_auth(token),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    #[serde(default)]
    error: ApiError,
}

#[derive(Debug, Default, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

impl<T> Envelope<T> {
    /// The `data` member, or the API error as a rejection
    fn into_data(self, status: u16) -> UploadResult<T> {
        if !self.error.code.is_empty() && self.error.code != "ok" {
            return Err(UploadError::Rejected {
                status,
                body: format!("{}: {}", self.error.code, self.error.message),
            });
        }
        self.data
            .ok_or_else(|| UploadError::protocol("TikTok response has no data"))
    }
}

#[derive(Debug, Deserialize)]
struct InitData {
    publish_id: String,
    upload_url: String,
}

#[derive(Debug, Deserialize)]
struct StatusData {
    status: String,
    #[serde(default)]
    fail_reason: Option<String>,
}

#[derive(Debug, Serialize)]
struct InitRequest<'a> {
    post_info: PostInfo<'a>,
    source_info: SourceInfo,
}

#[derive(Debug, Serialize)]
struct PostInfo<'a> {
    title: &'a str,
    privacy_level: &'a str,
}

#[derive(Debug, Serialize)]
struct SourceInfo {
    source: &'static str,
    video_size: u64,
    chunk_size: u64,
    total_chunk_count: usize,
}

pub struct TikTokAdapter {
    http: Client,
    config: TikTokConfig,
}

impl TikTokAdapter {
    pub fn new(http: Client, config: TikTokConfig) -> Self {
        Self { http, config }
    }

    fn cookies_path(credentials: &CredentialBlob) -> Option<PathBuf> {
        credentials
            .get_str("cookies_file")
            .map(PathBuf::from)
            .filter(|p| p.is_file())
    }

    fn authenticate(credentials: &CredentialBlob) -> UploadResult<TikTokAuth> {
        if let Some(token) = credentials.get_str("access_token") {
            return Ok(TikTokAuth::Bearer(token.to_string()));
        }

        let path = credentials
            .get_str("cookies_file")
            .ok_or_else(|| UploadError::missing("TikTok cookies_file or access_token"))?;
        let path = Path::new(path);
        if !path.is_file() {
            return Err(UploadError::CredentialFileNotFound {
                what: "TikTok cookies file".to_string(),
                path: path.display().to_string(),
            });
        }

        let jar = CookieJar::load(path)?;
        jar.require_session()?;
        debug!(cookies = jar.len(), "Loaded TikTok cookies");
        Ok(TikTokAuth::Session(jar))
    }

    async fn init(&self, auth: &TikTokAuth, caption: &str, plan: &ChunkPlan) -> UploadResult<InitData> {
        let body = InitRequest {
            post_info: PostInfo {
                title: caption,
                privacy_level: &self.config.privacy_level,
            },
            source_info: SourceInfo {
                source: "FILE_UPLOAD",
                video_size: plan.video_size,
                chunk_size: plan.chunk_size,
                total_chunk_count: plan.total_chunk_count(),
            },
        };

        let url = format!("{}/v2/post/publish/video/init/", self.config.api_base);
        let response = auth.apply(self.http.post(url)).json(&body).send().await?;
        let response = ensure_success(response).await?;
        let status = response.status().as_u16();
        response.json::<Envelope<InitData>>().await?.into_data(status)
    }

    async fn send_chunks(&self, upload_url: &str, video_path: &Path, plan: &ChunkPlan) -> UploadResult<()> {
        let mime = guess_video_mime(video_path);
        let mut file = File::open(video_path).await?;

        for (index, &(offset, len)) in plan.chunks.iter().enumerate() {
            debug!(index, offset, len, "Sending TikTok chunk");
            let chunk = read_chunk(&mut file, offset, len as usize).await?;
            let response = self
                .http
                .put(upload_url)
                .header(header::CONTENT_TYPE, mime.as_str())
                .header(header::CONTENT_RANGE, content_range(offset, len, plan.video_size))
                .body(chunk)
                .send()
                .await?;
            ensure_success(response).await?;
        }
        Ok(())
    }

    /// Poll until the post is published or failed; returns the last status seen
    async fn await_publish(&self, auth: &TikTokAuth, publish_id: &str) -> UploadResult<String> {
        let url = format!("{}/v2/post/publish/status/fetch/", self.config.api_base);
        let mut last = String::from("PROCESSING_UPLOAD");

        for attempt in 0..self.config.max_status_polls {
            if attempt > 0 {
                tokio::time::sleep(self.config.poll_interval).await;
            }
            let response = auth
                .apply(self.http.post(&url))
                .json(&json!({ "publish_id": publish_id }))
                .send()
                .await?;
            let response = ensure_success(response).await?;
            let status = response.status().as_u16();
            let data = response.json::<Envelope<StatusData>>().await?.into_data(status)?;

            match data.status.as_str() {
                "PUBLISH_COMPLETE" => return Ok(data.status),
                "FAILED" => {
                    return Err(UploadError::Rejected {
                        status,
                        body: format!(
                            "publish failed: {}",
                            data.fail_reason.as_deref().unwrap_or("unknown reason")
                        ),
                    })
                }
                _ => {
                    debug!(attempt, status = %data.status, "TikTok still processing");
                    last = data.status;
                }
            }
        }

        warn!(%publish_id, status = %last, "TikTok still processing after the last status poll");
        Ok(last)
    }
}

#[async_trait]
impl PlatformAdapter for TikTokAdapter {
    fn platform(&self) -> PlatformId {
        PlatformId::tiktok()
    }

    fn display_name(&self) -> &str {
        "TikTok"
    }

    async fn upload(
        &self,
        video_path: &Path,
        description: &str,
        tags: &str,
        credentials: &CredentialBlob,
    ) -> UploadResult<PlatformPayload> {
        let auth = Self::authenticate(credentials)?;
        let size = video_size(video_path).await?;
        let plan = ChunkPlan::for_size(size);
        let caption = CaptionFormatter::caption(description, tags, Some(SHORT_VIDEO_CAPTION_MAX_CHARS));

        info!(size, chunks = plan.total_chunk_count(), "Initializing TikTok upload");
        let init = self.init(&auth, &caption, &plan).await?;
        self.send_chunks(&init.upload_url, video_path, &plan).await?;
        let status = self.await_publish(&auth, &init.publish_id).await?;

        Ok(PlatformPayload::new(json!({
            "publish_id": init.publish_id,
            "status": status,
        })))
    }

    fn validate_credentials(&self, credentials: &CredentialBlob) -> CredentialCheck {
        if credentials.get_str("access_token").is_some() || Self::cookies_path(credentials).is_some() {
            CredentialCheck::ok()
        } else {
            CredentialCheck::invalid("Cookies file not found")
        }
    }
}
