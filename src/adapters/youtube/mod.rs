// YouTube Shorts adapter - resumable upload through the YouTube Data API v3

pub mod oauth;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::Serialize;
use tokio::fs::File;
use tracing::{debug, info};

use crate::adapters::http::{content_range, ensure_success, guess_video_mime, read_chunk, video_size};
use crate::domain::model::{CredentialBlob, PlatformId, PlatformPayload};
use crate::domain::rules::CaptionFormatter;
use crate::error::{UploadError, UploadResult};
use crate::ports::{CredentialCheck, PlatformAdapter};

use self::oauth::{token_file_or, ClientSecrets, OAuthFlow};

/// 308 responses that do not move the upload forward before giving up
const MAX_STALLED_CHUNKS: u32 = 3;

/// Endpoints and upload options
#[derive(Debug, Clone)]
pub struct YouTubeConfig {
    pub upload_base: String,
    pub auth_url: String,
    pub token_url: String,
    pub privacy_status: String,
    pub chunk_size: usize,
    /// Token file used when the credentials do not name one
    pub default_token_file: PathBuf,
}

/// Video resource sent when opening the upload session
#[derive(Debug, Serialize, PartialEq)]
pub struct VideoResource {
    pub snippet: Snippet,
    pub status: Status,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct Snippet {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    pub privacy_status: String,
    pub self_declared_made_for_kids: bool,
}

impl VideoResource {
    pub fn new(description: &str, tags: &str, privacy_status: &str) -> Self {
        Self {
            snippet: Snippet {
                title: CaptionFormatter::youtube_title(description),
                description: description.to_string(),
                tags: CaptionFormatter::keyword_tags(tags),
            },
            status: Status {
                privacy_status: privacy_status.to_string(),
                self_declared_made_for_kids: false,
            },
        }
    }
}

/// Offset of the next byte to send after a 308, from a `Range: bytes=0-N` header
pub fn next_offset_from_range(range: Option<&str>) -> u64 {
    range
        .and_then(|r| r.trim().strip_prefix("bytes="))
        .and_then(|r| r.split('-').nth(1))
        .and_then(|end| end.trim().parse::<u64>().ok())
        .map(|end| end + 1)
        .unwrap_or(0)
}

pub struct YouTubeAdapter {
    http: Client,
    config: YouTubeConfig,
}

impl YouTubeAdapter {
    pub fn new(http: Client, config: YouTubeConfig) -> Self {
        Self { http, config }
    }

    fn secrets_path(credentials: &CredentialBlob) -> UploadResult<PathBuf> {
        let path = credentials
            .get_str("client_secrets_file")
            .ok_or_else(|| UploadError::missing("YouTube client_secrets_file"))?;
        let path = PathBuf::from(path);
        if !path.is_file() {
            return Err(UploadError::CredentialFileNotFound {
                what: "OAuth client_secrets.json for YouTube".to_string(),
                path: path.display().to_string(),
            });
        }
        Ok(path)
    }

    /// Open a resumable session, returning its upload URL
    async fn open_session(
        &self,
        access_token: &str,
        resource: &VideoResource,
        size: u64,
        mime: &str,
    ) -> UploadResult<String> {
        let url = format!("{}/upload/youtube/v3/videos", self.config.upload_base);
        let response = self
            .http
            .post(url)
            .query(&[("uploadType", "resumable"), ("part", "snippet,status")])
            .bearer_auth(access_token)
            .header("X-Upload-Content-Length", size.to_string())
            .header("X-Upload-Content-Type", mime)
            .json(resource)
            .send()
            .await?;
        let response = ensure_success(response).await?;

        response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| UploadError::protocol("resumable session has no Location header"))
    }

    /// Send the file in chunks, resuming where the server says it stopped
    async fn transfer(
        &self,
        access_token: &str,
        session_url: &str,
        video_path: &Path,
        size: u64,
        mime: &str,
    ) -> UploadResult<serde_json::Value> {
        let mut file = File::open(video_path).await?;
        let chunk_size = self.config.chunk_size.max(1) as u64;
        let mut offset = 0u64;
        let mut stalled = 0u32;

        loop {
            let len = chunk_size.min(size - offset);
            let chunk = read_chunk(&mut file, offset, len as usize).await?;
            debug!(offset, len, size, "Sending YouTube chunk");

            let response = self
                .http
                .put(session_url)
                .bearer_auth(access_token)
                .header(header::CONTENT_TYPE, mime)
                .header(header::CONTENT_RANGE, content_range(offset, len, size))
                .body(chunk)
                .send()
                .await?;

            match response.status() {
                StatusCode::OK | StatusCode::CREATED => return Ok(response.json().await?),
                StatusCode::PERMANENT_REDIRECT => {
                    let range = response
                        .headers()
                        .get(header::RANGE)
                        .and_then(|v| v.to_str().ok());
                    let next = next_offset_from_range(range);

                    if next <= offset {
                        stalled += 1;
                        if stalled >= MAX_STALLED_CHUNKS {
                            return Err(UploadError::protocol(format!(
                                "upload stalled at byte {} of {}",
                                offset, size
                            )));
                        }
                    } else {
                        stalled = 0;
                    }
                    if next >= size {
                        return Err(UploadError::protocol(
                            "server acknowledged every byte but did not finish the upload",
                        ));
                    }
                    offset = next;
                }
                _ => {
                    ensure_success(response).await?;
                    return Err(UploadError::protocol("unexpected status from upload session"));
                }
            }
        }
    }
}

#[async_trait]
impl PlatformAdapter for YouTubeAdapter {
    fn platform(&self) -> PlatformId {
        PlatformId::youtube()
    }

    fn display_name(&self) -> &str {
        "YouTube Shorts"
    }

    async fn upload(
        &self,
        video_path: &Path,
        description: &str,
        tags: &str,
        credentials: &CredentialBlob,
    ) -> UploadResult<PlatformPayload> {
        let secrets = ClientSecrets::load(&Self::secrets_path(credentials)?)?;
        let token_file = token_file_or(
            credentials.get_str("token_file"),
            &self.config.default_token_file,
        );
        let size = video_size(video_path).await?;
        let mime = guess_video_mime(video_path);

        let flow = OAuthFlow::new(&self.http, secrets, &self.config.auth_url, &self.config.token_url);
        let token = flow.authorize(&token_file).await?;

        let resource = VideoResource::new(description, tags, &self.config.privacy_status);
        info!(title = %resource.snippet.title, size, "Opening YouTube upload session");
        let session_url = self.open_session(&token.token, &resource, size, &mime).await?;

        let video = self
            .transfer(&token.token, &session_url, video_path, size, &mime)
            .await?;
        info!(id = ?video.get("id"), "YouTube upload finished");
        Ok(PlatformPayload::new(video))
    }

    fn validate_credentials(&self, credentials: &CredentialBlob) -> CredentialCheck {
        match Self::secrets_path(credentials) {
            Ok(_) => CredentialCheck::ok(),
            Err(_) => CredentialCheck::invalid("Client secrets file not found"),
        }
    }
}
