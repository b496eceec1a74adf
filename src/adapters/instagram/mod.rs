// Instagram Reels adapter - private API login, rupload and configure_to_clips

pub mod session;

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{header, Client, RequestBuilder};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::adapters::http::{ensure_success, video_size};
use crate::domain::model::{CredentialBlob, PlatformId, PlatformPayload};
use crate::domain::rules::{CaptionFormatter, SHORT_VIDEO_CAPTION_MAX_CHARS};
use crate::error::{UploadError, UploadResult};
use crate::ports::{CredentialCheck, PlatformAdapter};

use self::session::{DeviceIds, InstagramSession, SessionFile};

/// User agent of the Android app the private API expects
const APP_USER_AGENT: &str =
    "Instagram 269.0.0.18.75 Android (26/8.0.0; 480dpi; 1080x1920; OnePlus; 6T Dev; devitron; qcom; en_US; 314665256)";
const APP_ID: &str = "567067343352427";

#[derive(Debug, Clone)]
pub struct InstagramConfig {
    pub api_base: String,
    pub upload_base: String,
    pub session_file: PathBuf,
    /// Wait between configure attempts while the video is transcoding
    pub configure_retry_delay: Duration,
    pub max_configure_attempts: u32,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    logged_in_user: Option<LoggedInUser>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoggedInUser {
    pk: Value,
}

/// Instagram numeric ids arrive as numbers or strings
fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Entity name used for the rupload path of one upload
fn entity_name(upload_id: &str) -> String {
    let suffix = Uuid::new_v4().as_u128() % 10_000_000_000;
    format!("{}_0_{}", upload_id, suffix)
}

fn rupload_params(upload_id: &str) -> Value {
    json!({
        "retry_context": "{\"num_step_auto_retry\":0,\"num_reupload\":0,\"num_step_manual_retry\":0}",
        "media_type": "2",
        "xsharing_user_ids": "[]",
        "upload_id": upload_id,
        "is_clips_video": "1",
    })
}

pub struct InstagramAdapter {
    http: Client,
    config: InstagramConfig,
    sessions: SessionFile,
}

impl InstagramAdapter {
    pub fn new(http: Client, config: InstagramConfig) -> Self {
        let sessions = SessionFile::new(config.session_file.clone());
        Self {
            http,
            config,
            sessions,
        }
    }

    /// Username trimmed; password passed on exactly as stored
    fn login_pair(credentials: &CredentialBlob) -> Option<(&str, &str)> {
        let password = credentials
            .as_value()
            .get("password")
            .and_then(Value::as_str)
            .filter(|p| !p.trim().is_empty())?;
        Some((credentials.get_str("username")?, password))
    }

    fn app_request(&self, request: RequestBuilder, device: &DeviceIds) -> RequestBuilder {
        request
            .header(header::USER_AGENT, APP_USER_AGENT)
            .header("X-IG-App-ID", APP_ID)
            .header("X-IG-Device-ID", &device.uuid)
            .header("X-IG-Android-ID", &device.device_id)
    }

    fn authed(&self, request: RequestBuilder, session: &InstagramSession) -> RequestBuilder {
        self.app_request(request, &session.device)
            .header(header::AUTHORIZATION, &session.authorization)
            .header("IG-U-DS-USER-ID", &session.user_id)
    }

    /// Reuse the stored session when it still works, otherwise log in again
    async fn session(&self, username: &str, password: &str) -> UploadResult<InstagramSession> {
        let stored = self.sessions.load_for(username);

        if let Some(session) = &stored {
            match self.verify(session).await {
                Ok(true) => {
                    debug!("Reusing stored Instagram session");
                    return Ok(session.clone());
                }
                Ok(false) => info!("Stored Instagram session expired, logging in again"),
                Err(e) => warn!(error = %e, "Could not verify stored Instagram session"),
            }
        }

        let device = stored
            .map(|s| s.device)
            .unwrap_or_else(DeviceIds::generate);
        let session = self.login(username, password, device).await?;
        self.sessions.save(&session)?;
        Ok(session)
    }

    async fn verify(&self, session: &InstagramSession) -> UploadResult<bool> {
        let url = format!("{}/accounts/current_user/", self.config.api_base);
        let response = self
            .authed(self.http.get(url), session)
            .query(&[("edit", "true")])
            .send()
            .await?;
        Ok(response.status().is_success())
    }

    async fn login(&self, username: &str, password: &str, device: DeviceIds) -> UploadResult<InstagramSession> {
        info!(%username, "Logging in to Instagram");
        let url = format!("{}/accounts/login/", self.config.api_base);
        let enc_password = format!("#PWD_INSTAGRAM:0:{}:{}", Utc::now().timestamp(), password);

        let response = self
            .app_request(self.http.post(url), &device)
            .form(&[
                ("username", username),
                ("enc_password", enc_password.as_str()),
                ("device_id", device.device_id.as_str()),
                ("guid", device.uuid.as_str()),
                ("phone_id", device.phone_id.as_str()),
                ("login_attempt_count", "0"),
            ])
            .send()
            .await?;

        let status = response.status();
        let authorization = response
            .headers()
            .get("ig-set-authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body: LoginResponse = response.json().await?;

        if !status.is_success() {
            return Err(UploadError::Auth(
                body.message
                    .unwrap_or_else(|| format!("login failed with status {}", status.as_u16())),
            ));
        }

        let user_id = body
            .logged_in_user
            .as_ref()
            .and_then(|u| id_string(&u.pk))
            .ok_or_else(|| UploadError::protocol("login response has no user id"))?;
        let authorization = authorization
            .filter(|a| !a.is_empty())
            .ok_or_else(|| UploadError::protocol("login response has no authorization header"))?;

        Ok(InstagramSession {
            username: username.to_string(),
            user_id,
            authorization,
            device,
            created_at: Utc::now(),
        })
    }

    async fn rupload(&self, session: &InstagramSession, video_path: &Path, upload_id: &str) -> UploadResult<()> {
        let bytes = tokio::fs::read(video_path).await?;
        let entity = entity_name(upload_id);
        let url = format!("{}/rupload_igvideo/{}", self.config.upload_base, entity);
        debug!(%entity, size = bytes.len(), "Sending Instagram video");

        let response = self
            .authed(self.http.post(url), session)
            .header("X-Instagram-Rupload-Params", rupload_params(upload_id).to_string())
            .header("X-Entity-Name", entity.as_str())
            .header("X-Entity-Type", "video/mp4")
            .header("X-Entity-Length", bytes.len().to_string())
            .header("Offset", "0")
            .header(header::CONTENT_TYPE, "application/octet-stream")
            .body(bytes)
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }

    /// Publish the uploaded video as a reel, waiting out transcoding
    async fn configure(&self, session: &InstagramSession, upload_id: &str, caption: &str) -> UploadResult<Value> {
        let url = format!("{}/media/configure_to_clips/", self.config.api_base);
        let attempts = self.config.max_configure_attempts.max(1);

        for attempt in 1..=attempts {
            let response = self
                .authed(self.http.post(&url), session)
                .form(&[
                    ("upload_id", upload_id),
                    ("caption", caption),
                    ("source_type", "4"),
                    ("clips_share_preview_to_feed", "1"),
                    ("device_id", session.device.device_id.as_str()),
                    ("_uid", session.user_id.as_str()),
                    ("_uuid", session.device.uuid.as_str()),
                ])
                .send()
                .await?;

            let status = response.status();
            let body: Value = response.json().await?;
            let message = body.get("message").and_then(Value::as_str).unwrap_or_default();

            if status.is_success() && body.get("status").and_then(Value::as_str) == Some("ok") {
                return body
                    .get("media")
                    .cloned()
                    .ok_or_else(|| UploadError::protocol("configure response has no media"));
            }

            if message.to_lowercase().contains("transcode") && attempt < attempts {
                debug!(attempt, "Instagram still transcoding");
                tokio::time::sleep(self.config.configure_retry_delay).await;
                continue;
            }

            return Err(UploadError::Rejected {
                status: status.as_u16(),
                body: if message.is_empty() { body.to_string() } else { message.to_string() },
            });
        }

        Err(UploadError::protocol("video did not finish transcoding"))
    }
}

#[async_trait]
impl PlatformAdapter for InstagramAdapter {
    fn platform(&self) -> PlatformId {
        PlatformId::instagram()
    }

    fn display_name(&self) -> &str {
        "Instagram Reels"
    }

    async fn upload(
        &self,
        video_path: &Path,
        description: &str,
        tags: &str,
        credentials: &CredentialBlob,
    ) -> UploadResult<PlatformPayload> {
        let (username, password) = Self::login_pair(credentials)
            .ok_or_else(|| UploadError::missing("Instagram username and password"))?;
        video_size(video_path).await?;

        let session = self.session(username, password).await?;
        let caption = CaptionFormatter::caption(description, tags, Some(SHORT_VIDEO_CAPTION_MAX_CHARS));
        let upload_id = Utc::now().timestamp_millis().to_string();

        self.rupload(&session, video_path, &upload_id).await?;
        let media = self.configure(&session, &upload_id, &caption).await?;
        info!(code = ?media.get("code"), "Instagram reel published");
        Ok(PlatformPayload::new(media))
    }

    fn validate_credentials(&self, credentials: &CredentialBlob) -> CredentialCheck {
        match Self::login_pair(credentials) {
            Some(_) => CredentialCheck::ok(),
            None => CredentialCheck::invalid("Username or password missing"),
        }
    }
}
