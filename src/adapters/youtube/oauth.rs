//! Installed-app OAuth for the YouTube Data API
//!
//! A stored token is reused while valid, refreshed when it has a refresh
//! token, and otherwise replaced through the loopback consent flow: a local
//! listener on `127.0.0.1:0` receives the redirect carrying the code.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use crate::adapters::http::ensure_success;
use crate::error::{UploadError, UploadResult};

/// Scopes requested for uploading
pub const SCOPES: [&str; 2] = [
    "https://www.googleapis.com/auth/youtube.upload",
    "https://www.googleapis.com/auth/youtube",
];

/// Tokens this close to expiry are refreshed before use
const EXPIRY_MARGIN_SECS: i64 = 60;
/// Largest redirect request read from the browser
const MAX_REQUEST_BYTES: usize = 16 * 1024;

/// OAuth client as downloaded from the Google console
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Deserialize)]
struct ClientSecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

impl ClientSecrets {
    /// Read a `client_secrets.json`, accepting `installed` and `web` clients
    pub fn load(path: &Path) -> UploadResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> UploadResult<Self> {
        let file: ClientSecretsFile = serde_json::from_str(content)?;
        file.installed.or(file.web).ok_or_else(|| {
            UploadError::Auth(
                "client secrets file has neither an \"installed\" nor a \"web\" client".to_string(),
            )
        })
    }
}

/// Token persisted between runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredToken {
    pub token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
}

impl StoredToken {
    /// Load the token file, `None` when absent or unreadable
    pub fn load(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        match serde_json::from_str(&content) {
            Ok(token) => Some(token),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring unreadable YouTube token file");
                None
            }
        }
    }

    pub fn save(&self, path: &Path) -> UploadResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Usable without refreshing at `now`; tokens without expiry count as valid
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        match self.expiry {
            Some(expiry) => expiry > now + ChronoDuration::seconds(EXPIRY_MARGIN_SECS),
            None => true,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    scope: Option<String>,
}

impl TokenResponse {
    fn into_stored(self, previous_refresh: Option<String>) -> StoredToken {
        StoredToken {
            token: self.access_token,
            refresh_token: self.refresh_token.or(previous_refresh),
            scopes: match self.scope {
                Some(scope) => scope.split_whitespace().map(str::to_string).collect(),
                None => SCOPES.iter().map(|s| s.to_string()).collect(),
            },
            expiry: self
                .expires_in
                .map(|secs| Utc::now() + ChronoDuration::seconds(secs)),
        }
    }
}

/// Query parameters of the consent redirect
#[derive(Debug, Default, PartialEq)]
pub struct Callback {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

impl Callback {
    /// Parse the request line of the browser redirect, e.g. `GET /?code=x&state=y HTTP/1.1`
    pub fn from_request_line(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace();
        if parts.next()? != "GET" {
            return None;
        }
        let target = parts.next()?;
        let url = Url::parse(&format!("http://127.0.0.1{}", target)).ok()?;

        let mut callback = Callback::default();
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "code" => callback.code = Some(value.into_owned()),
                "state" => callback.state = Some(value.into_owned()),
                "error" => callback.error = Some(value.into_owned()),
                _ => {}
            }
        }

        if callback.code.is_none() && callback.error.is_none() {
            return None;
        }
        Some(callback)
    }
}

/// Token acquisition against Google's OAuth endpoints
pub struct OAuthFlow<'a> {
    http: &'a Client,
    secrets: ClientSecrets,
    auth_url: &'a str,
    token_url: &'a str,
}

impl<'a> OAuthFlow<'a> {
    pub fn new(http: &'a Client, secrets: ClientSecrets, auth_url: &'a str, token_url: &'a str) -> Self {
        Self {
            http,
            secrets,
            auth_url,
            token_url,
        }
    }

    /// Return a usable token, refreshing or asking for consent as needed,
    /// and persist it to `token_file`
    pub async fn authorize(&self, token_file: &Path) -> UploadResult<StoredToken> {
        let stored = StoredToken::load(token_file);

        let token = match stored {
            Some(token) if token.is_valid_at(Utc::now()) => {
                debug!("Reusing stored YouTube token");
                return Ok(token);
            }
            Some(token) if token.refresh_token.is_some() => match self.refresh(&token).await {
                Ok(refreshed) => refreshed,
                Err(e) => {
                    warn!(error = %e, "YouTube token refresh failed, asking for consent again");
                    self.consent().await?
                }
            },
            _ => self.consent().await?,
        };

        token.save(token_file)?;
        Ok(token)
    }

    async fn refresh(&self, token: &StoredToken) -> UploadResult<StoredToken> {
        let refresh_token = token.refresh_token.clone().unwrap_or_default();
        info!("Refreshing YouTube access token");

        let response = self
            .http
            .post(self.token_url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token.as_str()),
                ("client_id", self.secrets.client_id.as_str()),
                ("client_secret", self.secrets.client_secret.as_str()),
            ])
            .send()
            .await?;
        let response: TokenResponse = ensure_success(response).await?.json().await?;
        Ok(response.into_stored(Some(refresh_token)))
    }

    async fn consent(&self) -> UploadResult<StoredToken> {
        let listener = TcpListener::bind(("127.0.0.1", 0)).await?;
        let redirect_uri = format!("http://127.0.0.1:{}/", listener.local_addr()?.port());
        let state = Uuid::new_v4().simple().to_string();
        let consent_url = self.consent_url(&redirect_uri, &state)?;

        info!(%redirect_uri, "Waiting for YouTube consent in the browser");
        eprintln!(
            "Open this URL in your browser to authorize YouTube uploads:\n\n    {}\n",
            consent_url
        );

        let code = wait_for_code(&listener, &state).await?;
        self.exchange(&code, &redirect_uri).await
    }

    fn consent_url(&self, redirect_uri: &str, state: &str) -> UploadResult<Url> {
        let scope = SCOPES.join(" ");
        Url::parse_with_params(
            self.auth_url,
            &[
                ("client_id", self.secrets.client_id.as_str()),
                ("redirect_uri", redirect_uri),
                ("response_type", "code"),
                ("scope", scope.as_str()),
                ("state", state),
                ("access_type", "offline"),
                ("prompt", "consent"),
            ],
        )
        .map_err(|e| UploadError::Auth(format!("invalid authorization URL: {}", e)))
    }

    async fn exchange(&self, code: &str, redirect_uri: &str) -> UploadResult<StoredToken> {
        let response = self
            .http
            .post(self.token_url)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", redirect_uri),
                ("client_id", self.secrets.client_id.as_str()),
                ("client_secret", self.secrets.client_secret.as_str()),
            ])
            .send()
            .await?;
        let response: TokenResponse = ensure_success(response).await?.json().await?;
        Ok(response.into_stored(None))
    }
}

/// Accept redirects until one carries the authorization code for `expected_state`
pub async fn wait_for_code(listener: &TcpListener, expected_state: &str) -> UploadResult<String> {
    loop {
        let (mut stream, peer) = listener.accept().await?;
        let request = read_request_head(&mut stream).await?;
        let callback = request.lines().next().and_then(Callback::from_request_line);

        let Some(callback) = callback else {
            // favicon and other stray requests
            debug!(%peer, "Ignoring request without authorization parameters");
            respond(&mut stream, "404 Not Found", "Not found").await;
            continue;
        };

        if let Some(error) = callback.error {
            respond(&mut stream, "200 OK", "Authorization was denied. You may close this window.").await;
            return Err(UploadError::Auth(format!("consent denied: {}", error)));
        }

        if callback.state.as_deref() != Some(expected_state) {
            respond(&mut stream, "400 Bad Request", "State mismatch.").await;
            return Err(UploadError::Auth(
                "state mismatch in OAuth redirect".to_string(),
            ));
        }

        respond(&mut stream, "200 OK", "Authorization complete. You may close this window.").await;
        return callback
            .code
            .ok_or_else(|| UploadError::Auth("redirect carried no authorization code".to_string()));
    }
}

async fn read_request_head(stream: &mut TcpStream) -> UploadResult<String> {
    let mut buffer = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];
    loop {
        let read = stream.read(&mut chunk).await?;
        if read == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..read]);
        if buffer.windows(4).any(|w| w == b"\r\n\r\n") || buffer.len() >= MAX_REQUEST_BYTES {
            break;
        }
    }
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

async fn respond(stream: &mut TcpStream, status: &str, message: &str) {
    let body = format!("<html><body><p>{}</p></body></html>", message);
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    if let Err(e) = stream.write_all(response.as_bytes()).await {
        debug!(error = %e, "Browser went away before the OAuth response was written");
    }
    let _ = stream.shutdown().await;
}

/// Token file used when the credentials name none
pub fn token_file_or(credential_value: Option<&str>, default: &Path) -> PathBuf {
    credential_value
        .map(PathBuf::from)
        .unwrap_or_else(|| default.to_path_buf())
}
