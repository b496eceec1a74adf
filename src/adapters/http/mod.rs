// HTTP helpers shared by the platform adapters

use std::path::Path;
use std::time::Duration;

use reqwest::{redirect, Client, Response};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use crate::domain::errors::DomainError;
use crate::error::{UploadError, UploadResult};

/// Longest response body kept in an error message
const ERROR_BODY_LIMIT: usize = 500;

/// Build the client used by every adapter.
///
/// Redirects are not followed: resumable upload endpoints answer 308 without a
/// `Location` header and the adapters handle that status themselves.
pub fn build_client(timeout: Duration) -> Result<Client, DomainError> {
    Client::builder()
        .timeout(timeout)
        .redirect(redirect::Policy::none())
        .user_agent(concat!("crosspost/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| DomainError::InternalError(format!("Failed to build HTTP client: {}", e)))
}

/// Pass 2xx responses through, turn anything else into [`UploadError::Rejected`]
pub async fn ensure_success(response: Response) -> UploadResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(UploadError::Rejected {
        status: status.as_u16(),
        body: shorten(&body),
    })
}

/// `Content-Range` value for a chunk starting at `offset`
pub fn content_range(offset: u64, len: u64, total: u64) -> String {
    if len == 0 {
        return format!("bytes */{}", total);
    }
    format!("bytes {}-{}/{}", offset, offset + len - 1, total)
}

/// MIME type of a video file from its extension, `video/*` when unknown
pub fn guess_video_mime(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or("video/*")
        .to_string()
}

/// Size of the video on disk
pub async fn video_size(path: &Path) -> UploadResult<u64> {
    let metadata = tokio::fs::metadata(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            UploadError::VideoNotFound {
                path: path.display().to_string(),
            }
        } else {
            UploadError::Io(e)
        }
    })?;

    if metadata.len() == 0 {
        return Err(UploadError::protocol(format!(
            "Video file is empty: {}",
            path.display()
        )));
    }
    Ok(metadata.len())
}

/// Read `len` bytes starting at `offset`
pub async fn read_chunk(file: &mut File, offset: u64, len: usize) -> UploadResult<Vec<u8>> {
    file.seek(std::io::SeekFrom::Start(offset)).await?;
    let mut buffer = vec![0u8; len];
    file.read_exact(&mut buffer).await?;
    Ok(buffer)
}

fn shorten(body: &str) -> String {
    let body = body.trim();
    if body.chars().count() <= ERROR_BODY_LIMIT {
        return body.to_string();
    }
    let mut cut: String = body.chars().take(ERROR_BODY_LIMIT).collect();
    cut.push_str("...");
    cut
}
