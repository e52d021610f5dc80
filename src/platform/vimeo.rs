use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{info, warn};

use super::DestinationPlatform;
use crate::config::DestinationConfig;
use crate::error::{ClipcastError, Result};
use crate::model::Credential;

const API_VERSION_ACCEPT: &str = "application/vnd.vimeo.*+json;version=3.4";
const TUS_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, Deserialize)]
struct CreateVideoResponse {
    uri: String,
    link: String,
    upload: UploadInfo,
}

#[derive(Debug, Clone, Deserialize)]
struct UploadInfo {
    upload_link: String,
}

#[derive(Debug, Clone, Deserialize)]
struct PictureResponse {
    uri: String,
    link: String,
}

/// Vimeo destination platform.
///
/// Publishing creates the video with a tus upload approach, pushes the
/// file bytes to the returned upload link, and optionally uploads and
/// activates a thumbnail picture. The credential triple is replaceable
/// at runtime through `update_credentials`.
pub struct VimeoDestination {
    config: DestinationConfig,
    credential: RwLock<Option<Credential>>,
    client: reqwest::Client,
}

impl VimeoDestination {
    pub fn new(config: DestinationConfig) -> Self {
        let credential = config.credential().ok();
        Self {
            config,
            credential: RwLock::new(credential),
            client: reqwest::Client::new(),
        }
    }

    fn current_credential(&self) -> Result<Credential> {
        let guard = self.credential.read().map_err(|_| {
            ClipcastError::UnsetConfiguration("destination credential lock is poisoned".to_string())
        })?;
        guard.clone().ok_or_else(|| {
            ClipcastError::UnsetConfiguration("destination credential is not set".to_string())
        })
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        url: &str,
        credential: &Credential,
        body: serde_json::Value,
    ) -> Result<T> {
        let response = self
            .client
            .post(url)
            .bearer_auth(&credential.token)
            .header(reqwest::header::ACCEPT, API_VERSION_ACCEPT)
            .json(&body)
            .send()
            .await
            .map_err(|e| ClipcastError::Publish(format!("Request to {} failed: {}", url, e)))?;

        let response = ensure_success(response, url).await?;
        response.json::<T>().await.map_err(|e| {
            ClipcastError::Publish(format!("Failed to parse response from {}: {}", url, e))
        })
    }

    async fn upload_file(&self, upload_link: &str, local_path: &Path) -> Result<()> {
        let body = tokio::fs::read(local_path).await?;
        let response = self
            .client
            .patch(upload_link)
            .header("Tus-Resumable", TUS_VERSION)
            .header("Upload-Offset", "0")
            .header(reqwest::header::CONTENT_TYPE, "application/offset+octet-stream")
            .body(body)
            .send()
            .await
            .map_err(|e| ClipcastError::Publish(format!("Upload transfer failed: {}", e)))?;

        ensure_success(response, "upload transfer").await?;
        Ok(())
    }

    async fn activate_thumbnail(
        &self,
        credential: &Credential,
        video_uri: &str,
        thumbnail_path: &Path,
    ) -> Result<()> {
        info!("Activating thumbnail {}", thumbnail_path.display());

        let picture: PictureResponse = self
            .post_json(
                &format!("{}{}/pictures", self.config.api_endpoint, video_uri),
                credential,
                serde_json::json!({}),
            )
            .await?;

        let bytes = tokio::fs::read(thumbnail_path).await?;
        let response = self
            .client
            .put(&picture.link)
            .body(bytes)
            .send()
            .await
            .map_err(|e| ClipcastError::Publish(format!("Thumbnail upload failed: {}", e)))?;
        ensure_success(response, "thumbnail upload").await?;

        let response = self
            .client
            .patch(format!("{}{}", self.config.api_endpoint, picture.uri))
            .bearer_auth(&credential.token)
            .header(reqwest::header::ACCEPT, API_VERSION_ACCEPT)
            .json(&serde_json::json!({ "active": true }))
            .send()
            .await
            .map_err(|e| ClipcastError::Publish(format!("Thumbnail activation failed: {}", e)))?;
        ensure_success(response, "thumbnail activation").await?;

        Ok(())
    }
}

#[async_trait]
impl DestinationPlatform for VimeoDestination {
    fn ensure_configured(&self) -> Result<()> {
        self.current_credential().map(|_| ())
    }

    fn update_credentials(&self, credential: Credential) {
        match self.credential.write() {
            Ok(mut guard) => *guard = Some(credential),
            Err(_) => warn!("Destination credential lock is poisoned, update dropped"),
        }
    }

    async fn publish(
        &self,
        local_path: &Path,
        title: &str,
        thumbnail_path: Option<PathBuf>,
    ) -> Result<String> {
        let credential = self.current_credential()?;
        let size = tokio::fs::metadata(local_path).await?.len();

        info!(
            "Publishing {} ({} bytes) with title '{}'",
            local_path.display(),
            size,
            title
        );

        let create: CreateVideoResponse = self
            .post_json(
                &format!("{}/me/videos", self.config.api_endpoint),
                &credential,
                create_upload_body(title, size),
            )
            .await?;

        self.upload_file(&create.upload.upload_link, local_path).await?;

        if let Some(thumbnail) = thumbnail_path {
            self.activate_thumbnail(&credential, &create.uri, &thumbnail).await?;
        }

        info!("Published to {}", create.link);
        Ok(create.link)
    }
}

async fn ensure_success(response: reqwest::Response, context: &str) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ClipcastError::Publish(format!(
        "{} failed with {}: {}",
        context, status, body
    )))
}

/// Request body creating the video shell before the tus transfer.
fn create_upload_body(title: &str, size: u64) -> serde_json::Value {
    serde_json::json!({
        "upload": {
            "approach": "tus",
            "size": size.to_string(),
        },
        "name": title,
        "privacy": {
            "comments": "nobody",
        },
    })
}
