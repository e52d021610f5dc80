use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::Path;
use std::process::Command;
use tracing::{debug, info};

use super::SourcePlatform;
use crate::config::{MediaConfig, SourceConfig};
use crate::error::{ClipcastError, Result};
use crate::media::{MediaProcessor, MediaProcessorFactory};
use crate::model::AssetMetadata;
use crate::workspace::WorkingDir;

const UPLOAD_DATE_FORMAT: &str = "%Y%m%d";

/// Downloader JSON document for a single asset
#[derive(Debug, Clone, Deserialize)]
struct DownloaderDocument {
    id: String,
    title: String,
    #[serde(default)]
    uploader: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    upload_date: Option<String>,
    #[serde(default)]
    formats: Vec<DownloaderFormat>,
}

#[derive(Debug, Clone, Deserialize)]
struct DownloaderFormat {
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    vcodec: Option<String>,
}

/// YouTube source platform backed by a yt-dlp subprocess.
///
/// The source exposes video and audio as separate tracks; acquisition
/// downloads both and muxes them into the combined artifact, so callers
/// never see the intermediate stream files.
pub struct YouTubeSource {
    config: SourceConfig,
    media: Box<dyn MediaProcessor>,
}

impl YouTubeSource {
    pub fn new(config: SourceConfig, media: MediaConfig) -> Self {
        let media = MediaProcessorFactory::create_processor(media);
        Self { config, media }
    }

    fn watch_url(&self, asset_id: &str) -> String {
        format!("{}{}", self.config.watch_url_prefix, asset_id)
    }

    /// Run the downloader with a format selector, writing to `output_path`.
    fn download_stream(&self, url: &str, selector: &str, output_path: &Path) -> Result<()> {
        debug!("Downloading format '{}' to {}", selector, output_path.display());

        let output = Command::new(&self.config.binary_path)
            .arg("--no-playlist")
            .arg("--cache-dir")
            .arg(&self.config.cache_dir)
            .arg("-f")
            .arg(selector)
            .arg("-o")
            .arg(output_path)
            .arg(url)
            .output()
            .map_err(|e| {
                ClipcastError::UpstreamService(format!("Failed to execute downloader: {}", e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(classify_downloader_failure(&stderr));
        }

        Ok(())
    }
}

#[async_trait]
impl SourcePlatform for YouTubeSource {
    async fn metadata(&self, asset_id: &str) -> Result<AssetMetadata> {
        let url = self.watch_url(asset_id);
        info!("Resolving metadata for {}", url);

        let output = Command::new(&self.config.binary_path)
            .arg("-J")
            .arg("--no-download")
            .arg("--no-playlist")
            .arg("--cache-dir")
            .arg(&self.config.cache_dir)
            .arg(&url)
            .output()
            .map_err(|e| {
                ClipcastError::UpstreamService(format!("Failed to execute downloader: {}", e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(classify_downloader_failure(&stderr));
        }

        let json = String::from_utf8_lossy(&output.stdout);
        parse_metadata(&json)
    }

    async fn acquire(
        &self,
        asset_id: &str,
        resolution: &str,
        dest_dir: &Path,
        combined_file_name: &str,
    ) -> Result<()> {
        let url = self.watch_url(asset_id);
        let video_path = dest_dir.join(WorkingDir::video_stream_file_name(resolution));
        let audio_path = dest_dir.join(WorkingDir::audio_stream_file_name());
        let combined_path = dest_dir.join(combined_file_name);

        info!("Acquiring {} at {} into {}", url, resolution, dest_dir.display());

        self.download_stream(&url, &video_format_selector(resolution)?, &video_path)?;
        self.download_stream(&url, AUDIO_FORMAT_SELECTOR, &audio_path)?;

        self.media.mux(&video_path, &audio_path, &combined_path).await?;

        // The separate tracks are only needed for the mux
        std::fs::remove_file(&video_path)?;
        std::fs::remove_file(&audio_path)?;

        info!("Acquired combined media at {}", combined_path.display());
        Ok(())
    }
}

const AUDIO_FORMAT_SELECTOR: &str = "bestaudio[ext=m4a]/bestaudio";

/// Selector for a video-only stream at an exact height.
fn video_format_selector(resolution: &str) -> Result<String> {
    let height: u32 = resolution
        .strip_suffix('p')
        .and_then(|h| h.parse().ok())
        .ok_or_else(|| {
            ClipcastError::Config(format!(
                "Invalid resolution '{}', expected e.g. 1080p",
                resolution
            ))
        })?;
    Ok(format!(
        "bestvideo[height={}][ext=mp4]/bestvideo[height={}]",
        height, height
    ))
}

/// Map a downloader failure onto the error taxonomy.
///
/// Unresolvable assets are permanent and must not be retried; everything
/// else is assumed transient.
fn classify_downloader_failure(stderr: &str) -> ClipcastError {
    const UNAVAILABLE_MARKERS: [&str; 6] = [
        "video unavailable",
        "private video",
        "this video has been removed",
        "incomplete youtube id",
        "is not a valid url",
        "unable to extract video id",
    ];

    let detail = stderr
        .lines()
        .find(|line| line.starts_with("ERROR"))
        .unwrap_or_else(|| stderr.trim())
        .to_string();

    let lowered = stderr.to_lowercase();
    if UNAVAILABLE_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
    {
        ClipcastError::AssetUnavailable(detail)
    } else {
        ClipcastError::UpstreamService(detail)
    }
}

/// Parse the downloader's JSON document into asset metadata.
fn parse_metadata(json: &str) -> Result<AssetMetadata> {
    let document: DownloaderDocument = serde_json::from_str(json).map_err(|e| {
        ClipcastError::UpstreamService(format!("Failed to parse downloader response: {}", e))
    })?;

    let mut heights: Vec<u32> = document
        .formats
        .iter()
        .filter(|format| format.vcodec.as_deref().is_some_and(|codec| codec != "none"))
        .filter_map(|format| format.height)
        .collect();
    heights.sort_unstable();
    heights.dedup();

    let publish_date = document
        .upload_date
        .as_deref()
        .and_then(|date| NaiveDate::parse_from_str(date, UPLOAD_DATE_FORMAT).ok());

    Ok(AssetMetadata {
        asset_id: document.id,
        title: document.title,
        author: document.uploader.unwrap_or_default(),
        duration_secs: document.duration.unwrap_or_default() as u64,
        publish_date,
        resolutions: heights.into_iter().map(|h| format!("{}p", h)).collect(),
    })
}
