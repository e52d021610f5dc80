use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ClipcastError, Result};
use crate::model::Credential;

fn default_archive_expiry_secs() -> u64 {
    6 * 3600
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub workspace: WorkspaceConfig,
    pub source: SourceConfig,
    pub destination: DestinationConfig,
    pub media: MediaConfig,
    /// Optional durable archive; the archive step is unavailable without it.
    pub archive: Option<ArchiveConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Root directory holding one working directory per asset id.
    pub videos_root: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Path to the downloader binary (e.g. yt-dlp)
    pub binary_path: String,
    /// Watch-URL prefix the asset id is appended to
    pub watch_url_prefix: String,
    /// Cache directory handed to the downloader
    pub cache_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestinationConfig {
    /// API endpoint of the destination platform
    pub api_endpoint: String,
    /// Pre-issued access token
    pub access_token: String,
    /// Client id of the registered application
    pub client_id: String,
    /// Client secret of the registered application
    pub client_secret: String,
}

impl DestinationConfig {
    /// Build the credential triple, failing when any part is missing.
    pub fn credential(&self) -> Result<Credential> {
        if self.access_token.is_empty() {
            return Err(ClipcastError::UnsetConfiguration(
                "access_token is missing from destination config".to_string(),
            ));
        }
        if self.client_id.is_empty() {
            return Err(ClipcastError::UnsetConfiguration(
                "client_id is missing from destination config".to_string(),
            ));
        }
        if self.client_secret.is_empty() {
            return Err(ClipcastError::UnsetConfiguration(
                "client_secret is missing from destination config".to_string(),
            ));
        }
        Ok(Credential {
            token: self.access_token.clone(),
            key: self.client_id.clone(),
            secret: self.client_secret.clone(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Path to ffmpeg binary
    pub binary_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Bucket the trimmed artifacts are archived into
    pub bucket: String,
    /// Region of the bucket
    pub region: String,
    /// Custom endpoint for S3-compatible providers (e.g. MinIO)
    pub endpoint_url: Option<String>,
    /// Lifetime of generated retrieval links
    #[serde(default = "default_archive_expiry_secs")]
    pub expiry_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        let app_dir = std::env::current_dir()
            .unwrap_or_default()
            .join(".clipcast");

        Self {
            workspace: WorkspaceConfig {
                videos_root: app_dir.join("videos"),
            },
            source: SourceConfig {
                binary_path: "yt-dlp".to_string(),
                watch_url_prefix: "https://www.youtube.com/watch?v=".to_string(),
                cache_dir: app_dir.join("downloader-cache"),
            },
            destination: DestinationConfig {
                api_endpoint: "https://api.vimeo.com".to_string(),
                access_token: String::new(),
                client_id: String::new(),
                client_secret: String::new(),
            },
            media: MediaConfig {
                binary_path: "ffmpeg".to_string(),
            },
            archive: None,
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ClipcastError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| ClipcastError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ClipcastError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| ClipcastError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }
}
