// Platform capability layer
//
// Source and destination roles are separate traits; a platform may
// implement either or both. The set of platforms is closed and known at
// compile time:
// - YouTube: source role (metadata + acquisition)
// - Vimeo: destination role (publish)

pub mod vimeo;
pub mod youtube;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::config::{DestinationConfig, MediaConfig, SourceConfig};
use crate::error::{ClipcastError, Result};
use crate::model::{AssetMetadata, Credential};

/// Source role: resolve asset metadata and acquire media streams.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SourcePlatform: Send + Sync {
    /// Resolve an asset id to its metadata.
    ///
    /// Fails with `AssetUnavailable` when the id does not resolve to a
    /// usable asset (non-retryable) and `UpstreamService` on transport
    /// or parse failures (retryable).
    async fn metadata(&self, asset_id: &str) -> Result<AssetMetadata>;

    /// Acquire the asset's media at the requested resolution, leaving a
    /// single combined video+audio file at `dest_dir/combined_file_name`.
    ///
    /// When the source exposes separate tracks this operation muxes them
    /// (stream copy) and removes the intermediate stream files.
    async fn acquire(
        &self,
        asset_id: &str,
        resolution: &str,
        dest_dir: &Path,
        combined_file_name: &str,
    ) -> Result<()>;
}

/// Destination role: publish a local file.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DestinationPlatform: Send + Sync {
    /// Fail with `UnsetConfiguration` unless the platform holds a usable
    /// credential. Checked by the driver before any I/O is attempted.
    fn ensure_configured(&self) -> Result<()>;

    /// Replace the held credential triple without reconstructing the
    /// pipeline. Must not be called while a publish is in flight.
    fn update_credentials(&self, credential: Credential);

    /// Upload the file, set its title, and activate the thumbnail image
    /// when one is supplied. Returns the public URL of the published
    /// asset.
    async fn publish(
        &self,
        local_path: &Path,
        title: &str,
        thumbnail_path: Option<PathBuf>,
    ) -> Result<String>;
}

/// Closed set of platforms known at compile time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupportedPlatform {
    YouTube,
    Vimeo,
}

impl FromStr for SupportedPlatform {
    type Err = ClipcastError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "youtube" => Ok(SupportedPlatform::YouTube),
            "vimeo" => Ok(SupportedPlatform::Vimeo),
            other => Err(ClipcastError::Config(format!(
                "Unsupported platform '{}'. Valid platforms: youtube, vimeo",
                other
            ))),
        }
    }
}

/// Factory for source-role platform instances
pub struct SourcePlatformFactory;

impl SourcePlatformFactory {
    pub fn create(
        platform: SupportedPlatform,
        config: SourceConfig,
        media: MediaConfig,
    ) -> Result<Box<dyn SourcePlatform>> {
        match platform {
            SupportedPlatform::YouTube => {
                Ok(Box::new(youtube::YouTubeSource::new(config, media)))
            }
            SupportedPlatform::Vimeo => Err(ClipcastError::Config(
                "Vimeo does not implement the source role".to_string(),
            )),
        }
    }
}

/// Factory for destination-role platform instances
pub struct DestinationPlatformFactory;

impl DestinationPlatformFactory {
    pub fn create(
        platform: SupportedPlatform,
        config: DestinationConfig,
    ) -> Result<Box<dyn DestinationPlatform>> {
        match platform {
            SupportedPlatform::Vimeo => Ok(Box::new(vimeo::VimeoDestination::new(config))),
            SupportedPlatform::YouTube => Err(ClipcastError::Config(
                "YouTube does not implement the destination role".to_string(),
            )),
        }
    }
}
