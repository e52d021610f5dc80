use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::WorkspaceConfig;
use crate::error::Result;
use crate::model::TimeRange;

/// On-disk cache of pipeline artifacts, one working directory per asset.
///
/// Artifact names are a deterministic function of their inputs, so a step
/// whose target file already exists can be skipped. Nothing is ever
/// deleted here; directories accumulate as a cache across invocations.
pub struct Workspace {
    videos_root: PathBuf,
}

impl Workspace {
    pub fn new(config: WorkspaceConfig) -> Self {
        Self {
            videos_root: config.videos_root,
        }
    }

    /// Resolve the working directory for an asset, creating it lazily.
    pub fn working_dir(&self, asset_id: &str) -> Result<WorkingDir> {
        let path = self.videos_root.join(asset_id);
        if !path.exists() {
            debug!("Creating working directory {}", path.display());
            std::fs::create_dir_all(&path)?;
        }
        Ok(WorkingDir { path })
    }
}

/// Per-asset directory owning all intermediate and final artifacts.
pub struct WorkingDir {
    path: PathBuf,
}

impl WorkingDir {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn combined_file_name(resolution: &str) -> String {
        format!("combined_{}.mp4", resolution)
    }

    pub fn trimmed_file_name(range: &TimeRange, resolution: &str) -> String {
        format!(
            "{}_{}_{}.mp4",
            range.start_secs(),
            range.end_secs(),
            resolution
        )
    }

    pub fn video_stream_file_name(resolution: &str) -> String {
        format!("video_stream_{}.mp4", resolution)
    }

    pub fn audio_stream_file_name() -> String {
        "audio_stream.m4a".to_string()
    }

    /// Combined (muxed video+audio) artifact path.
    pub fn combined_path(&self, resolution: &str) -> PathBuf {
        self.path.join(Self::combined_file_name(resolution))
    }

    /// Trimmed artifact path for a time range.
    pub fn trimmed_path(&self, range: &TimeRange, resolution: &str) -> PathBuf {
        self.path.join(Self::trimmed_file_name(range, resolution))
    }
}
