use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::info;
use uuid::Uuid;

use super::{MediaCommandBuilder, MediaProcessor};
use crate::config::MediaConfig;
use crate::error::{ClipcastError, Result};
use crate::model::TimeRange;

/// FFmpeg-based implementation of the media processor
pub struct FfmpegProcessor {
    config: MediaConfig,
    command_builder: MediaCommandBuilder,
}

impl FfmpegProcessor {
    pub fn new(config: MediaConfig) -> Self {
        let command_builder = MediaCommandBuilder::new(&config.binary_path);

        Self {
            config,
            command_builder,
        }
    }

    /// Unique sibling of the output path the trim writes into before the
    /// final rename.
    fn staging_path(output_path: &Path) -> PathBuf {
        let file_name = output_path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "output".to_string());
        output_path.with_file_name(format!(".{}.{}.part", file_name, Uuid::new_v4()))
    }
}

#[async_trait]
impl MediaProcessor for FfmpegProcessor {
    async fn mux(
        &self,
        video_path: &Path,
        audio_path: &Path,
        output_path: &Path,
    ) -> Result<()> {
        info!(
            "Muxing {} + {} -> {}",
            video_path.display(),
            audio_path.display(),
            output_path.display()
        );

        let command = self.command_builder.mux(video_path, audio_path, output_path);
        command.execute().await?;

        info!("Mux completed");
        Ok(())
    }

    async fn trim(
        &self,
        input_path: &Path,
        output_path: &Path,
        range: &TimeRange,
    ) -> Result<()> {
        info!(
            "Trimming {} to [{}s, {}s) -> {}",
            input_path.display(),
            range.start_secs(),
            range.end_secs(),
            output_path.display()
        );

        // The tool writes into a staging file so a failure never leaves a
        // partial artifact at the output path.
        let staging = Self::staging_path(output_path);
        let command = self.command_builder.trim(input_path, &staging, range);

        if let Err(e) = command.execute().await {
            let _ = std::fs::remove_file(&staging);
            return Err(e);
        }

        if !staging.exists() {
            return Err(ClipcastError::Transformation(format!(
                "Trim produced no output for {}",
                input_path.display()
            )));
        }

        std::fs::rename(&staging, output_path).map_err(|e| {
            let _ = std::fs::remove_file(&staging);
            ClipcastError::Transformation(format!(
                "Failed to move trimmed output into place: {}",
                e
            ))
        })?;

        info!("Trim completed");
        Ok(())
    }

    fn check_availability(&self) -> Result<()> {
        let output = Command::new(&self.config.binary_path)
            .arg("-version")
            .output()
            .map_err(|e| {
                ClipcastError::Transformation(format!("Media processor not found: {}", e))
            })?;

        if output.status.success() {
            info!("Media processor is available");
            Ok(())
        } else {
            Err(ClipcastError::Transformation(
                "Media processor version check failed".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn processor(binary_path: &str) -> FfmpegProcessor {
        FfmpegProcessor::new(MediaConfig {
            binary_path: binary_path.to_string(),
        })
    }

    fn leftovers(dir: &Path) -> Vec<PathBuf> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect()
    }

    #[tokio::test]
    async fn test_failed_trim_leaves_no_output() {
        // `false` exits non-zero without writing anything
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("in.mp4");
        let output = tmp.path().join("60_120_1080p.mp4");
        std::fs::write(&input, b"not really media").unwrap();

        let range = TimeRange::new(60, 120).unwrap();
        let err = processor("false")
            .trim(&input, &output, &range)
            .await
            .unwrap_err();

        assert!(matches!(err, ClipcastError::Transformation(_)));
        assert!(!output.exists());
        assert_eq!(leftovers(tmp.path()), vec![input]);
    }

    #[tokio::test]
    async fn test_trim_with_silent_tool_leaves_no_output() {
        // `true` exits zero but produces no staging file
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("in.mp4");
        let output = tmp.path().join("0_5_720p.mp4");
        std::fs::write(&input, b"media").unwrap();

        let range = TimeRange::new(0, 5).unwrap();
        let err = processor("true")
            .trim(&input, &output, &range)
            .await
            .unwrap_err();

        assert!(matches!(err, ClipcastError::Transformation(_)));
        assert!(!output.exists());
    }

    #[test]
    fn test_staging_path_is_a_sibling() {
        let output = Path::new("/videos/abc/60_120_1080p.mp4");
        let staging = FfmpegProcessor::staging_path(output);
        assert_eq!(staging.parent(), output.parent());
        assert_ne!(staging, output);
        assert!(staging.to_string_lossy().ends_with(".part"));
    }

    #[test]
    fn test_check_availability_missing_binary() {
        let err = processor("clipcast-nonexistent-binary")
            .check_availability()
            .unwrap_err();
        assert!(matches!(err, ClipcastError::Transformation(_)));
    }
}
