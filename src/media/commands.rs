use std::path::Path;
use std::process::Command;
use tracing::debug;

use crate::error::{ClipcastError, Result};
use crate::model::TimeRange;

/// Abstract media processing command representation
#[derive(Debug, Clone)]
pub struct MediaCommand {
    pub binary_path: String,
    pub args: Vec<String>,
    pub description: String,
}

impl MediaCommand {
    /// Create a new media processing command
    pub fn new<S1: Into<String>, S2: Into<String>>(binary_path: S1, description: S2) -> Self {
        Self {
            binary_path: binary_path.into(),
            args: Vec::new(),
            description: description.into(),
        }
    }

    /// Add an argument
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add input file
    pub fn input<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg("-i").arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Add output file
    pub fn output<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Force overwrite output
    pub fn overwrite(self) -> Self {
        self.arg("-y")
    }

    /// Set video codec
    pub fn video_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:v").arg(codec)
    }

    /// Set audio codec
    pub fn audio_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:a").arg(codec)
    }

    /// Copy video stream
    pub fn copy_video(self) -> Self {
        self.video_codec("copy")
    }

    /// Copy audio stream
    pub fn copy_audio(self) -> Self {
        self.audio_codec("copy")
    }

    /// Seek to a start offset in seconds
    pub fn seek(self, start_secs: u64) -> Self {
        self.arg("-ss").arg(start_secs.to_string())
    }

    /// Stop writing at an end offset in seconds
    pub fn until(self, end_secs: u64) -> Self {
        self.arg("-to").arg(end_secs.to_string())
    }

    /// Execute the command
    pub async fn execute(&self) -> Result<()> {
        debug!(
            "Executing media processing command: {} {:?}",
            self.binary_path, self.args
        );
        debug!("Description: {}", self.description);

        let mut cmd = Command::new(&self.binary_path);
        cmd.args(&self.args);

        let output = cmd.output().map_err(|e| {
            ClipcastError::Transformation(format!("Failed to execute media processor: {}", e))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ClipcastError::Transformation(format!(
                "{} failed: {}",
                self.description, stderr
            )));
        }

        Ok(())
    }
}

/// Builder for the stream-copy operations the pipeline performs
pub struct MediaCommandBuilder {
    binary_path: String,
}

impl MediaCommandBuilder {
    /// Create a new command builder
    pub fn new<S: Into<String>>(binary_path: S) -> Self {
        Self {
            binary_path: binary_path.into(),
        }
    }

    /// Build a stream-copy mux of separate video and audio tracks
    pub fn mux<P: AsRef<Path>>(
        &self,
        video_path: P,
        audio_path: P,
        output_path: P,
    ) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Stream mux")
            .overwrite()
            .input(video_path)
            .input(audio_path)
            .copy_video()
            .copy_audio()
            .output(output_path)
    }

    /// Build a stream-copy trim of `[start, end)`
    pub fn trim<P: AsRef<Path>>(
        &self,
        input_path: P,
        output_path: P,
        range: &TimeRange,
    ) -> MediaCommand {
        MediaCommand::new(
            &self.binary_path,
            format!(
                "Stream trim [{}s, {}s)",
                range.start_secs(),
                range.end_secs()
            ),
        )
        .overwrite()
        .input(input_path)
        .seek(range.start_secs())
        .until(range.end_secs())
        .copy_video()
        .copy_audio()
        .output(output_path)
    }

    /// Build version check command
    pub fn version_check(&self) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Version check").arg("-version")
    }
}
