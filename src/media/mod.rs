// Media processing layer
//
// Abstraction over the stream-copy operations the pipeline needs:
// - Commands: abstract command building for the external tool
// - Processor: FFmpeg-based implementation

pub mod commands;
pub mod processor;

use async_trait::async_trait;
use std::path::Path;

pub use commands::*;
pub use processor::*;

use crate::config::MediaConfig;
use crate::error::Result;
use crate::model::TimeRange;

/// Main trait for media processing operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaProcessor: Send + Sync {
    /// Combine separate video and audio streams into one container
    /// without re-encoding.
    async fn mux(
        &self,
        video_path: &Path,
        audio_path: &Path,
        output_path: &Path,
    ) -> Result<()>;

    /// Extract a time sub-range via stream copy. On failure no file may
    /// be left at `output_path`.
    async fn trim(
        &self,
        input_path: &Path,
        output_path: &Path,
        range: &TimeRange,
    ) -> Result<()>;

    /// Check if the media tool is available
    fn check_availability(&self) -> Result<()>;
}

/// Factory for creating media processor instances
pub struct MediaProcessorFactory;

impl MediaProcessorFactory {
    /// Create the default media processor implementation (FFmpeg-based)
    pub fn create_processor(config: MediaConfig) -> Box<dyn MediaProcessor> {
        Box::new(processor::FfmpegProcessor::new(config))
    }
}
