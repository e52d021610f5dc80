use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{ClipcastError, Result};

/// Metadata resolved for a source-platform asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetMetadata {
    pub asset_id: String,
    pub title: String,
    pub author: String,
    pub duration_secs: u64,
    pub publish_date: Option<NaiveDate>,
    /// Resolutions the source exposes, deduplicated and sorted ascending
    /// by numeric height (e.g. "360p" before "1080p").
    pub resolutions: Vec<String>,
}

/// Half-open trim range `[start_secs, end_secs)` in whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    start_secs: u64,
    end_secs: u64,
}

impl TimeRange {
    pub fn new(start_secs: u64, end_secs: u64) -> Result<Self> {
        if end_secs <= start_secs {
            return Err(ClipcastError::Config(format!(
                "End time {}s must be after start time {}s",
                end_secs, start_secs
            )));
        }
        Ok(Self {
            start_secs,
            end_secs,
        })
    }

    /// Parse a range from two `hh:mm:ss` wall-clock timestamps.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Self::new(parse_timestamp(start)?, parse_timestamp(end)?)
    }

    pub fn start_secs(&self) -> u64 {
        self.start_secs
    }

    pub fn end_secs(&self) -> u64 {
        self.end_secs
    }

    pub fn duration_secs(&self) -> u64 {
        self.end_secs - self.start_secs
    }
}

/// Parse an `hh:mm:ss` timestamp into seconds.
pub fn parse_timestamp(time_str: &str) -> Result<u64> {
    let parts: Vec<&str> = time_str.split(':').collect();
    if parts.len() != 3 {
        return Err(ClipcastError::Config(format!(
            "Invalid timestamp '{}', expected hh:mm:ss",
            time_str
        )));
    }

    let mut fields = [0u64; 3];
    for (i, part) in parts.iter().enumerate() {
        fields[i] = part.parse::<u64>().map_err(|_| {
            ClipcastError::Config(format!(
                "Invalid timestamp '{}', component '{}' is not a number",
                time_str, part
            ))
        })?;
    }

    Ok(fields[0] * 3600 + fields[1] * 60 + fields[2])
}

/// Pre-issued credential triple held by a destination platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    pub token: String,
    pub key: String,
    pub secret: String,
}

/// One pipeline invocation, fully validated by the adapter layer.
#[derive(Debug, Clone)]
pub struct ProcessRequest {
    pub asset_id: String,
    pub range: TimeRange,
    pub resolution: String,
    pub title: Option<String>,
    pub thumbnail_path: Option<PathBuf>,
    pub archive: bool,
}

/// Outcome of a pipeline invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishResult {
    pub destination_url: Option<String>,
    pub archive_url: Option<String>,
}

/// Synthesize the default clip title for a publish date.
pub fn default_title(date: NaiveDate) -> String {
    format!("Clip {}", date.format("%m/%d/%y"))
}
