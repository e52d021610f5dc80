use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClipcastError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Required configuration is not set: {0}")]
    UnsetConfiguration(String),

    #[error("Asset is unavailable: {0}")]
    AssetUnavailable(String),

    #[error("Upstream service error: {0}")]
    UpstreamService(String),

    #[error("Media transformation failed: {0}")]
    Transformation(String),

    #[error("Publish failed: {0}")]
    Publish(String),

    #[error("Archive upload failed: {detail}")]
    Archive {
        detail: String,
        /// Publish URL already obtained before the archive step failed.
        destination_url: Option<String>,
    },
}

pub type Result<T> = std::result::Result<T, ClipcastError>;
