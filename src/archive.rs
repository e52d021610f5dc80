use async_trait::async_trait;
use http::Method;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path as ObjectPath;
use object_store::signer::Signer;
use object_store::{ObjectStore, PutPayload};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::ArchiveConfig;
use crate::error::{ClipcastError, Result};

/// Durable blob storage for processed artifacts, independent of the
/// destination platform.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Upload a local file under `object_key` and return a time-limited
    /// retrieval URL.
    async fn put(&self, local_path: &Path, object_key: &str) -> Result<String>;
}

fn archive_error(detail: String) -> ClipcastError {
    ClipcastError::Archive {
        detail,
        destination_url: None,
    }
}

/// S3-backed archiver with presigned retrieval links.
pub struct S3Archiver {
    store: AmazonS3,
    bucket: String,
    expiry: Duration,
}

impl S3Archiver {
    /// Build from explicit settings on top of ambient AWS environment
    /// configuration (credentials come from the environment).
    pub fn new(config: ArchiveConfig) -> Result<Self> {
        let mut builder = AmazonS3Builder::from_env()
            .with_region(config.region.clone())
            .with_bucket_name(config.bucket.clone());

        if let Some(ref endpoint) = config.endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| ClipcastError::Config(format!("Invalid archive config: {}", e)))?;

        Ok(Self {
            store,
            bucket: config.bucket,
            expiry: Duration::from_secs(config.expiry_secs),
        })
    }
}

#[async_trait]
impl ArtifactStore for S3Archiver {
    async fn put(&self, local_path: &Path, object_key: &str) -> Result<String> {
        let data = tokio::fs::read(local_path).await.map_err(|e| {
            archive_error(format!("Failed to read {}: {}", local_path.display(), e))
        })?;
        let size = data.len();
        let location = ObjectPath::from(object_key);

        self.store
            .put(&location, PutPayload::from(data))
            .await
            .map_err(|e| {
                archive_error(format!(
                    "Failed to upload {} to bucket {}: {}",
                    object_key, self.bucket, e
                ))
            })?;

        info!(
            "Archived {} bytes to {}/{}, signing retrieval link",
            size, self.bucket, object_key
        );

        let url = self
            .store
            .signed_url(Method::GET, &location, self.expiry)
            .await
            .map_err(|e| archive_error(format!("Failed to sign retrieval URL: {}", e)))?;

        Ok(url.to_string())
    }
}
