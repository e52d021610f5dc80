use chrono::Local;
use tracing::info;

use crate::archive::{ArtifactStore, S3Archiver};
use crate::config::Config;
use crate::error::{ClipcastError, Result};
use crate::media::{MediaProcessor, MediaProcessorFactory};
use crate::model::{default_title, AssetMetadata, ProcessRequest, PublishResult};
use crate::platform::{
    DestinationPlatform, DestinationPlatformFactory, SourcePlatform, SourcePlatformFactory,
    SupportedPlatform,
};
use crate::workspace::{WorkingDir, Workspace};

/// Linear pipeline driver: metadata lookup, acquisition, trim, publish,
/// optional archive.
///
/// Every intermediate artifact is cached under the asset's working
/// directory by a deterministic name, so a step whose output already
/// exists is skipped. Re-invoking with identical parameters after a
/// partial failure resumes from the first incomplete step.
pub struct Pipeline {
    workspace: Workspace,
    source: Box<dyn SourcePlatform>,
    destination: Box<dyn DestinationPlatform>,
    media: Box<dyn MediaProcessor>,
    archiver: Option<Box<dyn ArtifactStore>>,
}

impl Pipeline {
    /// Wire the pipeline from configuration.
    pub fn new(config: Config) -> Result<Self> {
        let media = MediaProcessorFactory::create_processor(config.media.clone());
        media.check_availability()?;

        let source = SourcePlatformFactory::create(
            SupportedPlatform::YouTube,
            config.source.clone(),
            config.media.clone(),
        )?;
        let destination =
            DestinationPlatformFactory::create(SupportedPlatform::Vimeo, config.destination)?;

        let archiver: Option<Box<dyn ArtifactStore>> = match config.archive {
            Some(archive_config) => Some(Box::new(S3Archiver::new(archive_config)?)),
            None => None,
        };

        Ok(Self {
            workspace: Workspace::new(config.workspace),
            source,
            destination,
            media,
            archiver,
        })
    }

    /// Wire the pipeline from already-constructed collaborators.
    pub fn from_parts(
        workspace: Workspace,
        source: Box<dyn SourcePlatform>,
        destination: Box<dyn DestinationPlatform>,
        media: Box<dyn MediaProcessor>,
        archiver: Option<Box<dyn ArtifactStore>>,
    ) -> Self {
        Self {
            workspace,
            source,
            destination,
            media,
            archiver,
        }
    }

    /// Resolve asset metadata through the source platform.
    pub async fn metadata(&self, asset_id: &str) -> Result<AssetMetadata> {
        self.source.metadata(asset_id).await
    }

    /// Run the full pipeline for one request.
    pub async fn process(&self, request: ProcessRequest) -> Result<PublishResult> {
        // Required wiring is validated before any I/O is attempted
        self.destination.ensure_configured()?;
        if request.archive && self.archiver.is_none() {
            return Err(ClipcastError::UnsetConfiguration(
                "archive requested but no archive storage is configured".to_string(),
            ));
        }

        let title = match request.title {
            Some(ref title) if !title.is_empty() => title.clone(),
            _ => default_title(Local::now().date_naive()),
        };

        let dir = self.workspace.working_dir(&request.asset_id)?;

        let combined_file_name = WorkingDir::combined_file_name(&request.resolution);
        let combined = dir.combined_path(&request.resolution);
        if combined.exists() {
            info!(
                "Combined artifact {} already cached, skipping acquisition",
                combined.display()
            );
        } else {
            self.source
                .acquire(
                    &request.asset_id,
                    &request.resolution,
                    dir.path(),
                    &combined_file_name,
                )
                .await?;
            if !combined.exists() {
                return Err(ClipcastError::UpstreamService(format!(
                    "Acquisition did not produce {}",
                    combined.display()
                )));
            }
        }

        let trimmed = dir.trimmed_path(&request.range, &request.resolution);
        if trimmed.exists() {
            info!(
                "Trimmed artifact {} already cached, skipping trim",
                trimmed.display()
            );
        } else {
            self.media.trim(&combined, &trimmed, &request.range).await?;
        }

        let destination_url = self
            .destination
            .publish(&trimmed, &title, request.thumbnail_path.clone())
            .await?;

        let archive_url = match (&self.archiver, request.archive) {
            (Some(archiver), true) => {
                let object_key = format!(
                    "{}_{}_{}_{}",
                    request.asset_id,
                    request.range.start_secs(),
                    request.range.end_secs(),
                    request.resolution
                );
                let url = archiver
                    .put(&trimmed, &object_key)
                    .await
                    .map_err(|e| match e {
                        // The publish already succeeded; keep its URL with the error
                        ClipcastError::Archive { detail, .. } => ClipcastError::Archive {
                            detail,
                            destination_url: Some(destination_url.clone()),
                        },
                        other => other,
                    })?;
                Some(url)
            }
            _ => None,
        };

        info!("Pipeline completed, published to {}", destination_url);

        Ok(PublishResult {
            destination_url: Some(destination_url),
            archive_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::MockArtifactStore;
    use crate::config::WorkspaceConfig;
    use crate::media::MockMediaProcessor;
    use crate::model::TimeRange;
    use crate::platform::{MockDestinationPlatform, MockSourcePlatform};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const ASSET_ID: &str = "XsX3ATc3FbA";
    const DESTINATION_URL: &str = "https://vimeo.com/123456789";

    fn request(archive: bool) -> ProcessRequest {
        ProcessRequest {
            asset_id: ASSET_ID.to_string(),
            range: TimeRange::new(60, 120).unwrap(),
            resolution: "1080p".to_string(),
            title: Some("Weekly clip".to_string()),
            thumbnail_path: None,
            archive,
        }
    }

    fn workspace(tmp: &tempfile::TempDir) -> Workspace {
        Workspace::new(WorkspaceConfig {
            videos_root: tmp.path().to_path_buf(),
        })
    }

    /// Source double whose acquisition writes the combined artifact.
    fn acquiring_source(times: usize) -> MockSourcePlatform {
        let mut source = MockSourcePlatform::new();
        source
            .expect_acquire()
            .times(times)
            .returning(|_, _, dest_dir, combined_file_name| {
                std::fs::write(dest_dir.join(combined_file_name), b"combined media").unwrap();
                Ok(())
            });
        source
    }

    /// Media double whose trim writes the trimmed artifact.
    fn trimming_media(times: usize) -> MockMediaProcessor {
        let mut media = MockMediaProcessor::new();
        media
            .expect_trim()
            .times(times)
            .returning(|_, output_path, _| {
                std::fs::write(output_path, b"trimmed media").unwrap();
                Ok(())
            });
        media
    }

    fn configured_destination() -> MockDestinationPlatform {
        let mut destination = MockDestinationPlatform::new();
        destination.expect_ensure_configured().returning(|| Ok(()));
        destination
    }

    #[tokio::test]
    async fn test_process_happy_path() {
        let tmp = tempfile::tempdir().unwrap();
        let source = acquiring_source(1);
        let media = trimming_media(1);

        let mut destination = configured_destination();
        destination
            .expect_publish()
            .times(1)
            .withf(|path, title, thumbnail| {
                path.ends_with("60_120_1080p.mp4") && title == "Weekly clip" && thumbnail.is_none()
            })
            .returning(|_, _, _| Ok(DESTINATION_URL.to_string()));

        let pipeline = Pipeline::from_parts(
            workspace(&tmp),
            Box::new(source),
            Box::new(destination),
            Box::new(media),
            None,
        );

        let result = pipeline.process(request(false)).await.unwrap();
        assert_eq!(result.destination_url.as_deref(), Some(DESTINATION_URL));
        assert!(result.archive_url.is_none());

        // Artifacts live under the asset's working directory
        let dir = tmp.path().join(ASSET_ID);
        assert!(dir.join("combined_1080p.mp4").exists());
        assert!(dir.join("60_120_1080p.mp4").exists());
    }

    #[tokio::test]
    async fn test_second_run_with_identical_parameters_reuses_artifacts() {
        let tmp = tempfile::tempdir().unwrap();
        // Exactly one acquisition and one trim across both runs
        let source = acquiring_source(1);
        let media = trimming_media(1);

        let mut destination = configured_destination();
        destination
            .expect_publish()
            .times(2)
            .returning(|_, _, _| Ok(DESTINATION_URL.to_string()));

        let pipeline = Pipeline::from_parts(
            workspace(&tmp),
            Box::new(source),
            Box::new(destination),
            Box::new(media),
            None,
        );

        pipeline.process(request(false)).await.unwrap();
        let result = pipeline.process(request(false)).await.unwrap();
        assert_eq!(result.destination_url.as_deref(), Some(DESTINATION_URL));
    }

    #[tokio::test]
    async fn test_publish_failure_is_resumable_without_rework() {
        let tmp = tempfile::tempdir().unwrap();
        let source = acquiring_source(1);
        let media = trimming_media(1);

        let mut destination = configured_destination();
        let publish_calls = AtomicUsize::new(0);
        destination
            .expect_publish()
            .times(2)
            .returning(move |_, _, _| {
                if publish_calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(ClipcastError::Publish("HTTP 500 from upstream".to_string()))
                } else {
                    Ok(DESTINATION_URL.to_string())
                }
            });

        let pipeline = Pipeline::from_parts(
            workspace(&tmp),
            Box::new(source),
            Box::new(destination),
            Box::new(media),
            None,
        );

        let err = pipeline.process(request(false)).await.unwrap_err();
        assert!(matches!(err, ClipcastError::Publish(_)));

        // Retry proceeds directly to publish
        let result = pipeline.process(request(false)).await.unwrap();
        assert_eq!(result.destination_url.as_deref(), Some(DESTINATION_URL));
    }

    #[tokio::test]
    async fn test_unset_destination_fails_before_any_io() {
        let tmp = tempfile::tempdir().unwrap();
        let source = acquiring_source(0);
        let media = trimming_media(0);

        let mut destination = MockDestinationPlatform::new();
        destination.expect_ensure_configured().returning(|| {
            Err(ClipcastError::UnsetConfiguration(
                "destination credential is not set".to_string(),
            ))
        });

        let pipeline = Pipeline::from_parts(
            workspace(&tmp),
            Box::new(source),
            Box::new(destination),
            Box::new(media),
            None,
        );

        let err = pipeline.process(request(false)).await.unwrap_err();
        assert!(matches!(err, ClipcastError::UnsetConfiguration(_)));
        assert!(!tmp.path().join(ASSET_ID).exists());
    }

    #[tokio::test]
    async fn test_archive_without_archiver_fails_before_any_io() {
        let tmp = tempfile::tempdir().unwrap();
        let source = acquiring_source(0);
        let media = trimming_media(0);
        let destination = configured_destination();

        let pipeline = Pipeline::from_parts(
            workspace(&tmp),
            Box::new(source),
            Box::new(destination),
            Box::new(media),
            None,
        );

        let err = pipeline.process(request(true)).await.unwrap_err();
        assert!(matches!(err, ClipcastError::UnsetConfiguration(_)));
        assert!(!tmp.path().join(ASSET_ID).exists());
    }

    #[tokio::test]
    async fn test_missing_title_synthesizes_dated_default() {
        let tmp = tempfile::tempdir().unwrap();
        let source = acquiring_source(1);
        let media = trimming_media(1);

        let mut destination = configured_destination();
        destination
            .expect_publish()
            .times(1)
            .withf(|_, title, _| title.starts_with("Clip ") && title.contains('/'))
            .returning(|_, _, _| Ok(DESTINATION_URL.to_string()));

        let pipeline = Pipeline::from_parts(
            workspace(&tmp),
            Box::new(source),
            Box::new(destination),
            Box::new(media),
            None,
        );

        let mut request = request(false);
        request.title = None;
        pipeline.process(request).await.unwrap();
    }

    #[tokio::test]
    async fn test_archive_step_returns_retrieval_url() {
        let tmp = tempfile::tempdir().unwrap();
        let source = acquiring_source(1);
        let media = trimming_media(1);

        let mut destination = configured_destination();
        destination
            .expect_publish()
            .times(1)
            .returning(|_, _, _| Ok(DESTINATION_URL.to_string()));

        let mut archiver = MockArtifactStore::new();
        archiver
            .expect_put()
            .times(1)
            .withf(|path, object_key| {
                path.ends_with("60_120_1080p.mp4") && object_key == "XsX3ATc3FbA_60_120_1080p"
            })
            .returning(|_, _| Ok("https://bucket.s3.amazonaws.com/signed".to_string()));

        let pipeline = Pipeline::from_parts(
            workspace(&tmp),
            Box::new(source),
            Box::new(destination),
            Box::new(media),
            Some(Box::new(archiver)),
        );

        let result = pipeline.process(request(true)).await.unwrap();
        assert_eq!(result.destination_url.as_deref(), Some(DESTINATION_URL));
        assert_eq!(
            result.archive_url.as_deref(),
            Some("https://bucket.s3.amazonaws.com/signed")
        );
    }

    #[tokio::test]
    async fn test_archive_failure_keeps_destination_url() {
        let tmp = tempfile::tempdir().unwrap();
        let source = acquiring_source(1);
        let media = trimming_media(1);

        let mut destination = configured_destination();
        destination
            .expect_publish()
            .times(1)
            .returning(|_, _, _| Ok(DESTINATION_URL.to_string()));

        let mut archiver = MockArtifactStore::new();
        archiver.expect_put().times(1).returning(|_, _| {
            Err(ClipcastError::Archive {
                detail: "bucket gone".to_string(),
                destination_url: None,
            })
        });

        let pipeline = Pipeline::from_parts(
            workspace(&tmp),
            Box::new(source),
            Box::new(destination),
            Box::new(media),
            Some(Box::new(archiver)),
        );

        let err = pipeline.process(request(true)).await.unwrap_err();
        match err {
            ClipcastError::Archive {
                destination_url, ..
            } => assert_eq!(destination_url.as_deref(), Some(DESTINATION_URL)),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_metadata_passthrough() {
        let tmp = tempfile::tempdir().unwrap();
        let mut source = MockSourcePlatform::new();
        source.expect_metadata().times(1).returning(|asset_id| {
            Ok(AssetMetadata {
                asset_id: asset_id.to_string(),
                title: "Baby Shark Dance".to_string(),
                author: "Pinkfong".to_string(),
                duration_secs: 136,
                publish_date: None,
                resolutions: vec!["720p".to_string(), "1080p".to_string()],
            })
        });

        let pipeline = Pipeline::from_parts(
            workspace(&tmp),
            Box::new(source),
            Box::new(configured_destination()),
            Box::new(MockMediaProcessor::new()),
            None,
        );

        let metadata = pipeline.metadata(ASSET_ID).await.unwrap();
        assert_eq!(metadata.asset_id, ASSET_ID);
        assert_eq!(metadata.resolutions.len(), 2);
    }
}
