use std::path::{Path, PathBuf};

use anyhow::Result;
use axum::extract::multipart::Field;
use futures_util::StreamExt;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{error, info, warn};

use super::dto::UploadResponse;
use super::events::{TranscodeJob, TRANSCODE_QUEUE};
use super::player;
use super::repository::VideoRepository;
use crate::common::artifacts::{ArtifactError, ArtifactStore};
use crate::common::slug;
use crate::state::AppState;

/// Slug collisions are vanishingly rare; a couple of retries is plenty before
/// declaring the namespace unusable.
const SLUG_ATTEMPTS: usize = 3;

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("could not allocate an artifact directory after {SLUG_ATTEMPTS} attempts")]
    NamespaceExhausted,
    #[error("upload stream interrupted: {0}")]
    Stream(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("metadata store error: {0}")]
    Store(anyhow::Error),
    #[error("failed to enqueue transcode job: {0}")]
    Queue(anyhow::Error),
}

/// A raw upload parked in its own artifact subtree, not yet tracked by the
/// metadata store.
pub struct StoredUpload {
    pub slug: String,
    pub title: String,
    pub raw_path: PathBuf,
    pub folder_path: String,
}

pub struct VideoService;

impl VideoService {
    /// Original filename minus its final extension.
    pub fn title_from_filename(filename: &str) -> String {
        let name = Path::new(filename)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(filename);
        match Path::new(name).file_stem().and_then(|s| s.to_str()) {
            Some(stem) if !stem.is_empty() => stem.to_string(),
            _ => name.to_string(),
        }
    }

    fn allocate_namespace(artifacts: &ArtifactStore) -> Result<(String, PathBuf), IntakeError> {
        for _ in 0..SLUG_ATTEMPTS {
            let candidate = slug::generate();
            match artifacts.create_new(&candidate) {
                Ok(dir) => return Ok((candidate, dir)),
                Err(ArtifactError::Collision { slug }) => {
                    warn!("Slug collision on '{}', retrying", slug);
                }
                Err(ArtifactError::Io(e)) => return Err(e.into()),
            }
        }
        Err(IntakeError::NamespaceExhausted)
    }

    /// Streams the file field into a freshly allocated subtree. The directory
    /// is torn down again if the stream dies halfway, so no half-written
    /// upload survives intake.
    pub async fn store_upload(
        artifacts: &ArtifactStore,
        mut field: Field<'_>,
        original_filename: &str,
    ) -> Result<StoredUpload, IntakeError> {
        let (slug, dir) = Self::allocate_namespace(artifacts)?;
        let raw_path = artifacts.raw_path(&slug, original_filename);

        let result: Result<(), IntakeError> = async {
            let mut file = tokio::fs::File::create(&raw_path).await?;
            while let Some(chunk) = field.next().await {
                let chunk = chunk.map_err(|e| IntakeError::Stream(e.to_string()))?;
                file.write_all(&chunk).await?;
            }
            file.flush().await?;
            Ok(())
        }
        .await;

        if let Err(e) = result {
            error!("Upload for '{}' aborted: {}", slug, e);
            if let Err(cleanup) = artifacts.remove(&slug) {
                warn!("Could not clean up aborted upload '{}': {}", slug, cleanup);
            }
            return Err(e);
        }

        Ok(StoredUpload {
            title: Self::title_from_filename(original_filename),
            folder_path: dir.to_string_lossy().to_string(),
            slug,
            raw_path,
        })
    }

    /// Creates the job record and persists the launch intent on the durable
    /// queue, in that order, before the caller builds its response. Create
    /// failure rolls the subtree back; publish failure fails the record so it
    /// cannot sit in PROCESSING with no work ever arriving.
    pub async fn complete_intake(
        state: &AppState,
        owner_id: &str,
        upload: StoredUpload,
    ) -> Result<UploadResponse, IntakeError> {
        let video = match VideoRepository::create(
            &state.db,
            owner_id,
            &upload.title,
            &upload.slug,
            &upload.folder_path,
        )
        .await
        {
            Ok(v) => v,
            Err(e) => {
                // Nothing references the subtree without a record; drop it.
                if let Err(cleanup) = state.artifacts.remove(&upload.slug) {
                    warn!(
                        "Could not clean up orphan directory '{}': {}",
                        upload.slug, cleanup
                    );
                }
                return Err(IntakeError::Store(e));
            }
        };

        let job = TranscodeJob {
            slug: video.slug.clone(),
            input_path: upload.raw_path.to_string_lossy().to_string(),
        };
        let payload = serde_json::to_vec(&job)
            .map_err(|e| IntakeError::Queue(anyhow::Error::new(e)))?;

        if let Err(e) = state.queue.publish(TRANSCODE_QUEUE, &payload).await {
            error!("Failed to enqueue transcode for {}: {}", video.slug, e);
            if let Err(mark) = VideoRepository::mark_failed(&state.db, &video.slug).await {
                error!(
                    "Could not fail stranded job {} after publish error: {}",
                    video.slug, mark
                );
            }
            return Err(IntakeError::Queue(e));
        }

        info!("Accepted upload '{}' as {}", upload.title, video.slug);
        Ok(UploadResponse { slug: video.slug })
    }

    /// Resolves a slug to its embed page. Anything that is not a READY job
    /// resolves to None, so viewers cannot distinguish missing, in-flight and
    /// failed videos.
    pub async fn resolve_playback(state: &AppState, slug: &str) -> Result<Option<String>> {
        let Some(video) = VideoRepository::find_by_slug(&state.db, slug).await? else {
            return Ok(None);
        };
        if !video.is_ready() {
            return Ok(None);
        }

        let manifest = player::manifest_url(&state.config.public_domain, slug);
        Ok(Some(player::embed_page(&manifest)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_strips_the_final_extension_only() {
        assert_eq!(VideoService::title_from_filename("sample.mp4"), "sample");
        assert_eq!(
            VideoService::title_from_filename("holiday.2024.mkv"),
            "holiday.2024"
        );
    }

    #[test]
    fn title_survives_odd_filenames() {
        assert_eq!(VideoService::title_from_filename("noext"), "noext");
        assert_eq!(
            VideoService::title_from_filename("/tmp/path/clip.webm"),
            "clip"
        );
    }
}
