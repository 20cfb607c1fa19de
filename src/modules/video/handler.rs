use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    Json,
};
use tracing::{error, info};

use crate::common::response::ApiError;
use crate::modules::video::dto::UploadResponse;
use crate::modules::video::service::{IntakeError, StoredUpload, VideoService};
use crate::state::AppState;

/// Upload a video for HLS packaging.
/// The response carries the public slug as soon as the job is durably
/// accepted; transcoding continues in the background.
#[utoipa::path(
    post,
    path = "/upload",
    request_body(content = String, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Upload accepted, transcode queued", body = UploadResponse),
        (status = 400, description = "Missing file or owner field"),
        (status = 500, description = "Metadata store or queue failure")
    ),
    tag = "Videos"
)]
pub async fn upload_video(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let mut owner: Option<String> = None;
    let mut stored: Option<StoredUpload> = None;

    while let Some(field) = multipart.next_field().await.unwrap_or(None) {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "owner" => {
                owner = field
                    .text()
                    .await
                    .ok()
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty());
            }
            "video" => {
                let file_name = field.file_name().unwrap_or("video.mp4").to_string();
                info!("Receiving upload: {}", file_name);

                match VideoService::store_upload(&state.artifacts, field, &file_name).await {
                    Ok(upload) => stored = Some(upload),
                    Err(e) => {
                        error!("Failed to store upload: {}", e);
                        return ApiError(
                            "Failed to store upload".to_string(),
                            StatusCode::INTERNAL_SERVER_ERROR,
                        )
                        .into_response();
                    }
                }
            }
            _ => {}
        }
    }

    // Both fields are required. If the file landed but the owner never showed
    // up, the subtree is rolled back so the rejected request leaves nothing
    // behind.
    let (owner, upload) = match (owner, stored) {
        (Some(owner), Some(upload)) => (owner, upload),
        (_, maybe_upload) => {
            if let Some(upload) = maybe_upload {
                let _ = state.artifacts.remove(&upload.slug);
            }
            return ApiError(
                "Missing file or owner".to_string(),
                StatusCode::BAD_REQUEST,
            )
            .into_response();
        }
    };

    match VideoService::complete_intake(&state, &owner, upload).await {
        Ok(res) => (StatusCode::OK, Json(res)).into_response(),
        Err(e @ IntakeError::Store(_)) => {
            error!("Upload intake failed: {}", e);
            ApiError("Database error".to_string(), StatusCode::INTERNAL_SERVER_ERROR)
                .into_response()
        }
        Err(e) => {
            error!("Upload intake failed: {}", e);
            ApiError("Upload failed".to_string(), StatusCode::INTERNAL_SERVER_ERROR)
                .into_response()
        }
    }
}

/// Embed page for iframe usage.
/// Not-found, still-processing and failed jobs all answer 404, so the page
/// leaks nothing about jobs that are not publicly playable.
#[utoipa::path(
    get,
    path = "/playback/{slug}",
    params(
        ("slug" = String, Path, description = "Public video identifier")
    ),
    responses(
        (status = 200, description = "HTML player page"),
        (status = 404, description = "Video not available")
    ),
    tag = "Videos"
)]
pub async fn playback_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> impl IntoResponse {
    match VideoService::resolve_playback(&state, &slug).await {
        Ok(Some(html)) => Html(html).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "Video not available").into_response(),
        Err(e) => {
            error!("Playback lookup failed for {}: {}", slug, e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
