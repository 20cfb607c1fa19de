use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::video::handler::upload_video,
        crate::modules::video::handler::playback_page,
    ),
    components(
        schemas(
            crate::modules::video::dto::UploadResponse,
        )
    ),
    tags(
        (name = "Videos", description = "Video upload and playback")
    )
)]
pub struct ApiDoc;
