use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Query, State},
    routing::post,
};

use crate::{
    dto::uploads::{UploadQuery, UploadedImage},
    error::{AppError, AppResult},
    middleware::auth::AuthAdmin,
    response::ApiResponse,
    services::upload_service,
    state::AppState,
};

const FILE_FIELD: &str = "file";
/// Headroom over the image limit for multipart framing.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/images", post(upload_image))
        .layer(DefaultBodyLimit::max(max_upload_bytes + MULTIPART_OVERHEAD))
}

#[utoipa::path(
    post,
    path = "/api/uploads/images",
    params(
        ("kind" = Option<String>, Query, description = "`category` for category images")
    ),
    request_body(content_type = "multipart/form-data", description = "Image in the `file` field"),
    responses(
        (status = 200, description = "Stored image", body = ApiResponse<UploadedImage>),
        (status = 400, description = "Missing file or not an image"),
        (status = 413, description = "Image too large"),
    ),
    security(("bearer_auth" = [])),
    tag = "Uploads"
)]
pub async fn upload_image(
    State(state): State<AppState>,
    admin: AuthAdmin,
    Query(query): Query<UploadQuery>,
    mut multipart: Multipart,
) -> AppResult<Json<ApiResponse<UploadedImage>>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;

        let resp = upload_service::upload_image(
            &state,
            &admin,
            query,
            &file_name,
            content_type.as_deref(),
            &bytes,
        )
        .await?;
        return Ok(Json(resp));
    }

    Err(AppError::BadRequest(format!("missing `{FILE_FIELD}` field")))
}
