use chrono::Utc;

use crate::{
    audit,
    dto::uploads::{UploadQuery, UploadedImage},
    error::{AppError, AppResult},
    middleware::auth::AuthAdmin,
    response::{ApiResponse, Meta},
    state::AppState,
    storage::{ObjectStorage, object_name_for_upload},
};

pub const CATEGORY_PREFIX: &str = "category-";

/// Object name prefix for the requested upload kind.
pub fn prefix_for(query: &UploadQuery) -> &'static str {
    match query.kind.as_deref() {
        Some(kind) if kind.eq_ignore_ascii_case("category") => CATEGORY_PREFIX,
        _ => "",
    }
}

pub async fn upload_image(
    state: &AppState,
    admin: &AuthAdmin,
    query: UploadQuery,
    file_name: &str,
    content_type: Option<&str>,
    bytes: &[u8],
) -> AppResult<ApiResponse<UploadedImage>> {
    if bytes.is_empty() {
        return Err(AppError::BadRequest("file is empty".into()));
    }
    if let Some(content_type) = content_type
        && !content_type.starts_with("image/")
    {
        return Err(AppError::BadRequest(format!(
            "unsupported content type {content_type}"
        )));
    }

    let name = object_name_for_upload(prefix_for(&query), file_name, Utc::now().timestamp_millis());
    state.storage.put(&name, bytes).await?;
    let url = state.storage.public_url(&name);

    audit::record(
        &state.pool,
        admin.admin_id,
        "image_upload",
        "storage",
        serde_json::json!({ "name": name, "size": bytes.len() }),
    )
    .await;

    Ok(ApiResponse::success(
        "Image uploaded",
        UploadedImage { name, url },
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_uploads_get_their_prefix() {
        let query = |kind: Option<&str>| UploadQuery {
            kind: kind.map(str::to_string),
        };
        assert_eq!(prefix_for(&query(Some("category"))), CATEGORY_PREFIX);
        assert_eq!(prefix_for(&query(Some("Category"))), CATEGORY_PREFIX);
        assert_eq!(prefix_for(&query(Some("product"))), "");
        assert_eq!(prefix_for(&query(None)), "");
    }
}
