use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UploadQuery {
    /// Set to `category` for category images.
    pub kind: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadedImage {
    /// Object name to store on the product or category.
    pub name: String,
    pub url: String,
}
