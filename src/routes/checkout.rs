use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::checkout::{CheckoutRequest, CheckoutSummary},
    error::AppResult,
    response::ApiResponse,
    services::checkout_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(checkout))
}

#[utoipa::path(
    post,
    path = "/api/checkout",
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Priced cart and WhatsApp link", body = ApiResponse<CheckoutSummary>),
        (status = 400, description = "Empty cart, bad quantity or unknown product"),
    ),
    tag = "Checkout"
)]
pub async fn checkout(
    State(state): State<AppState>,
    Json(payload): Json<CheckoutRequest>,
) -> AppResult<Json<ApiResponse<CheckoutSummary>>> {
    let resp = checkout_service::checkout(&state, payload).await?;
    Ok(Json(resp))
}
