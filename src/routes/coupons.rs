use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post, put},
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    dto::coupons::{CouponList, CouponRequest, CouponValidation, ValidateCouponRequest},
    error::AppResult,
    middleware::auth::AuthAdmin,
    models::Coupon,
    response::ApiResponse,
    routes::params::Pagination,
    services::coupon_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_coupons).post(create_coupon))
        .route("/validate", post(validate_coupon))
        .route("/{id}", put(update_coupon).delete(delete_coupon))
}

#[utoipa::path(
    post,
    path = "/api/coupons/validate",
    request_body = ValidateCouponRequest,
    responses(
        (status = 200, description = "Validation outcome; `applied` also claims one use", body = ApiResponse<CouponValidation>),
        (status = 400, description = "Empty code"),
    ),
    tag = "Coupons"
)]
pub async fn validate_coupon(
    State(state): State<AppState>,
    Json(payload): Json<ValidateCouponRequest>,
) -> AppResult<Json<ApiResponse<CouponValidation>>> {
    let resp = coupon_service::validate_coupon(&state, &payload.code, Utc::now()).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/coupons",
    params(Pagination),
    responses(
        (status = 200, description = "Coupons, newest first", body = ApiResponse<CouponList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Coupons"
)]
pub async fn list_coupons(
    State(state): State<AppState>,
    _admin: AuthAdmin,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<CouponList>>> {
    let resp = coupon_service::list_coupons(&state, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/coupons",
    request_body = CouponRequest,
    responses(
        (status = 200, description = "Create coupon", body = ApiResponse<Coupon>),
        (status = 400, description = "Validation failed or duplicate code"),
    ),
    security(("bearer_auth" = [])),
    tag = "Coupons"
)]
pub async fn create_coupon(
    State(state): State<AppState>,
    admin: AuthAdmin,
    Json(payload): Json<CouponRequest>,
) -> AppResult<Json<ApiResponse<Coupon>>> {
    let resp = coupon_service::create_coupon(&state, &admin, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/coupons/{id}",
    params(
        ("id" = Uuid, Path, description = "Coupon ID")
    ),
    request_body = CouponRequest,
    responses(
        (status = 200, description = "Updated coupon", body = ApiResponse<Coupon>),
        (status = 404, description = "Coupon not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Coupons"
)]
pub async fn update_coupon(
    State(state): State<AppState>,
    admin: AuthAdmin,
    Path(id): Path<Uuid>,
    Json(payload): Json<CouponRequest>,
) -> AppResult<Json<ApiResponse<Coupon>>> {
    let resp = coupon_service::update_coupon(&state, &admin, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/coupons/{id}",
    params(
        ("id" = Uuid, Path, description = "Coupon ID")
    ),
    responses(
        (status = 200, description = "Deleted coupon"),
        (status = 404, description = "Coupon not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Coupons"
)]
pub async fn delete_coupon(
    State(state): State<AppState>,
    admin: AuthAdmin,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = coupon_service::delete_coupon(&state, &admin, id).await?;
    Ok(Json(resp))
}
