use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit,
    coupon::{self, CouponOutcome, DEFAULT_SUCCESS_MESSAGE},
    db::DbPool,
    dto::coupons::{CouponList, CouponRequest, CouponValidation},
    entity::coupons::{ActiveModel, Column, Entity as Coupons, Model as CouponModel},
    error::{AppError, AppResult},
    middleware::auth::AuthAdmin,
    models::Coupon,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

const MIN_CODE_LEN: usize = 3;

/// Coupon fields after validation, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct CouponFields {
    pub code: String,
    pub discount_amount: Decimal,
    pub is_percentage: bool,
    pub start_date: DateTime<Utc>,
    pub expiry_date: DateTime<Utc>,
    pub usage_limit: Option<i32>,
    pub success_message: String,
    pub active: bool,
}

pub fn validate_coupon_request(payload: CouponRequest) -> AppResult<CouponFields> {
    let code = payload.code.trim().to_uppercase();
    if code.chars().count() < MIN_CODE_LEN {
        return Err(AppError::BadRequest(
            "Coupon code must be at least 3 characters".into(),
        ));
    }
    if payload.discount_amount <= Decimal::ZERO {
        return Err(AppError::BadRequest("Discount must be positive".into()));
    }
    if payload.is_percentage && payload.discount_amount > Decimal::ONE_HUNDRED {
        return Err(AppError::BadRequest(
            "Percentage discount cannot exceed 100%".into(),
        ));
    }
    if payload.start_date > payload.expiry_date {
        return Err(AppError::BadRequest(
            "Start date must be before or equal to expiry date".into(),
        ));
    }
    if payload.usage_limit.is_some_and(|limit| limit < 0) {
        return Err(AppError::BadRequest("Usage limit cannot be negative".into()));
    }

    let success_message = payload
        .success_message
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| DEFAULT_SUCCESS_MESSAGE.to_string());

    Ok(CouponFields {
        code,
        discount_amount: payload.discount_amount,
        is_percentage: payload.is_percentage,
        start_date: payload.start_date,
        expiry_date: payload.expiry_date,
        usage_limit: payload.usage_limit,
        success_message,
        active: payload.active,
    })
}

pub async fn list_coupons(
    state: &AppState,
    pagination: Pagination,
) -> AppResult<ApiResponse<CouponList>> {
    let (page, limit, offset) = pagination.normalize();
    let finder = Coupons::find().order_by_desc(Column::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(coupon_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Coupons",
        CouponList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn create_coupon(
    state: &AppState,
    admin: &AuthAdmin,
    payload: CouponRequest,
) -> AppResult<ApiResponse<Coupon>> {
    let fields = validate_coupon_request(payload)?;
    ensure_code_free(state, &fields.code, None).await?;

    let now = Utc::now();
    let coupon = ActiveModel {
        id: Set(Uuid::new_v4()),
        code: Set(fields.code),
        discount_amount: Set(fields.discount_amount),
        is_percentage: Set(fields.is_percentage),
        start_date: Set(fields.start_date.into()),
        expiry_date: Set(fields.expiry_date.into()),
        usage_limit: Set(fields.usage_limit),
        usage_count: Set(0),
        active: Set(fields.active),
        success_message: Set(Some(fields.success_message)),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        admin.admin_id,
        "coupon_create",
        "coupons",
        serde_json::json!({ "coupon_id": coupon.id, "code": coupon.code }),
    )
    .await;

    Ok(ApiResponse::success(
        "Coupon added successfully",
        coupon_from_entity(coupon),
        Some(Meta::empty()),
    ))
}

/// Replaces the editable fields. `usage_count` is left alone.
pub async fn update_coupon(
    state: &AppState,
    admin: &AuthAdmin,
    id: Uuid,
    payload: CouponRequest,
) -> AppResult<ApiResponse<Coupon>> {
    let fields = validate_coupon_request(payload)?;
    let existing = Coupons::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_code_free(state, &fields.code, Some(id)).await?;

    let mut active: ActiveModel = existing.into();
    active.code = Set(fields.code);
    active.discount_amount = Set(fields.discount_amount);
    active.is_percentage = Set(fields.is_percentage);
    active.start_date = Set(fields.start_date.into());
    active.expiry_date = Set(fields.expiry_date.into());
    active.usage_limit = Set(fields.usage_limit);
    active.success_message = Set(Some(fields.success_message));
    active.active = Set(fields.active);
    active.updated_at = Set(Utc::now().into());
    let coupon = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        admin.admin_id,
        "coupon_update",
        "coupons",
        serde_json::json!({ "coupon_id": coupon.id, "code": coupon.code }),
    )
    .await;

    Ok(ApiResponse::success(
        "Coupon updated successfully",
        coupon_from_entity(coupon),
        Some(Meta::empty()),
    ))
}

pub async fn delete_coupon(
    state: &AppState,
    admin: &AuthAdmin,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = Coupons::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.pool,
        admin.admin_id,
        "coupon_delete",
        "coupons",
        serde_json::json!({ "coupon_id": id }),
    )
    .await;

    Ok(ApiResponse::ack("Coupon deleted successfully"))
}

/// Validates a shopper-entered code and, when it applies, claims one use.
///
/// Lookup failures count as an invalid code. The claim is a single conditional update,
/// so two shoppers racing for the last use cannot both succeed; the loser sees
/// `LimitReached`. If the claim itself errors the coupon is still applied.
pub async fn validate_coupon(
    state: &AppState,
    raw_code: &str,
    now: DateTime<Utc>,
) -> AppResult<ApiResponse<CouponValidation>> {
    let code = coupon::canonical_code(raw_code)
        .ok_or_else(|| AppError::BadRequest("coupon code is required".into()))?;

    let found = Coupons::find()
        .filter(Column::Code.eq(code.as_str()))
        .filter(Column::Active.eq(true))
        .one(&state.orm)
        .await;

    let outcome = match found {
        Ok(Some(model)) => {
            let id = model.id;
            match coupon::check_eligibility(&coupon_from_entity(model), now) {
                outcome @ CouponOutcome::Applied { .. } => match redeem(&state.pool, id).await {
                    Ok(true) => outcome,
                    Ok(false) => CouponOutcome::LimitReached,
                    Err(err) => {
                        tracing::warn!(error = %err, coupon_id = %id, "coupon usage increment failed");
                        outcome
                    }
                },
                other => other,
            }
        }
        Ok(None) => CouponOutcome::InvalidCode,
        Err(err) => {
            tracing::warn!(error = %err, code, "coupon lookup failed");
            CouponOutcome::InvalidCode
        }
    };

    tracing::debug!(code, applied = outcome.is_applied(), "coupon validated");
    let validation = CouponValidation::from(outcome);
    Ok(ApiResponse::success(
        validation.message.clone(),
        validation,
        Some(Meta::empty()),
    ))
}

/// Atomically bumps `usage_count` if the coupon still has a use left.
pub async fn redeem(pool: &DbPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let row: Option<(i32,)> = sqlx::query_as(
        r#"
        UPDATE coupons
        SET usage_count = usage_count + 1, updated_at = now()
        WHERE id = $1
          AND active
          AND (usage_limit IS NULL OR usage_count < usage_limit)
        RETURNING usage_count
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row.is_some())
}

async fn ensure_code_free(state: &AppState, code: &str, except: Option<Uuid>) -> AppResult<()> {
    let mut finder = Coupons::find().filter(Column::Code.eq(code));
    if let Some(id) = except {
        finder = finder.filter(Column::Id.ne(id));
    }
    if finder.one(&state.orm).await?.is_some() {
        return Err(AppError::BadRequest(format!("Coupon code {code} already exists")));
    }
    Ok(())
}

pub(crate) fn coupon_from_entity(model: CouponModel) -> Coupon {
    Coupon {
        id: model.id,
        code: model.code,
        discount_amount: model.discount_amount,
        is_percentage: model.is_percentage,
        start_date: model.start_date.with_timezone(&Utc),
        expiry_date: model.expiry_date.with_timezone(&Utc),
        usage_limit: model.usage_limit,
        usage_count: model.usage_count,
        active: model.active,
        success_message: model.success_message,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
