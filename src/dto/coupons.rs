use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{coupon::CouponOutcome, models::Coupon};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CouponRequest {
    pub code: String,
    pub discount_amount: Decimal,
    #[serde(default)]
    pub is_percentage: bool,
    pub start_date: DateTime<Utc>,
    pub expiry_date: DateTime<Utc>,
    pub usage_limit: Option<i32>,
    pub success_message: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ValidateCouponRequest {
    pub code: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CouponValidation {
    #[serde(flatten)]
    pub outcome: CouponOutcome,
    pub message: String,
}

impl From<CouponOutcome> for CouponValidation {
    fn from(outcome: CouponOutcome) -> Self {
        let message = outcome.user_message().to_string();
        Self { outcome, message }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct CouponList {
    #[schema(value_type = Vec<Coupon>)]
    pub items: Vec<Coupon>,
}
