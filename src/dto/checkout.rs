use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{cart::CustomerInfo, coupon::AppliedCoupon};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CheckoutLine {
    pub product_id: Uuid,
    pub quantity: i64,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub items: Vec<CheckoutLine>,
    pub customer: Option<CustomerInfo>,
    pub coupon: Option<AppliedCoupon>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PricedLine {
    pub product_id: Uuid,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub line_total: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutSummary {
    pub lines: Vec<PricedLine>,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub whatsapp_url: String,
}
