use std::collections::HashMap;

use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::{
    cart::CartEntry,
    checkout,
    coupon::{AppliedCoupon, canonical_code},
    dto::checkout::{CheckoutRequest, CheckoutSummary, PricedLine},
    entity::coupons::{Column as CouponColumn, Entity as Coupons},
    error::{AppError, AppResult},
    pricing::{self, CartTotals},
    response::{ApiResponse, Meta},
    services::product_service::find_products,
    state::AppState,
};

/// Re-prices the submitted lines against stored prices and builds the WhatsApp handoff.
///
/// Lines for the same product are merged, keeping the first position. A coupon snapshot
/// is priced on its own terms but must name an existing coupon.
pub async fn checkout(
    state: &AppState,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<CheckoutSummary>> {
    let quantities = merge_lines(&payload)?;
    let coupon = match payload.coupon.as_ref() {
        Some(snapshot) => Some(verify_coupon(state, snapshot).await?),
        None => None,
    };
    let ids: Vec<Uuid> = quantities.iter().map(|(id, _)| *id).collect();

    let mut products: HashMap<Uuid, _> = find_products(state, &ids)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let mut entries = Vec::with_capacity(quantities.len());
    for (id, quantity) in quantities {
        let product = products
            .remove(&id)
            .ok_or_else(|| AppError::BadRequest(format!("product {id} not found")))?;
        entries.push(CartEntry { product, quantity });
    }

    let coupon = coupon.as_ref();
    let totals = CartTotals::compute(&entries, coupon);
    let settings = state.config.checkout_settings();
    let whatsapp_url =
        checkout::whatsapp_link(&settings, &entries, payload.customer.as_ref(), coupon)
            .ok_or_else(|| AppError::BadRequest("cart is empty".into()))?;

    tracing::info!(
        lines = entries.len(),
        total = %totals.total,
        coupon = coupon.map(|c| c.code.as_str()),
        "checkout prepared"
    );

    let lines = entries
        .iter()
        .map(|entry| PricedLine {
            product_id: entry.product.id,
            name: entry.product.name.clone(),
            unit_price: entry.product.price,
            quantity: entry.quantity,
            line_total: pricing::line_total(entry),
        })
        .collect();

    Ok(ApiResponse::success(
        "Checkout ready",
        CheckoutSummary {
            lines,
            subtotal: totals.subtotal,
            discount: totals.discount,
            total: totals.total,
            whatsapp_url,
        },
        Some(Meta::empty()),
    ))
}

async fn verify_coupon(state: &AppState, snapshot: &AppliedCoupon) -> AppResult<AppliedCoupon> {
    let coupon = check_coupon_terms(snapshot)?;
    let known = Coupons::find()
        .filter(CouponColumn::Code.eq(coupon.code.as_str()))
        .one(&state.orm)
        .await?;
    if known.is_none() {
        tracing::warn!(code = %coupon.code, "checkout with unknown coupon");
        return Err(AppError::BadRequest("Invalid coupon code".into()));
    }
    Ok(coupon)
}

/// Canonicalizes the code and rejects terms no stored coupon could have.
fn check_coupon_terms(snapshot: &AppliedCoupon) -> AppResult<AppliedCoupon> {
    let code = canonical_code(&snapshot.code)
        .ok_or_else(|| AppError::BadRequest("Invalid coupon code".into()))?;
    if snapshot.discount_amount <= Decimal::ZERO {
        return Err(AppError::BadRequest("Discount must be positive".into()));
    }
    if snapshot.is_percentage && snapshot.discount_amount > Decimal::ONE_HUNDRED {
        return Err(AppError::BadRequest(
            "Percentage discount cannot exceed 100%".into(),
        ));
    }
    Ok(AppliedCoupon {
        code,
        ..snapshot.clone()
    })
}

fn merge_lines(payload: &CheckoutRequest) -> AppResult<Vec<(Uuid, u32)>> {
    if payload.items.is_empty() {
        return Err(AppError::BadRequest("cart is empty".into()));
    }

    let mut merged: Vec<(Uuid, u32)> = Vec::with_capacity(payload.items.len());
    for line in &payload.items {
        let quantity = u32::try_from(line.quantity)
            .ok()
            .filter(|q| *q > 0)
            .ok_or_else(|| {
                AppError::BadRequest(format!(
                    "quantity for product {} must be positive",
                    line.product_id
                ))
            })?;
        match merged.iter_mut().find(|(id, _)| *id == line.product_id) {
            Some((_, existing)) => *existing = existing.saturating_add(quantity),
            None => merged.push((line.product_id, quantity)),
        }
    }
    Ok(merged)
}
