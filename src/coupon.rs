use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Coupon;

pub const DEFAULT_SUCCESS_MESSAGE: &str = "Coupon applied successfully!";

/// Discount terms captured when a coupon was validated. Later edits to the stored coupon
/// do not affect a snapshot already handed out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppliedCoupon {
    pub code: String,
    pub discount_amount: Decimal,
    pub is_percentage: bool,
}

impl From<&Coupon> for AppliedCoupon {
    fn from(coupon: &Coupon) -> Self {
        Self {
            code: coupon.code.clone(),
            discount_amount: coupon.discount_amount,
            is_percentage: coupon.is_percentage,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CouponOutcome {
    Applied {
        coupon: AppliedCoupon,
        success_message: Option<String>,
    },
    InvalidCode,
    Expired,
    LimitReached,
}

impl CouponOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, CouponOutcome::Applied { .. })
    }

    pub fn applied(&self) -> Option<&AppliedCoupon> {
        match self {
            CouponOutcome::Applied { coupon, .. } => Some(coupon),
            _ => None,
        }
    }

    /// Text shown to the shopper for this outcome.
    pub fn user_message(&self) -> &str {
        match self {
            CouponOutcome::Applied {
                success_message, ..
            } => success_message
                .as_deref()
                .filter(|m| !m.trim().is_empty())
                .unwrap_or(DEFAULT_SUCCESS_MESSAGE),
            CouponOutcome::InvalidCode => "Invalid coupon code. Please try again.",
            CouponOutcome::Expired => "Coupon has expired or is not active yet.",
            CouponOutcome::LimitReached => "Coupon usage limit has been reached.",
        }
    }
}

/// The shopper's currently applied coupon, held in memory only.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CouponSlot {
    applied: Option<AppliedCoupon>,
}

impl CouponSlot {
    pub fn applied(&self) -> Option<&AppliedCoupon> {
        self.applied.as_ref()
    }

    /// Takes the snapshot from an `Applied` outcome. Other outcomes leave the slot as it was.
    pub fn accept(&mut self, outcome: &CouponOutcome) -> bool {
        match outcome.applied() {
            Some(coupon) => {
                self.applied = Some(coupon.clone());
                true
            }
            None => false,
        }
    }

    /// Drops the snapshot. A use already claimed on the server is not given back.
    pub fn remove(&mut self) -> Option<AppliedCoupon> {
        self.applied.take()
    }
}

/// Trims and upper-cases user input. Returns `None` when nothing is left.
pub fn canonical_code(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_uppercase())
    }
}

/// Decides whether an active coupon row can be applied at `now`.
///
/// The window is inclusive on both ends; usage is checked only when a limit is set.
pub fn check_eligibility(coupon: &Coupon, now: DateTime<Utc>) -> CouponOutcome {
    if !coupon.active {
        return CouponOutcome::InvalidCode;
    }
    if now < coupon.start_date || now > coupon.expiry_date {
        return CouponOutcome::Expired;
    }
    if let Some(limit) = coupon.usage_limit
        && coupon.usage_count >= limit
    {
        return CouponOutcome::LimitReached;
    }
    CouponOutcome::Applied {
        coupon: AppliedCoupon::from(coupon),
        success_message: coupon.success_message.clone(),
    }
}
