//! Cart arithmetic. Every function here is pure: same inputs, same output, no mutation.

use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{cart::CartEntry, coupon::AppliedCoupon};

/// Unit price times quantity.
pub fn line_total(entry: &CartEntry) -> Decimal {
    entry.product.price * Decimal::from(entry.quantity)
}

/// Sum of line totals; zero for an empty cart.
pub fn subtotal(entries: &[CartEntry]) -> Decimal {
    entries.iter().map(line_total).sum()
}

/// Discount granted by `coupon` against `subtotal`.
///
/// Percentage coupons take `subtotal * amount / 100`. Fixed coupons are capped at the
/// subtotal, so the final total can never drop below zero.
pub fn discount_amount(subtotal: Decimal, coupon: Option<&AppliedCoupon>) -> Decimal {
    let Some(coupon) = coupon else {
        return Decimal::ZERO;
    };

    let raw = if coupon.is_percentage {
        subtotal * coupon.discount_amount / Decimal::ONE_HUNDRED
    } else {
        coupon.discount_amount
    };

    raw.max(Decimal::ZERO).min(subtotal.max(Decimal::ZERO))
}

pub fn final_total(subtotal: Decimal, coupon: Option<&AppliedCoupon>) -> Decimal {
    subtotal - discount_amount(subtotal, coupon)
}

/// Subtotal, discount and total computed together for display or checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct CartTotals {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
}

impl CartTotals {
    pub fn compute(entries: &[CartEntry], coupon: Option<&AppliedCoupon>) -> Self {
        let subtotal = subtotal(entries);
        let discount = discount_amount(subtotal, coupon);
        Self {
            subtotal,
            discount,
            total: subtotal - discount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::test_support::{entry, product};

    fn fixed(amount: i64) -> AppliedCoupon {
        AppliedCoupon {
            code: "FLAT".into(),
            discount_amount: Decimal::from(amount),
            is_percentage: false,
        }
    }

    fn percent(amount: i64) -> AppliedCoupon {
        AppliedCoupon {
            code: "PCT".into(),
            discount_amount: Decimal::from(amount),
            is_percentage: true,
        }
    }

    #[test]
    fn subtotal_of_empty_cart_is_zero() {
        assert_eq!(subtotal(&[]), Decimal::ZERO);
    }

    #[test]
    fn subtotal_sums_price_times_quantity() {
        let entries = vec![
            entry(product("Toor Dal (1kg)", 160), 2),
            entry(product("Turmeric Powder (100g)", 45), 3),
        ];
        assert_eq!(subtotal(&entries), Decimal::from(160 * 2 + 45 * 3));
    }

    #[test]
    fn fractional_prices_stay_exact() {
        let mut p = product("Loose Jaggery", 0);
        p.price = Decimal::new(1235, 2);
        let entries = vec![entry(p, 3)];
        assert_eq!(subtotal(&entries).to_string(), "37.05");
    }

    #[test]
    fn fixed_discount_is_capped_at_subtotal() {
        let s = Decimal::from(80);
        assert_eq!(discount_amount(s, Some(&fixed(100))), s);
        assert_eq!(final_total(s, Some(&fixed(100))), Decimal::ZERO);
        assert_eq!(discount_amount(s, Some(&fixed(30))), Decimal::from(30));
    }

    #[test]
    fn percentage_discount_is_exact() {
        for d in [1, 10, 33, 50, 100] {
            let s = Decimal::from(499);
            assert_eq!(
                discount_amount(s, Some(&percent(d))),
                s * Decimal::from(d) / Decimal::ONE_HUNDRED
            );
        }
    }

    #[test]
    fn no_coupon_means_no_discount() {
        let s = Decimal::from(250);
        assert_eq!(discount_amount(s, None), Decimal::ZERO);
        assert_eq!(final_total(s, None), s);
    }

    #[test]
    fn totals_never_go_negative() {
        let coupons = [None, Some(fixed(1)), Some(fixed(10_000)), Some(percent(100))];
        for s in [0, 1, 99, 5_000] {
            for c in &coupons {
                assert!(final_total(Decimal::from(s), c.as_ref()) >= Decimal::ZERO);
            }
        }
    }

    #[test]
    fn ten_percent_of_five_hundred() {
        let entries = vec![entry(product("Sona Masoori Rice (5kg)", 250), 2)];
        let totals = CartTotals::compute(&entries, Some(&percent(10)));
        assert_eq!(totals.subtotal, Decimal::from(500));
        assert_eq!(totals.discount, Decimal::from(50));
        assert_eq!(totals.total, Decimal::from(450));
    }
}
