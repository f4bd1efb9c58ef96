//! Order summary text and the WhatsApp deep link that carries it.

use std::fmt::Write as _;

use rust_decimal::Decimal;

use crate::{
    cart::{CartEntry, CustomerInfo},
    coupon::AppliedCoupon,
    pricing::{self, CartTotals},
};

pub const DEFAULT_STORE_NAME: &str = "Vijaya Sai Provisions";
pub const DEFAULT_WHATSAPP_NUMBER: &str = "919951690420";
const CURRENCY: &str = "₹";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSettings {
    pub store_name: String,
    /// Destination number in international format, digits only.
    pub whatsapp_number: String,
}

impl Default for CheckoutSettings {
    fn default() -> Self {
        Self {
            store_name: DEFAULT_STORE_NAME.to_string(),
            whatsapp_number: DEFAULT_WHATSAPP_NUMBER.to_string(),
        }
    }
}

fn money(amount: Decimal) -> String {
    format!("{CURRENCY}{}", amount.round_dp(2).normalize())
}

/// Plain-text order summary. `None` for an empty cart.
pub fn order_summary(
    settings: &CheckoutSettings,
    entries: &[CartEntry],
    customer: Option<&CustomerInfo>,
    coupon: Option<&AppliedCoupon>,
) -> Option<String> {
    if entries.is_empty() {
        return None;
    }

    let totals = CartTotals::compute(entries, coupon);
    let mut message = format!("🛒 *New Order from {}* 🛒\n\n", settings.store_name);

    if let Some(customer) = customer {
        message.push_str("*Customer Details*\n");
        let _ = writeln!(message, "Name: {}", customer.name);
        let _ = writeln!(message, "Phone: {}", customer.phone);
        let _ = writeln!(message, "Address: {}\n", customer.address);
    }

    message.push_str("*Order Summary*\n");
    for (index, entry) in entries.iter().enumerate() {
        let _ = writeln!(
            message,
            "{}. {} - {} x {} = {}",
            index + 1,
            entry.product.name,
            money(entry.product.price),
            entry.quantity,
            money(pricing::line_total(entry)),
        );
    }

    message.push('\n');
    if let Some(coupon) = coupon {
        let _ = writeln!(message, "Subtotal: {}", money(totals.subtotal));
        let _ = writeln!(
            message,
            "Discount ({}): -{}",
            coupon.code,
            money(totals.discount)
        );
    }
    let _ = write!(message, "*Total Amount: {}*\n\n", money(totals.total));
    message.push_str("Thank you for your order!");

    Some(message)
}

/// `https://wa.me/<number>?text=<summary>`, or `None` for an empty cart.
pub fn whatsapp_link(
    settings: &CheckoutSettings,
    entries: &[CartEntry],
    customer: Option<&CustomerInfo>,
    coupon: Option<&AppliedCoupon>,
) -> Option<String> {
    let message = order_summary(settings, entries, customer, coupon)?;
    Some(format!(
        "https://wa.me/{}?text={}",
        settings.whatsapp_number,
        urlencoding::encode(&message)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::test_support::{entry, product};

    fn customer() -> CustomerInfo {
        CustomerInfo {
            name: "Ravi Kumar".into(),
            phone: "9000000000".into(),
            address: "4-12 Main Road, Guntur".into(),
        }
    }

    #[test]
    fn summary_lists_numbered_lines_and_total() {
        let entries = vec![
            entry(product("Toor Dal (1kg)", 160), 2),
            entry(product("Dettol Soap (4x75g)", 160), 1),
        ];
        let text = order_summary(&CheckoutSettings::default(), &entries, None, None).unwrap();

        assert!(text.starts_with("🛒 *New Order from Vijaya Sai Provisions* 🛒\n\n"));
        assert!(text.contains("1. Toor Dal (1kg) - ₹160 x 2 = ₹320\n"));
        assert!(text.contains("2. Dettol Soap (4x75g) - ₹160 x 1 = ₹160\n"));
        assert!(text.contains("*Total Amount: ₹480*"));
        assert!(!text.contains("Customer Details"));
        assert!(!text.contains("Discount"));
        assert!(text.ends_with("Thank you for your order!"));
    }

    #[test]
    fn summary_includes_customer_and_discount() {
        let entries = vec![entry(product("Sona Masoori Rice (5kg)", 250), 2)];
        let coupon = AppliedCoupon {
            code: "SAVE10".into(),
            discount_amount: Decimal::from(10),
            is_percentage: true,
        };
        let text = order_summary(
            &CheckoutSettings::default(),
            &entries,
            Some(&customer()),
            Some(&coupon),
        )
        .unwrap();

        assert!(text.contains("*Customer Details*\nName: Ravi Kumar\n"));
        assert!(text.contains("Address: 4-12 Main Road, Guntur\n\n*Order Summary*"));
        assert!(text.contains("Subtotal: ₹500\n"));
        assert!(text.contains("Discount (SAVE10): -₹50\n"));
        assert!(text.contains("*Total Amount: ₹450*"));
    }

    #[test]
    fn link_targets_configured_number_and_is_encoded() {
        let settings = CheckoutSettings {
            store_name: "Corner Shop".into(),
            whatsapp_number: "15550001111".into(),
        };
        let entries = vec![entry(product("Tea & Biscuits", 99), 1)];
        let link = whatsapp_link(&settings, &entries, None, None).unwrap();

        assert!(link.starts_with("https://wa.me/15550001111?text="));
        let encoded = link.trim_start_matches("https://wa.me/15550001111?text=");
        assert!(!encoded.contains(' '));
        assert!(!encoded.contains('&'));
        assert!(!encoded.contains('\n'));
        let decoded = urlencoding::decode(encoded).unwrap();
        assert!(decoded.contains("Tea & Biscuits"));
    }

    #[test]
    fn empty_cart_has_no_link() {
        assert!(whatsapp_link(&CheckoutSettings::default(), &[], Some(&customer()), None).is_none());
    }
}
