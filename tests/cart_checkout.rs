use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use storefront_api::{
    cart::{CartNotice, CartStore, CustomerInfo},
    checkout::CheckoutSettings,
    coupon::{self, AppliedCoupon, CouponOutcome},
    local_store::{FileStore, KeyValueStore, MemoryStore, keys},
    models::{Coupon, Product},
    pricing,
};
use uuid::Uuid;

fn product(name: &str, price: i64) -> Product {
    let now = Utc::now();
    Product {
        id: Uuid::new_v4(),
        name: name.to_string(),
        description: None,
        price: Decimal::from(price),
        image_url: None,
        category_id: None,
        stock_level: Some(20),
        created_at: now,
        updated_at: now,
    }
}

fn save10() -> Coupon {
    let now = Utc::now();
    Coupon {
        id: Uuid::new_v4(),
        code: "SAVE10".into(),
        discount_amount: Decimal::from(10),
        is_percentage: true,
        start_date: now - Duration::days(1),
        expiry_date: now + Duration::days(1),
        usage_limit: Some(5),
        usage_count: 0,
        active: true,
        success_message: Some("10% off applied".into()),
        created_at: now,
        updated_at: now,
    }
}

#[test]
fn subtotal_is_sum_of_line_totals() {
    let mut cart = CartStore::load(MemoryStore::new());
    let dal = product("Toor Dal (1kg)", 160);
    let oil = product("Refined Sunflower Oil (1L)", 130);
    cart.add_to_cart(dal.clone());
    cart.add_to_cart(oil.clone());
    cart.update_quantity(dal.id, 3);

    let by_lines: Decimal = cart.entries().iter().map(pricing::line_total).sum();
    assert_eq!(cart.get_cart_total(), by_lines);
    assert_eq!(cart.get_cart_total(), Decimal::from(610));
}

#[test]
fn non_positive_quantity_behaves_like_remove() {
    let a = product("Jaggery Block (500g)", 70);
    let b = product("Tamarind Block (250g)", 90);

    let mut updated = CartStore::load(MemoryStore::new());
    updated.add_to_cart(a.clone());
    updated.add_to_cart(b.clone());
    updated.update_quantity(a.id, 0);

    let mut removed = CartStore::load(MemoryStore::new());
    removed.add_to_cart(a.clone());
    removed.add_to_cart(b.clone());
    removed.remove_from_cart(a.id);

    assert_eq!(updated.entries(), removed.entries());

    updated.update_quantity(b.id, -4);
    assert!(updated.is_empty());
}

#[test]
fn add_then_remove_restores_previous_cart() {
    let mut cart = CartStore::load(MemoryStore::new());
    cart.add_to_cart(product("Dove Soap (3x75g)", 140));
    let before = cart.entries().to_vec();

    let extra = product("Dettol Soap (4x75g)", 160);
    cart.add_to_cart(extra.clone());
    cart.remove_from_cart(extra.id);

    assert_eq!(cart.entries(), before.as_slice());
}

#[test]
fn cart_survives_reload_from_shared_storage() {
    let store = MemoryStore::new();
    let mut cart = CartStore::load(store.clone());
    let rice = product("Sona Masoori Rice (5kg)", 350);
    cart.add_to_cart(rice.clone());
    cart.add_to_cart(rice.clone());
    cart.set_customer_info(CustomerInfo {
        name: "Lakshmi".into(),
        phone: "9000000001".into(),
        address: "Brodipet, Guntur".into(),
    });
    assert_eq!(
        cart.drain_notices(),
        vec![
            CartNotice::Added {
                product_name: rice.name.clone()
            },
            CartNotice::Added {
                product_name: rice.name.clone()
            },
        ]
    );

    let reloaded = CartStore::load(store);
    assert_eq!(reloaded.entries(), cart.entries());
    assert_eq!(reloaded.customer_info().map(|c| c.name.as_str()), Some("Lakshmi"));
}

#[test]
fn malformed_saved_cart_starts_empty() {
    let store = MemoryStore::new();
    store.set(keys::CART, "[{\"product\": 1}]").unwrap();
    assert!(CartStore::load(store).is_empty());
}

#[test]
fn file_store_keeps_cart_between_sessions() {
    let dir = std::env::temp_dir().join(format!("storefront-cart-{}", Uuid::new_v4()));
    let spices = product("Red Chilli Powder (100g)", 60);
    {
        let mut cart = CartStore::load(FileStore::open(&dir).unwrap());
        cart.add_to_cart(spices.clone());
        cart.update_quantity(spices.id, 4);
    }

    let cart = CartStore::load(FileStore::open(&dir).unwrap());
    assert_eq!(cart.entries().len(), 1);
    assert_eq!(cart.entries()[0].quantity, 4);
    assert_eq!(cart.get_cart_total(), Decimal::from(240));
    std::fs::remove_dir_all(dir).ok();
}

#[test]
fn save10_on_500_gives_450_and_link() {
    let coupon = save10();
    let outcome = coupon::check_eligibility(&coupon, Utc::now());
    let applied = match &outcome {
        CouponOutcome::Applied { coupon, .. } => coupon.clone(),
        other => panic!("expected applied, got {other:?}"),
    };
    assert_eq!(outcome.user_message(), "10% off applied");

    let mut cart = CartStore::load(MemoryStore::new());
    let rice = product("Sona Masoori Rice (5kg)", 250);
    cart.add_to_cart(rice.clone());
    cart.update_quantity(rice.id, 2);

    let totals = cart.totals(Some(&applied));
    assert_eq!(totals.subtotal, Decimal::from(500));
    assert_eq!(totals.discount, Decimal::from(50));
    assert_eq!(totals.total, Decimal::from(450));

    let link = cart.generate_checkout_message(&CheckoutSettings::default(), Some(&applied));
    assert!(link.starts_with("https://wa.me/919951690420?text="));
    let text = urlencoding::decode(link.split_once("?text=").unwrap().1)
        .unwrap()
        .into_owned();
    assert!(text.contains("Discount (SAVE10): -₹50"));
    assert!(text.contains("*Total Amount: ₹450*"));
}

#[test]
fn fixed_discount_never_goes_negative() {
    let coupon = AppliedCoupon {
        code: "FLAT100".into(),
        discount_amount: Decimal::from(100),
        is_percentage: false,
    };
    let mut cart = CartStore::load(MemoryStore::new());
    cart.add_to_cart(product("Turmeric Powder (100g)", 45));

    let totals = cart.totals(Some(&coupon));
    assert_eq!(totals.discount, Decimal::from(45));
    assert_eq!(totals.total, Decimal::ZERO);
}

#[test]
fn exhausted_or_out_of_window_coupons_do_not_apply() {
    let mut limited = save10();
    limited.usage_limit = Some(5);
    limited.usage_count = 5;
    assert_eq!(
        coupon::check_eligibility(&limited, Utc::now()),
        CouponOutcome::LimitReached
    );

    let window = save10();
    assert_eq!(
        coupon::check_eligibility(&window, window.start_date - Duration::seconds(1)),
        CouponOutcome::Expired
    );
    assert!(coupon::check_eligibility(&window, window.expiry_date).is_applied());
}

#[test]
fn empty_cart_has_empty_checkout_message() {
    let cart = CartStore::load(MemoryStore::new());
    assert_eq!(
        cart.generate_checkout_message(&CheckoutSettings::default(), None),
        ""
    );
}
