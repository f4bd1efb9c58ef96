pub mod auth_service;
pub mod category_service;
pub mod checkout_service;
pub mod coupon_service;
pub mod product_service;
pub mod upload_service;
