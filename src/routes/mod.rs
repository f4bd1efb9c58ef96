use axum::Router;

use crate::state::AppState;

pub mod auth;
pub mod categories;
pub mod checkout;
pub mod coupons;
pub mod doc;
pub mod health;
pub mod params;
pub mod products;
pub mod uploads;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/products", products::router())
        .nest("/categories", categories::router())
        .nest("/coupons", coupons::router())
        .nest("/checkout", checkout::router())
        .nest("/uploads", uploads::router(max_upload_bytes))
}
