use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    cart::CustomerInfo,
    coupon::{AppliedCoupon, CouponOutcome},
    dto::{
        auth::{LoginRequest, LoginResponse},
        categories::{CategoryList, CreateCategoryRequest, UpdateCategoryRequest},
        checkout::{CheckoutLine, CheckoutRequest, CheckoutSummary, PricedLine},
        coupons::{CouponList, CouponRequest, CouponValidation, ValidateCouponRequest},
        products::{
            BulkDeleteRequest, BulkDeleteResponse, CreateProductRequest, ProductList,
            UpdateProductRequest,
        },
        uploads::UploadedImage,
    },
    models::{Admin, Category, Coupon, Product, ProductWithCategory},
    response::{ApiResponse, Meta},
    routes::{auth, categories, checkout, coupons, health, params, products, uploads},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::login,
        auth::me,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        products::bulk_delete_products,
        categories::list_categories,
        categories::create_category,
        categories::update_category,
        categories::delete_category,
        coupons::validate_coupon,
        coupons::list_coupons,
        coupons::create_coupon,
        coupons::update_coupon,
        coupons::delete_coupon,
        checkout::checkout,
        uploads::upload_image
    ),
    components(
        schemas(
            Admin,
            Category,
            Product,
            ProductWithCategory,
            Coupon,
            AppliedCoupon,
            CouponOutcome,
            CustomerInfo,
            LoginRequest,
            LoginResponse,
            CreateProductRequest,
            UpdateProductRequest,
            BulkDeleteRequest,
            BulkDeleteResponse,
            ProductList,
            CreateCategoryRequest,
            UpdateCategoryRequest,
            CategoryList,
            CouponRequest,
            ValidateCouponRequest,
            CouponValidation,
            CouponList,
            CheckoutLine,
            CheckoutRequest,
            PricedLine,
            CheckoutSummary,
            UploadedImage,
            params::Pagination,
            params::ProductSort,
            params::StockFilter,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<CheckoutSummary>,
            ApiResponse<CouponValidation>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Admin authentication"),
        (name = "Products", description = "Catalog and product management"),
        (name = "Categories", description = "Category management"),
        (name = "Coupons", description = "Coupon validation and management"),
        (name = "Checkout", description = "Cart pricing and WhatsApp handoff"),
        (name = "Uploads", description = "Product and category images"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
