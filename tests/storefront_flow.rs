use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::{ConnectionTrait, Statement};
use storefront_api::{
    checkout::{DEFAULT_STORE_NAME, DEFAULT_WHATSAPP_NUMBER},
    config::AppConfig,
    coupon::{AppliedCoupon, CouponOutcome},
    db::{create_orm_conn, create_pool, run_migrations},
    dto::{
        categories::CreateCategoryRequest,
        checkout::{CheckoutLine, CheckoutRequest},
        coupons::CouponRequest,
        products::{BulkDeleteRequest, CreateProductRequest, UpdateProductRequest},
    },
    error::AppError,
    local_store::MemoryStore,
    middleware::auth::{ADMIN_ROLE, AuthAdmin, decode_token},
    routes::params::{ProductQuery, ProductSort, StockFilter},
    services::{
        auth_service, category_service, checkout_service, coupon_service, product_service,
    },
    session::{AdminSessionGuard, LoginError, RouteAccess},
    state::AppState,
    storage::MAX_IMAGE_BYTES,
};
use uuid::Uuid;

const JWT_SECRET: &str = "integration-secret";

// Integration flow: admin logs in, manages the catalog and coupons; a shopper validates a
// coupon and checks out. Runs only when a database is configured.
#[tokio::test]
async fn admin_catalog_coupon_and_checkout_flow() -> anyhow::Result<()> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(());
        }
    };

    let state = setup_state(&database_url).await?;

    // Admin login through the guard, backed by the real credential check.
    let admin_id = create_admin(&state, "admin@example.com", "admin123").await?;
    let mut guard = AdminSessionGuard::new(MemoryStore::new());
    let bad = guard.login(&state, "admin@example.com", "nope").await;
    assert!(matches!(bad, Err(LoginError::InvalidCredentials)));

    let session = guard.login(&state, "ADMIN@example.com", "admin123").await?;
    assert_eq!(session.id, admin_id);
    assert!(matches!(guard.access("/admin"), RouteAccess::Render(_)));
    let token = session.token.trim_start_matches("Bearer ");
    let claims = decode_token(token, JWT_SECRET)?;
    assert_eq!(claims.role, ADMIN_ROLE);

    let admin = AuthAdmin {
        admin_id,
        email: session.email.clone(),
        role: ADMIN_ROLE.into(),
    };

    // Catalog
    let grains = category_service::create_category(
        &state,
        &admin,
        CreateCategoryRequest {
            name: "Grains".into(),
            image_url: None,
        },
    )
    .await?
    .data
    .unwrap();

    let duplicate = category_service::create_category(
        &state,
        &admin,
        CreateCategoryRequest {
            name: "Grains".into(),
            image_url: None,
        },
    )
    .await;
    assert!(matches!(duplicate, Err(AppError::BadRequest(_))));

    let rice = create_product(&state, &admin, "Sona Masoori Rice (5kg)", 250, Some(grains.id), 5)
        .await?;
    let dal = create_product(&state, &admin, "Toor Dal (1kg)", 160, Some(grains.id), 0).await?;
    let soap = create_product(&state, &admin, "Dove Soap (3x75g)", 140, None, 40).await?;

    let rejected = product_service::create_product(
        &state,
        &admin,
        CreateProductRequest {
            name: "Free Lunch".into(),
            price: Decimal::ZERO,
            description: None,
            category_id: None,
            stock_level: None,
            image_url: None,
        },
    )
    .await;
    assert!(matches!(rejected, Err(AppError::BadRequest(_))));

    let low = product_service::list_products(
        &state,
        ProductQuery {
            stock: Some(StockFilter::Low),
            ..Default::default()
        },
    )
    .await?;
    let low_ids: Vec<Uuid> = low.data.unwrap().items.iter().map(|p| p.product.id).collect();
    assert_eq!(low_ids, vec![rice]);

    let out = product_service::list_products(
        &state,
        ProductQuery {
            stock: Some(StockFilter::Out),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(out.data.unwrap().items[0].product.id, dal);

    let cheapest_first = product_service::list_products(
        &state,
        ProductQuery {
            sort: Some(ProductSort::PriceAsc),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(cheapest_first.meta.as_ref().and_then(|m| m.total), Some(3));
    let prices: Vec<Decimal> = cheapest_first
        .data
        .unwrap()
        .items
        .iter()
        .map(|p| p.product.price)
        .collect();
    assert_eq!(
        prices,
        vec![Decimal::from(140), Decimal::from(160), Decimal::from(250)]
    );

    let searched = product_service::list_products(
        &state,
        ProductQuery {
            q: Some("rice".into()),
            ..Default::default()
        },
    )
    .await?;
    let found = searched.data.unwrap().items;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].category.as_ref().map(|c| c.id), Some(grains.id));

    let wildcard = product_service::list_products(
        &state,
        ProductQuery {
            q: Some("%".into()),
            ..Default::default()
        },
    )
    .await?;
    assert!(wildcard.data.unwrap().items.is_empty());

    let updated = product_service::update_product(
        &state,
        &admin,
        soap,
        UpdateProductRequest {
            category_id: Some(Some(grains.id)),
            description: Some(Some("Moisturising bar".into())),
            ..Default::default()
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(updated.category_id, Some(grains.id));
    assert_eq!(updated.description.as_deref(), Some("Moisturising bar"));

    // Coupons
    let now = Utc::now();
    coupon_service::create_coupon(
        &state,
        &admin,
        CouponRequest {
            code: "save10".into(),
            discount_amount: Decimal::from(10),
            is_percentage: true,
            start_date: now - Duration::days(1),
            expiry_date: now + Duration::days(1),
            usage_limit: Some(1),
            success_message: None,
            active: true,
        },
    )
    .await?;

    let first = coupon_service::validate_coupon(&state, " Save10 ", Utc::now())
        .await?
        .data
        .unwrap();
    let applied = match first.outcome {
        CouponOutcome::Applied { coupon, .. } => coupon,
        other => panic!("expected applied, got {other:?}"),
    };
    assert_eq!(applied.code, "SAVE10");

    let second = coupon_service::validate_coupon(&state, "SAVE10", Utc::now())
        .await?
        .data
        .unwrap();
    assert_eq!(second.outcome, CouponOutcome::LimitReached);
    assert_eq!(second.message, "Coupon usage limit has been reached.");

    let unknown = coupon_service::validate_coupon(&state, "NOPE", Utc::now())
        .await?
        .data
        .unwrap();
    assert_eq!(unknown.outcome, CouponOutcome::InvalidCode);

    let listed = coupon_service::list_coupons(&state, Default::default())
        .await?
        .data
        .unwrap();
    assert_eq!(listed.items[0].usage_count, 1);

    // Checkout re-prices from stored products.
    let summary = checkout_service::checkout(
        &state,
        CheckoutRequest {
            items: vec![
                CheckoutLine {
                    product_id: rice,
                    quantity: 1,
                },
                CheckoutLine {
                    product_id: rice,
                    quantity: 1,
                },
            ],
            customer: None,
            coupon: Some(applied),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(summary.subtotal, Decimal::from(500));
    assert_eq!(summary.discount, Decimal::from(50));
    assert_eq!(summary.total, Decimal::from(450));
    assert!(
        summary
            .whatsapp_url
            .starts_with(&format!("https://wa.me/{DEFAULT_WHATSAPP_NUMBER}?text="))
    );

    let missing = checkout_service::checkout(
        &state,
        CheckoutRequest {
            items: vec![CheckoutLine {
                product_id: Uuid::new_v4(),
                quantity: 1,
            }],
            customer: None,
            coupon: None,
        },
    )
    .await;
    assert!(matches!(missing, Err(AppError::BadRequest(_))));

    for forged in [
        AppliedCoupon {
            code: "FREE".into(),
            discount_amount: Decimal::from(20),
            is_percentage: true,
        },
        AppliedCoupon {
            code: "SAVE10".into(),
            discount_amount: Decimal::from(250),
            is_percentage: true,
        },
    ] {
        let rejected = checkout_service::checkout(
            &state,
            CheckoutRequest {
                items: vec![CheckoutLine {
                    product_id: soap,
                    quantity: 1,
                }],
                customer: None,
                coupon: Some(forged),
            },
        )
        .await;
        assert!(matches!(rejected, Err(AppError::BadRequest(_))));
    }

    // Deleting the category keeps its products, uncategorised.
    category_service::delete_category(&state, &admin, grains.id).await?;
    let rice_after = product_service::get_product(&state, rice).await?.data.unwrap();
    assert!(rice_after.category.is_none());

    let deleted = product_service::bulk_delete_products(
        &state,
        &admin,
        BulkDeleteRequest {
            ids: vec![rice, dal, Uuid::new_v4()],
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(deleted.deleted, 2);

    let audit_rows: (i64,) = sqlx::query_as("SELECT count(*) FROM audit_logs WHERE admin_id = $1")
        .bind(admin_id)
        .fetch_one(&state.pool)
        .await?;
    assert!(audit_rows.0 >= 8, "expected admin actions in the audit log");

    guard.logout();
    assert!(guard.session().is_none());

    Ok(())
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let orm = create_orm_conn(database_url).await?;
    run_migrations(&orm).await?;
    let pool = create_pool(database_url).await?;

    // Clean tables between runs
    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE audit_logs, coupons, products, categories, admins CASCADE",
    ))
    .await?;

    let storage_dir = std::env::temp_dir().join(format!("storefront-flow-{}", Uuid::new_v4()));
    let config = AppConfig {
        database_url: database_url.to_string(),
        host: "127.0.0.1".into(),
        port: 3000,
        jwt_secret: JWT_SECRET.into(),
        session_ttl_hours: 24,
        store_name: DEFAULT_STORE_NAME.into(),
        whatsapp_number: DEFAULT_WHATSAPP_NUMBER.into(),
        storage_dir: storage_dir.to_string_lossy().into_owned(),
        public_base_url: "http://127.0.0.1:3000".into(),
        max_upload_bytes: MAX_IMAGE_BYTES,
    };

    Ok(AppState::new(pool, orm, config))
}

async fn create_admin(state: &AppState, email: &str, password: &str) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO admins (id, email, name, password_hash) VALUES ($1, $2, $3, $4)")
        .bind(id)
        .bind(email)
        .bind("Store Admin")
        .bind(auth_service::hash_password(password)?)
        .execute(&state.pool)
        .await?;
    Ok(id)
}

async fn create_product(
    state: &AppState,
    admin: &AuthAdmin,
    name: &str,
    price: i64,
    category_id: Option<Uuid>,
    stock_level: i32,
) -> anyhow::Result<Uuid> {
    let product = product_service::create_product(
        state,
        admin,
        CreateProductRequest {
            name: name.into(),
            price: Decimal::from(price),
            description: None,
            category_id,
            stock_level: Some(stock_level),
            image_url: None,
        },
    )
    .await?
    .data
    .unwrap();
    Ok(product.id)
}
