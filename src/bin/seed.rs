use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use storefront_api::{
    config::AppConfig,
    db::{DbPool, create_orm_conn, create_pool, run_migrations},
    services::auth_service::hash_password,
};
use uuid::Uuid;

const CATEGORIES: [&str; 6] = ["Grains", "Oils", "Snacks", "Soaps", "Spices", "Others"];

const PRODUCTS: [(&str, i64, &str); 12] = [
    ("Sona Masoori Rice (5kg)", 350, "Grains"),
    ("Toor Dal (1kg)", 160, "Grains"),
    ("Refined Sunflower Oil (1L)", 130, "Oils"),
    ("Cold Pressed Sesame Oil (500ml)", 210, "Oils"),
    ("Lays Classic Salted (Family Pack)", 90, "Snacks"),
    ("Mixed Namkeen (400g)", 120, "Snacks"),
    ("Dove Soap (3x75g)", 140, "Soaps"),
    ("Dettol Soap (4x75g)", 160, "Soaps"),
    ("Red Chilli Powder (100g)", 60, "Spices"),
    ("Turmeric Powder (100g)", 45, "Spices"),
    ("Jaggery Block (500g)", 70, "Others"),
    ("Tamarind Block (250g)", 90, "Others"),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;
    let pool = create_pool(&config.database_url).await?;

    let password = std::env::var("SEED_ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".into());
    let admin_id = ensure_admin(&pool, "admin@example.com", "Store Admin", &password).await?;
    seed_categories(&pool).await?;
    seed_products(&pool).await?;
    seed_coupon(&pool).await?;

    println!("Seed completed. Admin ID: {admin_id}");
    Ok(())
}

async fn ensure_admin(
    pool: &DbPool,
    email: &str,
    name: &str,
    password: &str,
) -> anyhow::Result<Uuid> {
    let password_hash = hash_password(password)?;

    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO admins (id, email, name, password_hash)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (email) DO UPDATE SET password_hash = EXCLUDED.password_hash
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(name)
    .bind(password_hash)
    .fetch_one(pool)
    .await?;

    println!("Ensured admin {email}");
    Ok(id)
}

async fn seed_categories(pool: &DbPool) -> anyhow::Result<()> {
    for name in CATEGORIES {
        sqlx::query(
            r#"
            INSERT INTO categories (id, name)
            VALUES ($1, $2)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .execute(pool)
        .await?;
    }

    println!("Seeded categories");
    Ok(())
}

async fn seed_products(pool: &DbPool) -> anyhow::Result<()> {
    for (name, price, category) in PRODUCTS {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, price, category_id, stock_level)
            SELECT $1, $2, $3, c.id, 50
            FROM categories c
            WHERE c.name = $4
              AND NOT EXISTS (SELECT 1 FROM products WHERE name = $2)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(Decimal::from(price))
        .bind(category)
        .execute(pool)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}

async fn seed_coupon(pool: &DbPool) -> anyhow::Result<()> {
    let now = Utc::now();
    sqlx::query(
        r#"
        INSERT INTO coupons (id, code, discount_amount, is_percentage, start_date, expiry_date, usage_limit)
        VALUES ($1, 'WELCOME10', 10, true, $2, $3, 100)
        ON CONFLICT (code) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(now)
    .bind(now + Duration::days(90))
    .execute(pool)
    .await?;

    println!("Seeded coupon WELCOME10");
    Ok(())
}
