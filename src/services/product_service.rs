use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::products::{
        BulkDeleteRequest, BulkDeleteResponse, CreateProductRequest, ProductList,
        UpdateProductRequest,
    },
    entity::{
        categories::Entity as Categories,
        products::{ActiveModel, Column, Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthAdmin,
    models::{Product, ProductWithCategory},
    response::{ApiResponse, Meta},
    routes::params::{ProductQuery, ProductSort, StockFilter},
    services::category_service::category_from_entity,
    state::AppState,
};

/// Stock levels strictly between zero and this count as "low".
pub const LOW_STOCK_THRESHOLD: i32 = 10;

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();

    if let Some(search) = query.q.as_ref().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        condition = condition.add(Expr::col(Column::Name).ilike(contains_pattern(search)));
    }

    if let Some(category_id) = query.category_id {
        condition = condition.add(Column::CategoryId.eq(category_id));
    }

    match query.stock {
        Some(StockFilter::Low) => {
            condition = condition
                .add(Column::StockLevel.gt(0))
                .add(Column::StockLevel.lt(LOW_STOCK_THRESHOLD));
        }
        Some(StockFilter::Out) => {
            condition = condition.add(Column::StockLevel.eq(0));
        }
        None => {}
    }

    let mut finder = Products::find().filter(condition);
    finder = match query.sort.unwrap_or(ProductSort::Newest) {
        ProductSort::Newest => finder.order_by_desc(Column::CreatedAt),
        ProductSort::Oldest => finder.order_by_asc(Column::CreatedAt),
        ProductSort::NameAsc => finder.order_by_asc(Column::Name),
        ProductSort::NameDesc => finder.order_by_desc(Column::Name),
        ProductSort::PriceAsc => finder.order_by_asc(Column::Price),
        ProductSort::PriceDesc => finder.order_by_desc(Column::Price),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .find_also_related(Categories)
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|(product, category)| ProductWithCategory {
            product: product_from_entity(product),
            category: category.map(category_from_entity),
        })
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Products", ProductList { items }, Some(meta)))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<ProductWithCategory>> {
    let result = Products::find_by_id(id)
        .find_also_related(Categories)
        .one(&state.orm)
        .await?;
    let (product, category) = match result {
        Some(found) => found,
        None => return Err(AppError::NotFound),
    };
    let data = ProductWithCategory {
        product: product_from_entity(product),
        category: category.map(category_from_entity),
    };
    Ok(ApiResponse::success("Product", data, None))
}

/// Loads the products with the given ids. Unknown ids are skipped.
pub async fn find_products(state: &AppState, ids: &[Uuid]) -> AppResult<Vec<Product>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let products = Products::find()
        .filter(Column::Id.is_in(ids.iter().copied()))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(product_from_entity)
        .collect();
    Ok(products)
}

pub async fn create_product(
    state: &AppState,
    admin: &AuthAdmin,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    let name = validate_name(&payload.name)?;
    validate_price(payload.price)?;
    let stock_level = payload.stock_level.unwrap_or(0);
    validate_stock(stock_level)?;
    if let Some(category_id) = payload.category_id {
        ensure_category_exists(state, category_id).await?;
    }

    let now = Utc::now();
    let active = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        description: Set(non_empty(payload.description)),
        price: Set(payload.price),
        image_url: Set(non_empty(payload.image_url)),
        category_id: Set(payload.category_id),
        stock_level: Set(Some(stock_level)),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };
    let product = active.insert(&state.orm).await?;

    audit::record(
        &state.pool,
        admin.admin_id,
        "product_create",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Product created",
        product_from_entity(product),
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    state: &AppState,
    admin: &AuthAdmin,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    let existing = Products::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(validate_name(&name)?);
    }
    if let Some(price) = payload.price {
        validate_price(price)?;
        active.price = Set(price);
    }
    if let Some(description) = payload.description {
        active.description = Set(non_empty(description));
    }
    if let Some(category_id) = payload.category_id {
        if let Some(category_id) = category_id {
            ensure_category_exists(state, category_id).await?;
        }
        active.category_id = Set(category_id);
    }
    if let Some(stock_level) = payload.stock_level {
        validate_stock(stock_level)?;
        active.stock_level = Set(Some(stock_level));
    }
    if let Some(image_url) = payload.image_url {
        active.image_url = Set(non_empty(image_url));
    }
    active.updated_at = Set(Utc::now().into());

    let product = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        admin.admin_id,
        "product_update",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Updated",
        product_from_entity(product),
        Some(Meta::empty()),
    ))
}

pub async fn delete_product(
    state: &AppState,
    admin: &AuthAdmin,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = Products::delete_by_id(id).exec(&state.orm).await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.pool,
        admin.admin_id,
        "product_delete",
        "products",
        serde_json::json!({ "product_id": id }),
    )
    .await;

    Ok(ApiResponse::ack("Deleted"))
}

pub async fn bulk_delete_products(
    state: &AppState,
    admin: &AuthAdmin,
    payload: BulkDeleteRequest,
) -> AppResult<ApiResponse<BulkDeleteResponse>> {
    if payload.ids.is_empty() {
        return Err(AppError::BadRequest("ids must not be empty".into()));
    }

    let result = Products::delete_many()
        .filter(Column::Id.is_in(payload.ids.iter().copied()))
        .exec(&state.orm)
        .await?;

    audit::record(
        &state.pool,
        admin.admin_id,
        "product_bulk_delete",
        "products",
        serde_json::json!({ "product_ids": payload.ids, "deleted": result.rows_affected }),
    )
    .await;

    Ok(ApiResponse::success(
        format!("{} products deleted", result.rows_affected),
        BulkDeleteResponse {
            deleted: result.rows_affected,
        },
        Some(Meta::empty()),
    ))
}

async fn ensure_category_exists(state: &AppState, id: Uuid) -> AppResult<()> {
    if Categories::find_by_id(id).one(&state.orm).await?.is_none() {
        return Err(AppError::BadRequest("category not found".into()));
    }
    Ok(())
}

fn validate_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("Product name is required".into()));
    }
    Ok(name.to_string())
}

fn validate_price(price: Decimal) -> AppResult<()> {
    if price <= Decimal::ZERO {
        return Err(AppError::BadRequest("Price must be positive".into()));
    }
    Ok(())
}

fn validate_stock(stock_level: i32) -> AppResult<()> {
    if stock_level < 0 {
        return Err(AppError::BadRequest("Stock cannot be negative".into()));
    }
    Ok(())
}

/// `%term%` with LIKE wildcards in the term matched literally.
fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub(crate) fn product_from_entity(model: ProductModel) -> Product {
    Product {
        id: model.id,
        name: model.name,
        description: model.description,
        price: model.price,
        image_url: model.image_url,
        category_id: model.category_id,
        stock_level: model.stock_level,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
