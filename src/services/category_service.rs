use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::{
    audit,
    dto::categories::{CategoryList, CreateCategoryRequest, UpdateCategoryRequest},
    entity::categories::{ActiveModel, Column, Entity as Categories, Model as CategoryModel},
    error::{AppError, AppResult},
    middleware::auth::AuthAdmin,
    models::Category,
    response::{ApiResponse, Meta},
    state::AppState,
    storage::{ObjectStorage, object_name_from_url},
};

pub async fn list_categories(state: &AppState) -> AppResult<ApiResponse<CategoryList>> {
    let items: Vec<Category> = Categories::find()
        .order_by_asc(Column::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(category_from_entity)
        .collect();
    Ok(ApiResponse::success(
        "Categories",
        CategoryList { items },
        Some(Meta::empty()),
    ))
}

pub async fn create_category(
    state: &AppState,
    admin: &AuthAdmin,
    payload: CreateCategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    let name = validate_name(&payload.name)?;
    ensure_name_free(state, &name, None).await?;
    let now = Utc::now();
    let category = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        image_url: Set(payload.image_url.filter(|s| !s.trim().is_empty())),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        admin.admin_id,
        "category_create",
        "categories",
        serde_json::json!({ "category_id": category.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Category created",
        category_from_entity(category),
        Some(Meta::empty()),
    ))
}

pub async fn update_category(
    state: &AppState,
    admin: &AuthAdmin,
    id: Uuid,
    payload: UpdateCategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    let existing = Categories::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let previous_image = existing.image_url.clone();

    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name {
        let name = validate_name(&name)?;
        ensure_name_free(state, &name, Some(id)).await?;
        active.name = Set(name);
    }
    let mut replaced_image = None;
    if let Some(image_url) = payload.image_url {
        let image_url = image_url.filter(|s| !s.trim().is_empty());
        if image_url != previous_image {
            replaced_image = previous_image;
        }
        active.image_url = Set(image_url);
    }
    active.updated_at = Set(Utc::now().into());
    let category = active.update(&state.orm).await?;

    if let Some(old) = replaced_image {
        remove_image(state, &old).await;
    }

    audit::record(
        &state.pool,
        admin.admin_id,
        "category_update",
        "categories",
        serde_json::json!({ "category_id": category.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Updated",
        category_from_entity(category),
        Some(Meta::empty()),
    ))
}

/// Deletes the category; products referencing it lose their category. The stored image
/// is removed best-effort.
pub async fn delete_category(
    state: &AppState,
    admin: &AuthAdmin,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let existing = Categories::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    Categories::delete_by_id(id).exec(&state.orm).await?;

    if let Some(image) = existing.image_url.as_deref() {
        remove_image(state, image).await;
    }

    audit::record(
        &state.pool,
        admin.admin_id,
        "category_delete",
        "categories",
        serde_json::json!({ "category_id": id, "name": existing.name }),
    )
    .await;

    Ok(ApiResponse::ack("Deleted"))
}

async fn remove_image(state: &AppState, image_url: &str) {
    let Some(name) = object_name_from_url(image_url) else {
        tracing::debug!(image_url, "category image is not a stored object");
        return;
    };
    if let Err(err) = state.storage.remove(&name).await {
        tracing::warn!(error = %err, image = %name, "failed to remove category image");
    }
}

async fn ensure_name_free(state: &AppState, name: &str, except: Option<Uuid>) -> AppResult<()> {
    let mut finder = Categories::find().filter(Column::Name.eq(name));
    if let Some(id) = except {
        finder = finder.filter(Column::Id.ne(id));
    }
    if finder.one(&state.orm).await?.is_some() {
        return Err(AppError::BadRequest(format!("Category {name} already exists")));
    }
    Ok(())
}

fn validate_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("Category name is required".into()));
    }
    Ok(name.to_string())
}

pub(crate) fn category_from_entity(model: CategoryModel) -> Category {
    Category {
        id: model.id,
        name: model.name,
        image_url: model.image_url,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
