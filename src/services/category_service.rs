use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set};
use uuid::Uuid;

use crate::{
    dto::categories::{CategoryList, CreateCategoryRequest},
    entity::categories::{ActiveModel as CategoryActive, Column, Entity as Categories},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_staff},
    models::Category,
    response::{ApiResponse, Meta},
    state::AppState,
    validation::{FieldErrors, check_required},
};

pub async fn list_categories(state: &AppState) -> AppResult<ApiResponse<CategoryList>> {
    let items: Vec<Category> = Categories::find()
        .order_by_asc(Column::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Category::from)
        .collect();

    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "Categories",
        CategoryList { items },
        Some(Meta::new(1, total.max(1), total)),
    ))
}

pub async fn create_category(
    state: &AppState,
    user: &AuthUser,
    payload: CreateCategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    ensure_staff(user)?;

    let mut errors = FieldErrors::new();
    check_required("name", &payload.name, 100, &mut errors);
    errors.into_result()?;

    let category = CategoryActive {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name.trim().to_string()),
        description: Set(payload.description.filter(|d| !d.trim().is_empty())),
    }
    .insert(&state.orm)
    .await?;

    Ok(ApiResponse::success(
        "Category created",
        Category::from(category),
        Some(Meta::empty()),
    ))
}

/// Deleting a category removes its products (and their versions).
pub async fn delete_category(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_staff(user)?;
    let result = Categories::delete_by_id(id).exec(&state.orm).await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }
    state.product_cache.invalidate().await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
