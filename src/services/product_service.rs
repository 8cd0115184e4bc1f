use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use sea_orm::sea_query::LockType;
use uuid::Uuid;

use crate::{
    dto::products::{
        CreateProductRequest, ProductFormSchema, ProductList, UpdateProductRequest,
    },
    entity::{
        Categories,
        product_versions::{Column as VersionCol, Entity as ProductVersions},
        products::{self, ActiveModel, Column, Entity as Products},
    },
    error::{AppError, AppResult},
    forms::{ProductForm, moderation_permissions},
    middleware::auth::{AuthUser, ensure_owner_or_staff},
    models::{Product, ProductDetail, ProductVersion, ProductWithVersion},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    services::{
        permission_service::load_permissions,
        version_service::{
            apply_version_ops, load_versions, plan_version_changes, verify_single_current,
        },
    },
    state::AppState,
    validation::{FieldErrors, check_forbidden_words, check_price, check_required},
};

pub const PRODUCTS_PER_PAGE: i64 = 10;

/// Published products with their current version, served from the
/// listing cache.
pub async fn list_products(
    state: &AppState,
    pagination: Pagination,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = pagination.normalize(PRODUCTS_PER_PAGE);

    let catalog = state
        .product_cache
        .get_or_load(|| load_catalog(&state.orm))
        .await?;

    let published: Vec<&ProductWithVersion> = catalog
        .iter()
        .filter(|entry| entry.product.is_published)
        .collect();
    let total = published.len() as i64;

    let items = published
        .into_iter()
        .skip(offset as usize)
        .take(limit as usize)
        .cloned()
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Products", ProductList { items }, Some(meta)))
}

/// The full product collection, newest first, each with its current version.
pub async fn load_catalog<C: ConnectionTrait>(db: &C) -> AppResult<Vec<ProductWithVersion>> {
    let products = Products::find()
        .order_by_desc(Column::CreatedAt)
        .all(db)
        .await?;

    let mut current: HashMap<Uuid, ProductVersion> = ProductVersions::find()
        .filter(VersionCol::IsCurrent.eq(true))
        .all(db)
        .await?
        .into_iter()
        .map(|v| (v.product_id, ProductVersion::from(v)))
        .collect();

    Ok(products
        .into_iter()
        .map(|model| {
            let current_version = current.remove(&model.id);
            ProductWithVersion {
                product: Product::from(model),
                current_version,
            }
        })
        .collect())
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<ProductDetail>> {
    let product = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let detail = load_detail(&state.orm, product).await?;
    Ok(ApiResponse::success("Product", detail, None))
}

/// Fields the acting user may see and submit.
pub async fn product_form(
    state: &AppState,
    user: &AuthUser,
    create: bool,
) -> AppResult<ApiResponse<ProductFormSchema>> {
    let perms = load_permissions(&state.orm, user).await?;
    let form = if create {
        ProductForm::for_create(&perms)
    } else {
        ProductForm::for_edit(&perms)
    };
    Ok(ApiResponse::success(
        "Product form",
        ProductFormSchema {
            mode: form.mode(),
            fields: form.fields(),
        },
        Some(Meta::empty()),
    ))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<ProductDetail>> {
    let perms = load_permissions(&state.orm, user).await?;
    ProductForm::for_create(&perms).check_submitted(payload.submitted_fields())?;

    let mut errors = FieldErrors::new();
    let name = payload.name.trim().to_string();
    check_required("name", &name, 100, &mut errors);
    check_forbidden_words("name", &name, &mut errors);
    let description = payload.description.as_deref().and_then(non_empty);
    if let Some(description) = description.as_deref() {
        check_forbidden_words("description", description, &mut errors);
    }
    check_price("price", payload.price, &mut errors);
    if Categories::find_by_id(payload.category_id)
        .one(&state.orm)
        .await?
        .is_none()
    {
        errors.add("category", "Select a valid category.");
    }
    let ops = match plan_version_changes(&[], &payload.versions) {
        Ok(ops) => ops,
        Err(version_errors) => {
            errors.extend(version_errors);
            Vec::new()
        }
    };
    errors.into_result()?;

    let txn = state.orm.begin().await?;
    let product = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        description: Set(description),
        preview: Set(payload.preview.as_deref().and_then(non_empty)),
        price: Set(payload.price),
        category_id: Set(payload.category_id),
        owner_id: Set(Some(user.user_id)),
        is_published: Set(payload.is_published.unwrap_or(true)),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    apply_version_ops(&txn, product.id, ops).await?;
    verify_single_current(&txn, product.id).await?;
    let detail = load_detail(&txn, product).await?;
    txn.commit().await?;
    state.product_cache.invalidate().await;

    tracing::info!(product_id = %detail.product.id, user_id = %user.user_id, "product created");
    Ok(ApiResponse::success(
        "Product created",
        detail,
        Some(Meta::empty()),
    ))
}

/// Applies the product fields and the version formset atomically: either
/// everything is stored or, on any validation failure, nothing is.
pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<ProductDetail>> {
    let perms = load_permissions(&state.orm, user).await?;
    ProductForm::for_edit(&perms).check_submitted(payload.submitted_fields())?;

    let txn = state.orm.begin().await?;
    let existing = lock_product(&txn, id).await?;
    if !(user.owns(existing.owner_id)
        || user.is_admin()
        || perms.has_any(&moderation_permissions()))
    {
        return Err(AppError::Forbidden);
    }

    let mut errors = FieldErrors::new();
    let name = payload.name.as_deref().map(str::trim);
    if let Some(name) = name {
        check_required("name", name, 100, &mut errors);
        check_forbidden_words("name", name, &mut errors);
    }
    let description = payload.description.as_deref().map(non_empty);
    if let Some(Some(description)) = description.as_ref() {
        check_forbidden_words("description", description, &mut errors);
    }
    if let Some(price) = payload.price {
        check_price("price", price, &mut errors);
    }
    if let Some(category_id) = payload.category_id {
        if Categories::find_by_id(category_id).one(&txn).await?.is_none() {
            errors.add("category", "Select a valid category.");
        }
    }
    let versions = load_versions(&txn, id).await?;
    let ops = match plan_version_changes(&versions, &payload.versions) {
        Ok(ops) => ops,
        Err(version_errors) => {
            errors.extend(version_errors);
            Vec::new()
        }
    };
    errors.into_result()?;

    let mut active: ActiveModel = existing.into();
    if let Some(name) = name {
        active.name = Set(name.to_string());
    }
    if let Some(description) = description {
        active.description = Set(description);
    }
    if let Some(preview) = payload.preview.as_deref() {
        active.preview = Set(non_empty(preview));
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(category_id) = payload.category_id {
        active.category_id = Set(category_id);
    }
    if let Some(is_published) = payload.is_published {
        active.is_published = Set(is_published);
    }
    active.updated_at = Set(Utc::now().fixed_offset());

    let product = active.update(&txn).await?;
    apply_version_ops(&txn, id, ops).await?;
    verify_single_current(&txn, id).await?;
    let detail = load_detail(&txn, product).await?;
    txn.commit().await?;
    state.product_cache.invalidate().await;

    Ok(ApiResponse::success(
        "Updated",
        detail,
        Some(Meta::empty()),
    ))
}

pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let product = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_owner_or_staff(user, product.owner_id)?;

    let result = Products::delete_by_id(id).exec(&state.orm).await?;
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

/// Loads the product row with `SELECT ... FOR UPDATE`; concurrent edits of
/// the same product (and its versions) queue behind the holder.
pub async fn lock_product<C: ConnectionTrait>(db: &C, id: Uuid) -> AppResult<products::Model> {
    Products::find_by_id(id)
        .lock(LockType::Update)
        .one(db)
        .await?
        .ok_or(AppError::NotFound)
}

async fn load_detail<C: ConnectionTrait>(
    db: &C,
    product: products::Model,
) -> AppResult<ProductDetail> {
    let versions = load_versions(db, product.id).await?;
    let current_version = versions.iter().find(|v| v.is_current).cloned();
    Ok(ProductDetail {
        product: Product::from(product),
        current_version,
        versions,
    })
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
