//! Product versions and the "at most one current version per product" rule.
//!
//! Every change to the versions of a product goes through the same steps
//! inside one transaction that holds the product row lock: the final state
//! is planned in memory and rejected when it would have more than one
//! current version, the writes are applied with demotions before
//! promotions, and the stored count is checked again before commit.

use std::collections::{HashMap, HashSet};

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    db::is_unique_violation,
    dto::versions::{CreateVersionRequest, UpdateVersionRequest, VersionEdit},
    entity::product_versions::{ActiveModel as VersionActive, Column, Entity as ProductVersions},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_owner_or_staff},
    models::ProductVersion,
    response::{ApiResponse, Meta},
    services::product_service::lock_product,
    state::AppState,
    validation::{FieldErrors, check_required},
};

pub const SINGLE_CURRENT_MESSAGE: &str = "Only one current version is allowed per product.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionOp {
    Delete(Uuid),
    Update {
        id: Uuid,
        version_number: String,
        version_name: String,
        is_current: bool,
    },
    Insert {
        id: Uuid,
        version_number: String,
        version_name: String,
        is_current: bool,
    },
}

impl VersionOp {
    pub fn is_promotion(&self) -> bool {
        matches!(
            self,
            VersionOp::Update { is_current: true, .. } | VersionOp::Insert { is_current: true, .. }
        )
    }

    fn write_order(&self) -> u8 {
        match self {
            VersionOp::Delete(_) => 0,
            _ if self.is_promotion() => 2,
            _ => 1,
        }
    }
}

/// Plans a version formset against the versions the product has now.
/// Errors are keyed `versions[i].<field>`.
pub fn plan_version_changes(
    existing: &[ProductVersion],
    edits: &[VersionEdit],
) -> Result<Vec<VersionOp>, FieldErrors> {
    plan(existing, edits, |index, field| match field {
        Some(field) => format!("versions[{index}].{field}"),
        None => format!("versions[{index}]"),
    })
}

fn plan_single(existing: &[ProductVersion], edit: VersionEdit) -> Result<Vec<VersionOp>, FieldErrors> {
    plan(existing, &[edit], |_, field| {
        field.unwrap_or(FieldErrors::NON_FIELD).to_string()
    })
}

fn plan(
    existing: &[ProductVersion],
    edits: &[VersionEdit],
    key: impl Fn(usize, Option<&str>) -> String,
) -> Result<Vec<VersionOp>, FieldErrors> {
    let mut errors = FieldErrors::new();
    let mut ops = Vec::with_capacity(edits.len());
    let mut seen: HashSet<Uuid> = HashSet::new();
    let mut final_flags: HashMap<Uuid, bool> =
        existing.iter().map(|v| (v.id, v.is_current)).collect();

    for (index, edit) in edits.iter().enumerate() {
        match edit.id {
            Some(id) => {
                let Some(version) = existing.iter().find(|v| v.id == id) else {
                    errors.add(&key(index, None), "Unknown version for this product.");
                    continue;
                };
                if !seen.insert(id) {
                    errors.add(&key(index, None), "Version submitted more than once.");
                    continue;
                }
                if edit.delete {
                    final_flags.remove(&id);
                    ops.push(VersionOp::Delete(id));
                    continue;
                }
                let version_number = edit
                    .version_number
                    .as_deref()
                    .unwrap_or(&version.version_number)
                    .trim()
                    .to_string();
                let version_name = edit
                    .version_name
                    .as_deref()
                    .unwrap_or(&version.version_name)
                    .trim()
                    .to_string();
                check_required(&key(index, Some("version_number")), &version_number, 50, &mut errors);
                check_required(&key(index, Some("version_name")), &version_name, 150, &mut errors);
                let is_current = edit.is_current.unwrap_or(version.is_current);
                final_flags.insert(id, is_current);
                ops.push(VersionOp::Update {
                    id,
                    version_number,
                    version_name,
                    is_current,
                });
            }
            // An empty extra row marked for deletion is simply dropped.
            None if edit.delete => continue,
            None => {
                let version_number = edit.version_number.as_deref().unwrap_or("").trim().to_string();
                let version_name = edit.version_name.as_deref().unwrap_or("").trim().to_string();
                check_required(&key(index, Some("version_number")), &version_number, 50, &mut errors);
                check_required(&key(index, Some("version_name")), &version_name, 150, &mut errors);
                let id = Uuid::new_v4();
                let is_current = edit.is_current.unwrap_or(false);
                final_flags.insert(id, is_current);
                ops.push(VersionOp::Insert {
                    id,
                    version_number,
                    version_name,
                    is_current,
                });
            }
        }
    }

    if final_flags.values().filter(|current| **current).count() > 1 {
        errors.add(FieldErrors::NON_FIELD, SINGLE_CURRENT_MESSAGE);
    }
    if !errors.is_empty() {
        return Err(errors);
    }

    ops.sort_by_key(VersionOp::write_order);
    Ok(ops)
}

pub async fn load_versions<C: ConnectionTrait>(
    db: &C,
    product_id: Uuid,
) -> AppResult<Vec<ProductVersion>> {
    Ok(ProductVersions::find()
        .filter(Column::ProductId.eq(product_id))
        .order_by_asc(Column::VersionNumber)
        .all(db)
        .await?
        .into_iter()
        .map(ProductVersion::from)
        .collect())
}

pub async fn count_current<C: ConnectionTrait>(db: &C, product_id: Uuid) -> AppResult<u64> {
    Ok(ProductVersions::find()
        .filter(Column::ProductId.eq(product_id))
        .filter(Column::IsCurrent.eq(true))
        .count(db)
        .await?)
}

pub async fn verify_single_current<C: ConnectionTrait>(db: &C, product_id: Uuid) -> AppResult<()> {
    if count_current(db, product_id).await? > 1 {
        return Err(AppError::Validation(FieldErrors::non_field(
            SINGLE_CURRENT_MESSAGE,
        )));
    }
    Ok(())
}

/// Writes planned ops; callers run this inside the transaction that holds
/// the product lock.
pub async fn apply_version_ops<C: ConnectionTrait>(
    db: &C,
    product_id: Uuid,
    ops: Vec<VersionOp>,
) -> AppResult<()> {
    for op in ops {
        let result = match op {
            VersionOp::Delete(id) => ProductVersions::delete_many()
                .filter(Column::Id.eq(id))
                .filter(Column::ProductId.eq(product_id))
                .exec(db)
                .await
                .map(|_| ()),
            VersionOp::Update {
                id,
                version_number,
                version_name,
                is_current,
            } => ProductVersions::update_many()
                .col_expr(Column::VersionNumber, Expr::value(version_number))
                .col_expr(Column::VersionName, Expr::value(version_name))
                .col_expr(Column::IsCurrent, Expr::value(is_current))
                .filter(Column::Id.eq(id))
                .filter(Column::ProductId.eq(product_id))
                .exec(db)
                .await
                .map(|_| ()),
            VersionOp::Insert {
                id,
                version_number,
                version_name,
                is_current,
            } => VersionActive {
                id: Set(id),
                product_id: Set(product_id),
                version_number: Set(version_number),
                version_name: Set(version_name),
                is_current: Set(is_current),
            }
            .insert(db)
            .await
            .map(|_| ()),
        };

        result.map_err(|err| {
            if is_unique_violation(&err) {
                AppError::Validation(FieldErrors::non_field(SINGLE_CURRENT_MESSAGE))
            } else {
                AppError::OrmError(err)
            }
        })?;
    }
    Ok(())
}

/// Plans, writes and re-checks a single version edit.
pub async fn apply_version_edits<C: ConnectionTrait>(
    db: &C,
    product_id: Uuid,
    edit: VersionEdit,
) -> AppResult<()> {
    let existing = load_versions(db, product_id).await?;
    let ops = plan_single(&existing, edit).map_err(AppError::Validation)?;
    apply_version_ops(db, product_id, ops).await?;
    verify_single_current(db, product_id).await
}

pub async fn create_version(
    state: &AppState,
    user: &AuthUser,
    payload: CreateVersionRequest,
) -> AppResult<ApiResponse<ProductVersion>> {
    let txn = state.orm.begin().await?;
    let product = lock_product(&txn, payload.product_id)
        .await
        .map_err(|err| match err {
            AppError::NotFound => {
                AppError::Validation(FieldErrors::single("product_id", "Select a valid product."))
            }
            other => other,
        })?;
    ensure_owner_or_staff(user, product.owner_id)?;

    let existing = load_versions(&txn, product.id).await?;
    let ops = plan_single(
        &existing,
        VersionEdit::new_version(
            &payload.version_number,
            &payload.version_name,
            payload.is_current,
        ),
    )
    .map_err(AppError::Validation)?;
    let new_id = ops.iter().find_map(|op| match op {
        VersionOp::Insert { id, .. } => Some(*id),
        _ => None,
    });
    apply_version_ops(&txn, product.id, ops).await?;
    verify_single_current(&txn, product.id).await?;

    let version = match new_id {
        Some(id) => ProductVersions::find_by_id(id).one(&txn).await?,
        None => None,
    }
    .ok_or_else(|| AppError::Internal(anyhow::anyhow!("created version not found")))?;
    txn.commit().await?;
    state.product_cache.invalidate().await;

    Ok(ApiResponse::success(
        "Version created",
        ProductVersion::from(version),
        Some(Meta::empty()),
    ))
}

pub async fn update_version(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateVersionRequest,
) -> AppResult<ApiResponse<ProductVersion>> {
    let version = ProductVersions::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let txn = state.orm.begin().await?;
    let product = lock_product(&txn, version.product_id).await?;
    ensure_owner_or_staff(user, product.owner_id)?;

    apply_version_edits(
        &txn,
        product.id,
        VersionEdit {
            id: Some(id),
            version_number: payload.version_number,
            version_name: payload.version_name,
            is_current: payload.is_current,
            delete: false,
        },
    )
    .await?;

    let updated = ProductVersions::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    txn.commit().await?;
    state.product_cache.invalidate().await;

    Ok(ApiResponse::success(
        "Updated",
        ProductVersion::from(updated),
        Some(Meta::empty()),
    ))
}

pub async fn delete_version(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let version = ProductVersions::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let txn = state.orm.begin().await?;
    let product = lock_product(&txn, version.product_id).await?;
    ensure_owner_or_staff(user, product.owner_id)?;
    apply_version_edits(&txn, product.id, VersionEdit::remove(id)).await?;
    txn.commit().await?;
    state.product_cache.invalidate().await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
