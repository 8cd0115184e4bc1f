use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::{
    dto::admin::{AssignGroupRequest, UserGroups as UserGroupsResponse},
    entity::{
        groups::{self, Entity as Groups},
        user_groups::{self, ActiveModel as UserGroupActive, Entity as UserGroups},
        Users,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_superuser},
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn add_user_to_group(
    state: &AppState,
    actor: &AuthUser,
    user_id: Uuid,
    payload: AssignGroupRequest,
) -> AppResult<ApiResponse<UserGroupsResponse>> {
    ensure_superuser(actor)?;
    Users::find_by_id(user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let group = find_group(&state.orm, &payload.group).await?;

    let existing = UserGroups::find_by_id((user_id, group.id))
        .one(&state.orm)
        .await?;
    if existing.is_none() {
        UserGroupActive {
            user_id: Set(user_id),
            group_id: Set(group.id),
        }
        .insert(&state.orm)
        .await?;
        tracing::info!(%user_id, group = %group.name, "user added to group");
    }

    let groups = group_names(&state.orm, user_id).await?;
    Ok(ApiResponse::success(
        "Group assigned",
        UserGroupsResponse { user_id, groups },
        Some(Meta::empty()),
    ))
}

pub async fn remove_user_from_group(
    state: &AppState,
    actor: &AuthUser,
    user_id: Uuid,
    group_name: &str,
) -> AppResult<ApiResponse<UserGroupsResponse>> {
    ensure_superuser(actor)?;
    let group = find_group(&state.orm, group_name).await?;

    let result = UserGroups::delete_by_id((user_id, group.id))
        .exec(&state.orm)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }
    tracing::info!(%user_id, group = %group.name, "user removed from group");

    let groups = group_names(&state.orm, user_id).await?;
    Ok(ApiResponse::success(
        "Group removed",
        UserGroupsResponse { user_id, groups },
        Some(Meta::empty()),
    ))
}

async fn find_group<C: ConnectionTrait>(db: &C, name: &str) -> AppResult<groups::Model> {
    Groups::find()
        .filter(groups::Column::Name.eq(name))
        .one(db)
        .await?
        .ok_or(AppError::NotFound)
}

async fn group_names<C: ConnectionTrait>(db: &C, user_id: Uuid) -> AppResult<Vec<String>> {
    let memberships = UserGroups::find()
        .filter(user_groups::Column::UserId.eq(user_id))
        .find_also_related(Groups)
        .order_by_asc(user_groups::Column::GroupId)
        .all(db)
        .await?;

    let mut names: Vec<String> = memberships
        .into_iter()
        .filter_map(|(_, group)| group.map(|g| g.name))
        .collect();
    names.sort();
    Ok(names)
}
