use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect};
use uuid::Uuid;

use crate::{
    entity::{group_permissions, user_groups, GroupPermissions, UserGroups},
    error::AppResult,
    middleware::auth::AuthUser,
    permissions::PermissionSet,
};

/// Union of the permissions of every group the user belongs to.
pub async fn load_permissions<C>(db: &C, user: &AuthUser) -> AppResult<PermissionSet>
where
    C: ConnectionTrait,
{
    if user.is_superuser {
        return Ok(PermissionSet::superuser());
    }

    let group_ids: Vec<Uuid> = UserGroups::find()
        .select_only()
        .column(user_groups::Column::GroupId)
        .filter(user_groups::Column::UserId.eq(user.user_id))
        .into_tuple()
        .all(db)
        .await?;

    if group_ids.is_empty() {
        return Ok(PermissionSet::none());
    }

    let codenames: Vec<String> = GroupPermissions::find()
        .select_only()
        .column(group_permissions::Column::Codename)
        .filter(group_permissions::Column::GroupId.is_in(group_ids))
        .into_tuple()
        .all(db)
        .await?;

    Ok(PermissionSet::from_codenames(codenames))
}
