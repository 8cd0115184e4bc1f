use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignGroupRequest {
    pub group: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserGroups {
    pub user_id: Uuid,
    pub groups: Vec<String>,
}
