use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, post},
};
use uuid::Uuid;

use crate::{
    dto::admin::{AssignGroupRequest, UserGroups},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::admin_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/{id}/groups", post(add_user_to_group))
        .route("/users/{id}/groups/{group}", delete(remove_user_from_group))
}

#[utoipa::path(
    post,
    path = "/admin/users/{id}/groups",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    request_body = AssignGroupRequest,
    responses(
        (status = 200, description = "Groups of the user after the change", body = ApiResponse<UserGroups>),
        (status = 403, description = "Superuser only"),
        (status = 404, description = "Unknown user or group"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn add_user_to_group(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignGroupRequest>,
) -> AppResult<Json<ApiResponse<UserGroups>>> {
    let resp = admin_service::add_user_to_group(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/admin/users/{id}/groups/{group}",
    params(
        ("id" = Uuid, Path, description = "User ID"),
        ("group" = String, Path, description = "Group name")
    ),
    responses(
        (status = 200, description = "Groups of the user after the change", body = ApiResponse<UserGroups>),
        (status = 403, description = "Superuser only"),
        (status = 404, description = "Unknown group or membership"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn remove_user_from_group(
    State(state): State<AppState>,
    user: AuthUser,
    Path((id, group)): Path<(Uuid, String)>,
) -> AppResult<Json<ApiResponse<UserGroups>>> {
    let resp = admin_service::remove_user_from_group(&state, &user, id, &group).await?;
    Ok(Json(resp))
}
