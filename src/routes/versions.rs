use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, post, put},
};
use uuid::Uuid;

use crate::{
    dto::versions::{CreateVersionRequest, UpdateVersionRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::ProductVersion,
    response::ApiResponse,
    services::version_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/new", post(create_version))
        .route("/{id}/edit", put(update_version))
        .route("/{id}/delete", delete(delete_version))
}

#[utoipa::path(
    post,
    path = "/versions/new",
    request_body = CreateVersionRequest,
    responses(
        (status = 200, description = "Create version", body = ApiResponse<ProductVersion>),
        (status = 400, description = "Another version is already current"),
        (status = 403, description = "Only the owner or staff"),
    ),
    security(("bearer_auth" = [])),
    tag = "Versions"
)]
pub async fn create_version(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateVersionRequest>,
) -> AppResult<Json<ApiResponse<ProductVersion>>> {
    let resp = version_service::create_version(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/versions/{id}/edit",
    params(
        ("id" = Uuid, Path, description = "Version ID")
    ),
    request_body = UpdateVersionRequest,
    responses(
        (status = 200, description = "Updated version", body = ApiResponse<ProductVersion>),
        (status = 400, description = "Another version is already current"),
        (status = 403, description = "Only the owner or staff"),
        (status = 404, description = "Version not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Versions"
)]
pub async fn update_version(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateVersionRequest>,
) -> AppResult<Json<ApiResponse<ProductVersion>>> {
    let resp = version_service::update_version(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/versions/{id}/delete",
    params(
        ("id" = Uuid, Path, description = "Version ID")
    ),
    responses(
        (status = 200, description = "Deleted version"),
        (status = 403, description = "Only the owner or staff"),
        (status = 404, description = "Version not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Versions"
)]
pub async fn delete_version(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = version_service::delete_version(&state, &user, id).await?;
    Ok(Json(resp))
}
