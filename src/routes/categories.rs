use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get},
};
use uuid::Uuid;

use crate::{
    dto::categories::{CategoryList, CreateCategoryRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Category,
    response::ApiResponse,
    services::category_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route("/{id}", delete(delete_category))
}

#[utoipa::path(
    get,
    path = "/categories",
    responses(
        (status = 200, description = "All categories", body = ApiResponse<CategoryList>)
    ),
    tag = "Categories"
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<CategoryList>>> {
    let resp = category_service::list_categories(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 200, description = "Create category", body = ApiResponse<Category>),
        (status = 403, description = "Staff only"),
    ),
    security(("bearer_auth" = [])),
    tag = "Categories"
)]
pub async fn create_category(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateCategoryRequest>,
) -> AppResult<Json<ApiResponse<Category>>> {
    let resp = category_service::create_category(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/categories/{id}",
    params(
        ("id" = Uuid, Path, description = "Category ID")
    ),
    responses(
        (status = 200, description = "Deleted category and its products"),
        (status = 403, description = "Staff only"),
    ),
    security(("bearer_auth" = [])),
    tag = "Categories"
)]
pub async fn delete_category(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = category_service::delete_category(&state, &user, id).await?;
    Ok(Json(resp))
}
