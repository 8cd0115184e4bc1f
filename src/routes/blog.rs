use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get, post, put},
};

use crate::{
    dto::blog::{BlogList, CreateBlogRequest, UpdateBlogRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Blog,
    response::ApiResponse,
    routes::params::Pagination,
    services::blog_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_posts))
        .route("/new", post(create_post))
        .route("/{slug}", get(view_post))
        .route("/{slug}/edit", put(update_post))
        .route("/{slug}/delete", delete(delete_post))
}

#[utoipa::path(
    get,
    path = "/blog",
    params(Pagination),
    responses(
        (status = 200, description = "Published posts", body = ApiResponse<BlogList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Blog"
)]
pub async fn list_posts(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<BlogList>>> {
    let resp = blog_service::list_published(&state, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/blog/{slug}",
    params(
        ("slug" = String, Path, description = "Post slug")
    ),
    responses(
        (status = 200, description = "Post; counts one view", body = ApiResponse<Blog>),
        (status = 404, description = "Post not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Blog"
)]
pub async fn view_post(
    State(state): State<AppState>,
    user: AuthUser,
    Path(slug): Path<String>,
) -> AppResult<Json<ApiResponse<Blog>>> {
    let resp = blog_service::view_post(&state, &user, &slug).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/blog/new",
    request_body = CreateBlogRequest,
    responses(
        (status = 200, description = "Create post", body = ApiResponse<Blog>),
        (status = 403, description = "Missing add_blog permission"),
    ),
    security(("bearer_auth" = [])),
    tag = "Blog"
)]
pub async fn create_post(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateBlogRequest>,
) -> AppResult<Json<ApiResponse<Blog>>> {
    let resp = blog_service::create_post(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/blog/{slug}/edit",
    params(
        ("slug" = String, Path, description = "Post slug")
    ),
    request_body = UpdateBlogRequest,
    responses(
        (status = 200, description = "Updated post", body = ApiResponse<Blog>),
        (status = 403, description = "Missing change_blog permission"),
    ),
    security(("bearer_auth" = [])),
    tag = "Blog"
)]
pub async fn update_post(
    State(state): State<AppState>,
    user: AuthUser,
    Path(slug): Path<String>,
    Json(payload): Json<UpdateBlogRequest>,
) -> AppResult<Json<ApiResponse<Blog>>> {
    let resp = blog_service::update_post(&state, &user, &slug, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/blog/{slug}/delete",
    params(
        ("slug" = String, Path, description = "Post slug")
    ),
    responses(
        (status = 200, description = "Deleted post"),
        (status = 403, description = "Missing delete_blog permission"),
    ),
    security(("bearer_auth" = [])),
    tag = "Blog"
)]
pub async fn delete_post(
    State(state): State<AppState>,
    user: AuthUser,
    Path(slug): Path<String>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = blog_service::delete_post(&state, &user, &slug).await?;
    Ok(Json(resp))
}
