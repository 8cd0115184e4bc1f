use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get, post, put},
};
use uuid::Uuid;

use crate::{
    dto::products::{
        CreateProductRequest, ProductFormQuery, ProductFormSchema, ProductList,
        UpdateProductRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::ProductDetail,
    response::ApiResponse,
    routes::params::Pagination,
    services::product_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products))
        .route("/new_product", post(create_product))
        .route("/product/form", get(product_form))
        .route("/product/{id}", get(get_product))
        .route("/product/{id}/edit", put(update_product))
        .route("/product/{id}/delete", delete(delete_product))
}

#[utoipa::path(
    get,
    path = "/",
    params(Pagination),
    responses(
        (status = 200, description = "Published products with their current version", body = ApiResponse<ProductList>)
    ),
    tag = "Products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = product_service::list_products(&state, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/product/{id}",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Get product", body = ApiResponse<ProductDetail>),
        (status = 401, description = "Login required"),
        (status = 404, description = "Product not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ProductDetail>>> {
    let resp = product_service::get_product(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/product/form",
    params(
        ("create" = Option<bool>, Query, description = "Describe the create form instead of the edit form")
    ),
    responses(
        (status = 200, description = "Fields the current user may submit", body = ApiResponse<ProductFormSchema>)
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn product_form(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ProductFormQuery>,
) -> AppResult<Json<ApiResponse<ProductFormSchema>>> {
    let resp = product_service::product_form(&state, &user, query.create).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/new_product",
    request_body = CreateProductRequest,
    responses(
        (status = 200, description = "Create product", body = ApiResponse<ProductDetail>),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Field not allowed"),
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateProductRequest>,
) -> AppResult<Json<ApiResponse<ProductDetail>>> {
    let resp = product_service::create_product(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/product/{id}/edit",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Updated product", body = ApiResponse<ProductDetail>),
        (status = 400, description = "Validation failed, nothing stored"),
        (status = 403, description = "Not allowed to edit this product or field"),
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn update_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductRequest>,
) -> AppResult<Json<ApiResponse<ProductDetail>>> {
    let resp = product_service::update_product(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/product/{id}/delete",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Deleted product")
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = product_service::delete_product(&state, &user, id).await?;
    Ok(Json(resp))
}
