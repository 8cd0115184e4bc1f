use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        users::{PasswordResetRequest, ProfileUpdateRequest},
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::User,
    response::{ApiResponse, Notice},
    services::{auth_service, user_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/verify/{id}", get(verify_email))
        .route("/login", post(login))
        .route("/password_reset", post(password_reset))
        .route("/profile/edit", get(get_profile).put(update_profile))
}

#[utoipa::path(
    post,
    path = "/users/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Inactive account created, verification mail sent", body = ApiResponse<User>),
        (status = 400, description = "Validation failed"),
        (status = 500, description = "Verification mail could not be sent"),
    ),
    tag = "Users"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = auth_service::register_user(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/users/verify/{id}",
    params(
        ("id" = Uuid, Path, description = "User ID from the verification link")
    ),
    responses(
        (status = 200, description = "Account activated", body = ApiResponse<Notice>),
        (status = 404, description = "Unknown user"),
    ),
    tag = "Users"
)]
pub async fn verify_email(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Notice>>> {
    let resp = auth_service::verify_email(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/users/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Bearer token", body = ApiResponse<LoginResponse>),
        (status = 400, description = "Invalid email or password"),
    ),
    tag = "Users"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    let resp = auth_service::login_user(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/users/password_reset",
    request_body = PasswordResetRequest,
    responses(
        (status = 200, description = "Same notice whether or not the email is known", body = ApiResponse<Notice>),
    ),
    tag = "Users"
)]
pub async fn password_reset(
    State(state): State<AppState>,
    Json(payload): Json<PasswordResetRequest>,
) -> AppResult<Json<ApiResponse<Notice>>> {
    let resp = user_service::reset_password(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/users/profile/edit",
    responses(
        (status = 200, description = "Current profile", body = ApiResponse<User>),
        (status = 401, description = "Login required"),
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn get_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = user_service::get_profile(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/users/profile/edit",
    request_body = ProfileUpdateRequest,
    responses(
        (status = 200, description = "Updated profile", body = ApiResponse<User>),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Login required"),
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<ProfileUpdateRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = user_service::update_profile(&state, &user, payload).await?;
    Ok(Json(resp))
}
