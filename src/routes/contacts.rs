use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::contacts::{ContactList, ContactMessageRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::contact_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_contacts).post(submit_message))
}

#[utoipa::path(
    get,
    path = "/contacts",
    responses(
        (status = 200, description = "Contact records", body = ApiResponse<ContactList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Contacts"
)]
pub async fn list_contacts(
    State(state): State<AppState>,
    _user: AuthUser,
) -> AppResult<Json<ApiResponse<ContactList>>> {
    let resp = contact_service::list_contacts(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/contacts",
    request_body = ContactMessageRequest,
    responses(
        (status = 200, description = "Message stored", body = ApiResponse<ContactList>),
        (status = 400, description = "Validation failed"),
    ),
    security(("bearer_auth" = [])),
    tag = "Contacts"
)]
pub async fn submit_message(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(payload): Json<ContactMessageRequest>,
) -> AppResult<Json<ApiResponse<ContactList>>> {
    let resp = contact_service::submit_message(&state, payload).await?;
    Ok(Json(resp))
}
