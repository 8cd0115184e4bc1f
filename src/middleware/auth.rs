use axum::{extract::FromRequestParts, http::header};
use jsonwebtoken::{DecodingKey, Validation, decode};
use sea_orm::EntityTrait;
use uuid::Uuid;

use crate::{
    dto::auth::Claims,
    entity::{Users, users},
    error::AppError,
    state::AppState,
};

/// The authenticated account behind a bearer token. Extraction re-reads the
/// user row, so deactivated accounts and changed flags apply immediately.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl AuthUser {
    pub fn from_model(user: &users::Model) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            is_staff: user.is_staff,
            is_superuser: user.is_superuser,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.is_staff || self.is_superuser
    }

    pub fn owns(&self, owner_id: Option<Uuid>) -> bool {
        owner_id == Some(self.user_id)
    }
}

pub fn ensure_staff(user: &AuthUser) -> Result<(), AppError> {
    if !user.is_admin() {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub fn ensure_superuser(user: &AuthUser) -> Result<(), AppError> {
    if !user.is_superuser {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub fn ensure_owner_or_staff(user: &AuthUser, owner_id: Option<Uuid>) -> Result<(), AppError> {
    if user.owns(owner_id) || user.is_admin() {
        return Ok(());
    }
    Err(AppError::Forbidden)
}

pub fn decode_token(secret: &str, token: &str) -> Result<Uuid, AppError> {
    let decoded = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Unauthorized)?;

    Ok(decoded.claims.sub)
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or(AppError::Unauthorized)?;

        let auth_str = auth_header.to_str().map_err(|_| AppError::Unauthorized)?;

        let token = auth_str
            .strip_prefix("Bearer ")
            .ok_or(AppError::Unauthorized)?
            .trim();

        let user_id = decode_token(&state.config.jwt_secret, token)?;

        let user = Users::find_by_id(user_id)
            .one(&state.orm)
            .await?
            .filter(|user| user.is_active)
            .ok_or(AppError::Unauthorized)?;

        Ok(AuthUser::from_model(&user))
    }
}
