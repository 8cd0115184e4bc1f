use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::{
    mail::MailError,
    response::{ApiResponse, Meta},
    validation::FieldErrors,
};

pub const LOGIN_URL: &str = "/users/login";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not Found")]
    NotFound,

    #[error("Bad Request {0}")]
    BadRequest(String),

    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    #[error("Authentication required")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Field `{0}` is not editable by this user")]
    FieldNotAllowed(String),

    #[error("Conflict {0}")]
    Conflict(String),

    #[error("Mail delivery failed")]
    Mail(#[from] MailError),

    #[error("Database error")]
    DbError(#[from] sqlx::Error),

    #[error("ORM error")]
    OrmError(#[from] sea_orm::DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden | AppError::FieldNotAllowed(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Mail(_)
            | AppError::DbError(_)
            | AppError::OrmError(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Per-field messages when this is a validation failure.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            AppError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

#[derive(Serialize)]
struct ErrorData {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<FieldErrors>,
    #[serde(skip_serializing_if = "Option::is_none")]
    login_url: Option<&'static str>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            match &self {
                AppError::Mail(err) => tracing::error!(error = %err, "mail transport error"),
                AppError::DbError(err) => tracing::error!(error = %err, "database error"),
                AppError::OrmError(err) => tracing::error!(error = %err, "orm error"),
                AppError::Internal(err) => tracing::error!(error = %err, "internal error"),
                _ => {}
            }
        }

        let message = self.to_string();
        let login_url = matches!(self, AppError::Unauthorized).then_some(LOGIN_URL);
        let fields = match self {
            AppError::Validation(errors) => Some(errors),
            _ => None,
        };

        let body = ApiResponse {
            message: message.clone(),
            data: Some(ErrorData {
                error: message,
                fields,
                login_url,
            }),
            meta: Some(Meta::empty()),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
