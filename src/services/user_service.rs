use rand::{Rng, distr::Alphanumeric};
use sea_orm::{ActiveModelTrait, EntityTrait, Set};

use crate::{
    db::is_unique_violation,
    dto::users::{PasswordResetRequest, ProfileUpdateRequest},
    entity::users::{ActiveModel as UserActive, Entity as Users},
    error::{AppError, AppResult},
    mail::new_password_mail,
    middleware::auth::AuthUser,
    models::User,
    response::{ApiResponse, Meta, Notice},
    services::auth_service::{find_user_by_email, hash_password, verify_password},
    state::AppState,
    validation::{FieldErrors, check_email, check_new_password, normalize_email},
};

const RESET_PASSWORD_LEN: usize = 12;
const RESET_NOTICE: &str = "If the email exists in our system, a new password has been sent.";

pub fn generate_password(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Replaces the password of the matching account with a random one and
/// mails it. The response never reveals whether the address is known, and
/// delivery failures are only logged.
pub async fn reset_password(
    state: &AppState,
    payload: PasswordResetRequest,
) -> AppResult<ApiResponse<Notice>> {
    let user = match normalize_email(&payload.email) {
        Some(email) => find_user_by_email(&state.orm, &email).await?,
        None => None,
    };

    if let Some(user) = user {
        let new_password = generate_password(RESET_PASSWORD_LEN);
        let email = user.email.clone();
        let mut active: UserActive = user.into();
        active.password_hash = Set(hash_password(&new_password)?);
        active.update(&state.orm).await?;

        let mail = new_password_mail(&state.config.mail_from, &email, &new_password);
        if let Err(err) = state.mailer.send(mail).await {
            tracing::warn!(error = %err, "password reset mail failed");
        }
    }

    Ok(ApiResponse::success(
        "Password reset",
        Notice::new(RESET_NOTICE),
        Some(Meta::empty()),
    ))
}

pub async fn get_profile(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<User>> {
    let model = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Profile", User::from(model), None))
}

pub async fn update_profile(
    state: &AppState,
    user: &AuthUser,
    payload: ProfileUpdateRequest,
) -> AppResult<ApiResponse<User>> {
    let model = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut errors = FieldErrors::new();

    let email = match payload.email.as_deref() {
        Some(raw) => check_email("email", raw, &mut errors),
        None => None,
    };

    let new_password = if payload.changes_password() {
        match (
            payload.old_password.as_deref(),
            payload.new_password1.as_deref(),
            payload.new_password2.as_deref(),
        ) {
            (Some(old), Some(new1), Some(new2)) => {
                if !verify_password(old, &model.password_hash)? {
                    errors.add("old_password", "Your old password was entered incorrectly.");
                }
                check_new_password("new_password2", new1, new2, &mut errors);
                Some(new1.to_string())
            }
            (old, new1, new2) => {
                for (field, value) in [
                    ("old_password", old),
                    ("new_password1", new1),
                    ("new_password2", new2),
                ] {
                    if value.is_none() {
                        errors.add(field, "This field is required.");
                    }
                }
                None
            }
        }
    } else {
        None
    };

    errors.into_result()?;

    let mut active: UserActive = model.into();
    if let Some(email) = email {
        active.email = Set(email);
    }
    if let Some(avatar) = payload.avatar {
        active.avatar = Set(non_empty(avatar));
    }
    if let Some(phone) = payload.phone {
        active.phone = Set(non_empty(phone));
    }
    if let Some(country) = payload.country {
        active.country = Set(non_empty(country));
    }
    if let Some(password) = new_password {
        active.password_hash = Set(hash_password(&password)?);
    }

    let updated = active.update(&state.orm).await.map_err(|err| {
        if is_unique_violation(&err) {
            AppError::Validation(FieldErrors::single(
                "email",
                "User with this email already exists.",
            ))
        } else {
            AppError::OrmError(err)
        }
    })?;

    Ok(ApiResponse::success(
        "Profile updated",
        User::from(updated),
        Some(Meta::empty()),
    ))
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
