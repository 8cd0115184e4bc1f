use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    db::is_unique_violation,
    dto::auth::{Claims, LoginRequest, LoginResponse, RegisterRequest},
    entity::users::{self, ActiveModel as UserActive, Column as UserCol, Entity as Users},
    error::{AppError, AppResult},
    mail::verification_mail,
    models::User,
    response::{ApiResponse, Meta, Notice},
    state::AppState,
    validation::{FieldErrors, check_email, check_new_password},
};

const TOKEN_TTL_HOURS: i64 = 24;

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

pub fn verify_password(password: &str, password_hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Signs a bearer token for `user_id` and returns it with its expiry.
pub fn issue_token(secret: &str, user_id: Uuid) -> AppResult<(String, DateTime<Utc>)> {
    let issued_at = Utc::now();
    let expires_at = issued_at
        .checked_add_signed(Duration::hours(TOKEN_TTL_HOURS))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user_id,
        iat: issued_at.timestamp(),
        exp: expires_at.timestamp(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?;
    Ok((token, expires_at))
}

pub async fn find_user_by_email<C>(db: &C, email: &str) -> AppResult<Option<users::Model>>
where
    C: sea_orm::ConnectionTrait,
{
    Ok(Users::find()
        .filter(UserCol::Email.eq(email))
        .one(db)
        .await?)
}

/// Creates an inactive account and mails its verification link. The insert
/// is only committed once the mail went out.
pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<User>> {
    let RegisterRequest {
        email,
        password1,
        password2,
    } = payload;

    let mut errors = FieldErrors::new();
    let email = check_email("email", &email, &mut errors);
    check_new_password("password2", &password1, &password2, &mut errors);
    let Some(email) = email else {
        return Err(AppError::Validation(errors));
    };
    errors.into_result()?;

    if find_user_by_email(&state.orm, &email).await?.is_some() {
        return Err(AppError::Validation(FieldErrors::single(
            "email",
            "User with this email already exists.",
        )));
    }

    let password_hash = hash_password(&password1)?;

    let txn = state.orm.begin().await?;
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(email),
        password_hash: Set(password_hash),
        is_active: Set(false),
        is_staff: Set(false),
        is_superuser: Set(false),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|err| {
        if is_unique_violation(&err) {
            AppError::Validation(FieldErrors::single(
                "email",
                "User with this email already exists.",
            ))
        } else {
            AppError::OrmError(err)
        }
    })?;

    let mail = verification_mail(
        &state.config.mail_from,
        &state.config.public_base_url,
        &user.email,
        user.id,
    );
    state.mailer.send(mail).await?;
    txn.commit().await?;

    tracing::info!(user_id = %user.id, "user registered, verification pending");
    Ok(ApiResponse::success("User created", User::from(user), None))
}

pub async fn verify_email(state: &AppState, user_id: Uuid) -> AppResult<ApiResponse<Notice>> {
    let user = Users::find_by_id(user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    if !user.is_active {
        let mut active: UserActive = user.into();
        active.is_active = Set(true);
        active.update(&state.orm).await?;
        tracing::info!(user_id = %user_id, "email verified");
    }

    Ok(ApiResponse::success(
        "Verified",
        Notice::new("Email verified successfully"),
        Some(Meta::empty()),
    ))
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let LoginRequest { email, password } = payload;
    let invalid = || AppError::BadRequest("Invalid email or password".into());

    let email = crate::validation::normalize_email(&email).ok_or_else(invalid)?;
    let user = find_user_by_email(&state.orm, &email)
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(&password, &user.password_hash)? || !user.is_active {
        return Err(invalid());
    }

    let (token, expires_at) = issue_token(&state.config.jwt_secret, user.id)?;
    let resp = LoginResponse {
        token: format!("Bearer {}", token),
        expires_at,
    };

    tracing::info!(user_id = %user.id, "user logged in");
    Ok(ApiResponse::success(
        "Logged in",
        resp,
        Some(Meta::empty()),
    ))
}
