#![allow(dead_code)]

use std::sync::Arc;

use sea_orm::{ActiveModelTrait, Set};
use storefront_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    entity::users::ActiveModel as UserActive,
    mail::MemoryMailer,
    middleware::auth::AuthUser,
    permissions::Role,
    services::auth_service::hash_password,
    state::AppState,
};
use tokio::sync::Mutex;
use uuid::Uuid;

pub const PASSWORD: &str = "correct horse battery";

static MIGRATED: Mutex<bool> = Mutex::const_new(false);

/// Connects to the test database, or returns `None` so the caller can skip.
/// Tests only ever create rows with fresh ids and emails, so they can run
/// side by side against one database.
pub async fn setup_state() -> anyhow::Result<Option<(AppState, MemoryMailer)>> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run database flows.");
            return Ok(None);
        }
    };

    let orm = create_orm_conn(&database_url).await?;
    {
        let mut migrated = MIGRATED.lock().await;
        if !*migrated {
            run_migrations(&orm, concat!(env!("CARGO_MANIFEST_DIR"), "/migrations")).await?;
            *migrated = true;
        }
    }

    let mailer = MemoryMailer::new();
    let state = AppState::new(
        orm,
        AppConfig::for_database(database_url),
        Arc::new(mailer.clone()),
    );
    Ok(Some((state, mailer)))
}

pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@example.com", Uuid::new_v4().simple())
}

pub async fn create_user(
    state: &AppState,
    prefix: &str,
    is_staff: bool,
    is_superuser: bool,
) -> anyhow::Result<AuthUser> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(unique_email(prefix)),
        password_hash: Set(hash_password(PASSWORD)?),
        is_active: Set(true),
        is_staff: Set(is_staff),
        is_superuser: Set(is_superuser),
        ..Default::default()
    }
    .insert(&state.orm)
    .await?;

    Ok(AuthUser::from_model(&user))
}

/// Creates the role's group when missing and adds the user to it.
pub async fn grant_role(state: &AppState, user: &AuthUser, role: Role) -> anyhow::Result<()> {
    sqlx::query("INSERT INTO groups (id, name) VALUES ($1, $2) ON CONFLICT (name) DO NOTHING")
        .bind(Uuid::new_v4())
        .bind(role.group_name())
        .execute(&state.pool)
        .await?;
    let (group_id,): (Uuid,) = sqlx::query_as("SELECT id FROM groups WHERE name = $1")
        .bind(role.group_name())
        .fetch_one(&state.pool)
        .await?;

    for permission in role.permissions() {
        sqlx::query(
            "INSERT INTO group_permissions (group_id, codename) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(group_id)
        .bind(permission.codename())
        .execute(&state.pool)
        .await?;
    }

    sqlx::query("INSERT INTO user_groups (user_id, group_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
        .bind(user.user_id)
        .bind(group_id)
        .execute(&state.pool)
        .await?;
    Ok(())
}
