use storefront_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    permissions::Role,
};
use uuid::Uuid;

/// Creates the content-manager and moderator groups with their permissions.
/// Running it again only fills in what is missing.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm, "migrations").await?;
    let pool = orm.get_postgres_connection_pool();

    let mut tx = pool.begin().await?;
    for role in Role::ALL {
        sqlx::query("INSERT INTO groups (id, name) VALUES ($1, $2) ON CONFLICT (name) DO NOTHING")
            .bind(Uuid::new_v4())
            .bind(role.group_name())
            .execute(&mut *tx)
            .await?;

        let (group_id,): (Uuid,) = sqlx::query_as("SELECT id FROM groups WHERE name = $1")
            .bind(role.group_name())
            .fetch_one(&mut *tx)
            .await?;

        for permission in role.permissions() {
            sqlx::query(
                r#"
                INSERT INTO group_permissions (group_id, codename)
                VALUES ($1, $2)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(group_id)
            .bind(permission.codename())
            .execute(&mut *tx)
            .await?;
        }

        println!(
            "Group {} ready with {} permissions",
            role.group_name(),
            role.permissions().len()
        );
    }
    tx.commit().await?;

    Ok(())
}
