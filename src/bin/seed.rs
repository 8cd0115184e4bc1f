use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use rust_decimal::Decimal;
use storefront_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
};
use uuid::Uuid;

const CATALOG: [(&str, &str, &str, &str, i64); 5] = [
    ("Electronics", "Gadgets and devices", "Smartphone", "A modern smartphone", 5_000_000),
    ("Clothing", "Apparel for everyone", "Jeans", "Classic blue jeans", 150_000),
    ("Food", "Groceries", "Bread", "Freshly baked bread", 5_000),
    ("Books", "Printed books", "Novel", "A bestselling novel", 30_000),
    ("Toys", "Toys for kids", "Lego", "Building blocks set", 100_000),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm, "migrations").await?;
    let pool = orm.get_postgres_connection_pool();

    let admin_id = ensure_superuser(pool, "admin@example.com", "admin12345").await?;
    seed_catalog(pool).await?;
    seed_contact(pool).await?;

    println!("Seed completed. Superuser ID: {admin_id}");
    Ok(())
}

async fn ensure_superuser(pool: &sqlx::PgPool, email: &str, password: &str) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let (user_id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, password_hash, is_active, is_staff, is_superuser)
        VALUES ($1, $2, $3, TRUE, TRUE, TRUE)
        ON CONFLICT (email) DO UPDATE
            SET is_active = TRUE, is_staff = TRUE, is_superuser = TRUE
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(password_hash)
    .fetch_one(pool)
    .await?;

    println!("Ensured superuser {email}");
    Ok(user_id)
}

/// Replaces the whole catalog with one product per category.
async fn seed_catalog(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM categories").execute(&mut *tx).await?;

    for (category, category_desc, product, product_desc, cents) in CATALOG {
        let category_id = Uuid::new_v4();
        sqlx::query("INSERT INTO categories (id, name, description) VALUES ($1, $2, $3)")
            .bind(category_id)
            .bind(category)
            .bind(category_desc)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO products (id, name, description, price, category_id, is_published)
            VALUES ($1, $2, $3, $4, $5, TRUE)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(product)
        .bind(product_desc)
        .bind(Decimal::new(cents, 2))
        .bind(category_id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    println!("Seeded {} categories and products", CATALOG.len());
    Ok(())
}

async fn seed_contact(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    sqlx::query("DELETE FROM contacts").execute(pool).await?;
    sqlx::query(
        r#"
        INSERT INTO contacts (id, name, email, phone, address)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind("Storefront")
    .bind("info@example.com")
    .bind("+1 555 0100")
    .bind("1 Market Street")
    .execute(pool)
    .await?;

    println!("Seeded contact record");
    Ok(())
}
