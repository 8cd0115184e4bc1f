use anyhow::{Context, Result};
use sea_orm::{
    ConnectionTrait, Database, DatabaseConnection, DbErr, SqlErr, Statement, TransactionTrait,
};
use std::path::{Path, PathBuf};
use tokio::fs;

pub type DbPool = sqlx::PgPool;

const LEDGER_TABLE: &str = "CREATE TABLE IF NOT EXISTS schema_migrations (\
    name TEXT PRIMARY KEY, \
    applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW())";

/// Create a SeaORM connection.
pub async fn create_orm_conn(database_url: &str) -> Result<DatabaseConnection> {
    let conn = Database::connect(database_url).await?;
    Ok(conn)
}

/// Applies the `.sql` files of `dir` that are not yet recorded in
/// `schema_migrations`, in filename order, each inside its own transaction.
/// Returns the names of the files applied by this call.
pub async fn run_migrations(conn: &DatabaseConnection, dir: impl AsRef<Path>) -> Result<Vec<String>> {
    let backend = conn.get_database_backend();
    conn.execute(Statement::from_string(backend, LEDGER_TABLE))
        .await?;

    let mut applied = Vec::new();
    for file in migration_files(dir.as_ref()).await? {
        let name = file
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .with_context(|| format!("bad migration file name {}", file.display()))?;

        let txn = conn.begin().await?;
        // Concurrent runners queue here instead of applying a file twice.
        txn.execute(Statement::from_string(
            backend,
            "LOCK TABLE schema_migrations IN EXCLUSIVE MODE",
        ))
        .await?;
        let seen = txn
            .query_one(Statement::from_sql_and_values(
                backend,
                "SELECT name FROM schema_migrations WHERE name = $1",
                [name.clone().into()],
            ))
            .await?;
        if seen.is_some() {
            continue;
        }

        let sql = fs::read_to_string(&file).await?;
        for stmt in split_statements(&sql) {
            txn.execute(Statement::from_string(backend, stmt))
                .await
                .with_context(|| format!("migration {name} failed"))?;
        }
        txn.execute(Statement::from_sql_and_values(
            backend,
            "INSERT INTO schema_migrations (name) VALUES ($1)",
            [name.clone().into()],
        ))
        .await?;
        txn.commit().await?;

        tracing::info!(migration = %name, "migration applied");
        applied.push(name);
    }

    Ok(applied)
}

async fn migration_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir)
        .await
        .with_context(|| format!("cannot read migrations from {}", dir.display()))?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "sql") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Postgres prepared statements hold a single command, so a migration file
/// is run statement by statement. `--` comment lines are dropped first.
fn split_statements(sql: &str) -> Vec<String> {
    let without_comments: String = sql
        .lines()
        .filter(|line| !line.trim_start().starts_with("--"))
        .collect::<Vec<_>>()
        .join("\n");

    without_comments
        .split(';')
        .map(str::trim)
        .filter(|stmt| !stmt.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
