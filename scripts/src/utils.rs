use crate::config::AppConfig;
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqliteJournalMode},
};
use std::str::FromStr;

/// Renders `file_name` from the migrations directory and runs every statement in it
pub async fn run_migrations(
    db_pool: &SqlitePool,
    migrations_dir: &str,
    file_name: &str,
) -> anyhow::Result<()> {
    let tera = tera::Tera::new(&format!("{migrations_dir}/**/*.sql"))?;

    let migration = tera.render(file_name, &tera::Context::new())?;

    sqlx::raw_sql(&migration).execute(db_pool).await?;
    Ok(())
}

pub async fn setup_sqlite_db_pool(app_config: &AppConfig) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&app_config.db_host)?
        .create_if_missing(true)
        .pragma("foreign_keys", "ON");

    if app_config.is_prod() {
        return Ok(SqlitePool::connect_with(
            options
                .pragma("key", app_config.db_pass_encrypt.clone())
                .pragma("cipher_page_size", "1024")
                .pragma("kdf_iter", "64000")
                .pragma("cipher_hmac_algorithm", "HMAC_SHA1")
                .pragma("cipher_kdf_algorithm", "PBKDF2_HMAC_SHA1")
                .journal_mode(SqliteJournalMode::Delete),
        )
        .await?);
    }

    Ok(SqlitePool::connect_with(options).await?)
}

/// In-memory database with the inbox schema applied
#[cfg(test)]
pub(crate) async fn setup_test_db_pool() -> SqlitePool {
    let db_pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(
            SqliteConnectOptions::from_str("sqlite::memory:")
                .unwrap()
                .pragma("foreign_keys", "ON"),
        )
        .await
        .unwrap();

    sqlx::raw_sql(include_str!("../../migrations/001_inbox.sql"))
        .execute(&db_pool)
        .await
        .unwrap();

    db_pool
}
