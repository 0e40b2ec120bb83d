//! Database pool, migrations and reset

use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::config::Config;

/// Tables owned by the application, children first
const APP_TABLES: &[&str] = &["note_collectors", "notes", "papers", "sessions", "users"];

/// Create database connection pool
pub async fn connect(config: &Config) -> anyhow::Result<PgPool> {
    let url = config.database_url()?;
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&url)
        .await?;
    Ok(pool)
}

/// Apply pending migrations
pub async fn migrate(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Drop every application table and rebuild the schema
pub async fn reset(pool: &PgPool) -> anyhow::Result<()> {
    tracing::warn!("Resetting database: dropping {}", APP_TABLES.join(", "));

    let mut tx = pool.begin().await?;
    for table in APP_TABLES {
        sqlx::query(&format!("DROP TABLE IF EXISTS {} CASCADE", table))
            .execute(&mut *tx)
            .await?;
    }
    sqlx::query("DROP TABLE IF EXISTS _sqlx_migrations")
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    migrate(pool).await
}
