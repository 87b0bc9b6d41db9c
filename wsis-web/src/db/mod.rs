//! Database access layer for wsis-web
//!
//! SQLite persistence for users, the persisted session, and weekly
//! reports. Schema creation is idempotent; the service initializes its
//! own database on first run.

use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;
use wsis_common::Result;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // Enable foreign keys
    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    // WAL mode: concurrent readers with one writer (SSE snapshot reloads
    // run alongside form submissions)
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;

    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// Create all tables (idempotent - safe to call multiple times)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_users_table(pool).await?;
    create_settings_table(pool).await?;
    create_weekly_reports_table(pool).await?;
    Ok(())
}

async fn create_users_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            guid TEXT PRIMARY KEY,
            kind TEXT NOT NULL DEFAULT 'anonymous' CHECK (kind IN ('anonymous', 'token')),
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Key-value settings; holds the persisted session among other values
async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_weekly_reports_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS weekly_reports (
            guid TEXT PRIMARY KEY,
            app_id TEXT NOT NULL,
            user_id TEXT NOT NULL REFERENCES users(guid) ON DELETE CASCADE,
            reporting_week TEXT NOT NULL,
            site_name TEXT NOT NULL,
            proof_link TEXT,
            categories TEXT NOT NULL,
            created_at TEXT NOT NULL,
            CHECK (length(reporting_week) = 8)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Namespace scan is the hot query (every snapshot reload)
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_weekly_reports_namespace ON weekly_reports(app_id, user_id)",
    )
    .execute(pool)
    .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_weekly_reports_week ON weekly_reports(reporting_week)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
