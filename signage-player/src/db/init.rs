//! Database initialization functions
//!
//! Opens the SQLite pool and creates the tables the player needs.

use crate::error::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Open (creating if missing) the database at `path` and ensure the schema
pub async fn connect(path: &Path) -> Result<Pool<Sqlite>> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(5))
        .connect_with(options)
        .await?;

    info!("Connected to database: {}", path.display());

    init_schema(&pool).await?;
    Ok(pool)
}

/// Create the `content` table if it does not exist
pub async fn init_schema(pool: &Pool<Sqlite>) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS content (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            content_type TEXT NOT NULL,
            path TEXT NOT NULL,
            duration INTEGER NOT NULL,
            created_at TIMESTAMP NOT NULL,
            file_hash TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
