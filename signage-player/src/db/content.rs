//! Content descriptor queries

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use signage_common::{ContentDescriptor, ContentId, ContentType};
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite};
use uuid::Uuid;

const SELECT_COLUMNS: &str =
    "SELECT id, name, content_type, path, duration, created_at, file_hash FROM content";

/// Insert a descriptor, updating in place when the id exists
pub async fn save_content(db: &Pool<Sqlite>, content: &ContentDescriptor) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO content
            (id, name, content_type, path, duration, created_at, file_hash)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            content_type = excluded.content_type,
            path = excluded.path,
            duration = excluded.duration,
            created_at = excluded.created_at,
            file_hash = excluded.file_hash
        "#,
    )
    .bind(content.id.to_string())
    .bind(&content.name)
    .bind(content.content_type.as_str())
    .bind(&content.path)
    .bind(i64::from(content.duration))
    .bind(content.created_at)
    .bind(&content.file_hash)
    .execute(db)
    .await?;

    Ok(())
}

pub async fn get_content(db: &Pool<Sqlite>, id: ContentId) -> Result<Option<ContentDescriptor>> {
    let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_COLUMNS))
        .bind(id.to_string())
        .fetch_optional(db)
        .await?;

    row.map(|r| row_to_descriptor(&r)).transpose()
}

/// All descriptors, oldest first (ties in insertion order)
pub async fn list_content(db: &Pool<Sqlite>) -> Result<Vec<ContentDescriptor>> {
    let rows = sqlx::query(&format!("{} ORDER BY created_at, rowid", SELECT_COLUMNS))
        .fetch_all(db)
        .await?;

    rows.iter().map(row_to_descriptor).collect()
}

/// Delete a descriptor, returning it if it existed
pub async fn delete_content(db: &Pool<Sqlite>, id: ContentId) -> Result<Option<ContentDescriptor>> {
    let mut tx = db.begin().await?;

    let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_COLUMNS))
        .bind(id.to_string())
        .fetch_optional(&mut *tx)
        .await?;

    let Some(row) = row else {
        return Ok(None);
    };
    let content = row_to_descriptor(&row)?;

    sqlx::query("DELETE FROM content WHERE id = ?")
        .bind(id.to_string())
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(Some(content))
}

fn row_to_descriptor(row: &SqliteRow) -> Result<ContentDescriptor> {
    let id: String = row.get("id");
    let id = Uuid::parse_str(&id)
        .map_err(|e| Error::Internal(format!("Invalid content id '{}' in database: {}", id, e)))?;

    let content_type: String = row.get("content_type");
    let content_type: ContentType = content_type.parse()?;

    let duration: i64 = row.get("duration");
    let duration = u32::try_from(duration)
        .map_err(|_| Error::Internal(format!("Invalid duration {} for content {}", duration, id)))?;

    let created_at: DateTime<Utc> = row.get("created_at");

    Ok(ContentDescriptor {
        id,
        name: row.get("name"),
        content_type,
        path: row.get("path"),
        duration,
        created_at,
        file_hash: row.get("file_hash"),
    })
}
