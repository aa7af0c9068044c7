//! SQLite-backed registry

use async_trait::async_trait;
use signage_common::{ContentDescriptor, ContentId};
use sqlx::{Pool, Sqlite};
use std::path::Path;

use super::ContentRegistry;
use crate::db;
use crate::error::Result;

/// Registry persisted in the `content` table
#[derive(Clone)]
pub struct SqliteRegistry {
    pool: Pool<Sqlite>,
}

impl SqliteRegistry {
    /// Open the database file, creating it and the schema if needed
    pub async fn connect(path: &Path) -> Result<Self> {
        let pool = db::connect(path).await?;
        Ok(Self { pool })
    }

    /// Use an existing pool, ensuring the schema exists
    pub async fn from_pool(pool: Pool<Sqlite>) -> Result<Self> {
        db::init_schema(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

#[async_trait]
impl ContentRegistry for SqliteRegistry {
    async fn get(&self, id: ContentId) -> Result<Option<ContentDescriptor>> {
        db::content::get_content(&self.pool, id).await
    }

    async fn list(&self) -> Result<Vec<ContentDescriptor>> {
        db::content::list_content(&self.pool).await
    }

    async fn put(&self, content: ContentDescriptor) -> Result<()> {
        db::content::save_content(&self.pool, &content).await
    }

    async fn delete(&self, id: ContentId) -> Result<Option<ContentDescriptor>> {
        db::content::delete_content(&self.pool, id).await
    }
}
