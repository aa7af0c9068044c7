//! Content registry
//!
//! Keyed store of content descriptors. The scheduler resolves playlist ids
//! through it and falls back to [`ContentRegistry::list`] when no playlist
//! is set, so `list` order is the fallback playback order.

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use signage_common::{ContentDescriptor, ContentId};

use crate::error::Result;

pub use memory::MemoryRegistry;
pub use sqlite::SqliteRegistry;

#[async_trait]
pub trait ContentRegistry: Send + Sync {
    async fn get(&self, id: ContentId) -> Result<Option<ContentDescriptor>>;

    /// All descriptors in stable insertion order
    async fn list(&self) -> Result<Vec<ContentDescriptor>>;

    /// Insert a descriptor (replacing one with the same id)
    async fn put(&self, content: ContentDescriptor) -> Result<()>;

    /// Remove a descriptor, returning it if it was present
    async fn delete(&self, id: ContentId) -> Result<Option<ContentDescriptor>>;
}
