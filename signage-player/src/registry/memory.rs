//! In-memory registry

use async_trait::async_trait;
use signage_common::{ContentDescriptor, ContentId};
use std::sync::RwLock;

use super::ContentRegistry;
use crate::error::{Error, Result};

/// Registry held in process memory, listing in insertion order
#[derive(Default)]
pub struct MemoryRegistry {
    entries: RwLock<Vec<ContentDescriptor>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> Error {
    Error::Internal("content registry lock poisoned".to_string())
}

#[async_trait]
impl ContentRegistry for MemoryRegistry {
    async fn get(&self, id: ContentId) -> Result<Option<ContentDescriptor>> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries.iter().find(|c| c.id == id).cloned())
    }

    async fn list(&self) -> Result<Vec<ContentDescriptor>> {
        Ok(self.entries.read().map_err(poisoned)?.clone())
    }

    async fn put(&self, content: ContentDescriptor) -> Result<()> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        match entries.iter_mut().find(|c| c.id == content.id) {
            Some(existing) => *existing = content,
            None => entries.push(content),
        }
        Ok(())
    }

    async fn delete(&self, id: ContentId) -> Result<Option<ContentDescriptor>> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        let removed = entries
            .iter()
            .position(|c| c.id == id)
            .map(|index| entries.remove(index));
        Ok(removed)
    }
}
