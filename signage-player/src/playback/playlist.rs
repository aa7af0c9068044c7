//! Playlist model
//!
//! An ordered list of content ids (duplicates allowed) with a cursor. The
//! playlist does not own descriptors, so entries may refer to content that
//! has since been removed. It is only ever replaced wholesale; every
//! replacement bumps `generation` so a scheduler iteration that started
//! before the replacement can tell not to advance the new cursor.

use signage_common::ContentId;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Playlist {
    ids: Vec<ContentId>,
    cursor: usize,
    generation: u64,
}

/// One scheduling decision taken from a playlist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub id: ContentId,
    pub index: usize,
    pub len: usize,
    pub generation: u64,
}

impl Playlist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ids(&self) -> &[ContentId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Replace all entries and rewind the cursor
    pub fn replace(&mut self, ids: Vec<ContentId>) {
        self.ids = ids;
        self.cursor = 0;
        self.generation = self.generation.wrapping_add(1);
    }

    /// Entry under the cursor (revalidated against the current length)
    pub fn select(&self) -> Option<Selection> {
        if self.ids.is_empty() {
            return None;
        }

        let index = self.cursor % self.ids.len();
        Some(Selection {
            id: self.ids[index],
            index,
            len: self.ids.len(),
            generation: self.generation,
        })
    }

    /// Move the cursor past `selection`
    ///
    /// Returns `false` (and leaves the cursor alone) when the playlist was
    /// replaced since the selection was taken.
    pub fn advance(&mut self, selection: &Selection) -> bool {
        if selection.generation != self.generation {
            return false;
        }

        self.cursor = (selection.index + 1) % selection.len;
        true
    }
}
