//! Player state model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ContentId;

/// Snapshot of what the display is currently rendering
///
/// Written only by the playback engine; everyone else reads copies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    /// Content currently on screen (or the last attempted content if it failed)
    pub current_content: Option<ContentId>,
    /// Whether the current render target started successfully
    pub is_playing: bool,
    /// Output volume, 0-100
    pub volume: u8,
    /// When any of the above last changed
    pub last_update: DateTime<Utc>,
}

impl PlayerState {
    /// Maximum output volume
    pub const MAX_VOLUME: u8 = 100;

    /// Idle, silent state
    pub fn new() -> Self {
        Self {
            current_content: None,
            is_playing: false,
            volume: 0,
            last_update: Utc::now(),
        }
    }

    /// Record an output volume change (clamped to 0-100)
    pub fn set_volume(&mut self, volume: u8) {
        self.volume = volume.min(Self::MAX_VOLUME);
        self.last_update = Utc::now();
    }

    /// Record the content the engine just dispatched
    pub fn set_current(&mut self, content_id: Option<ContentId>, is_playing: bool) {
        self.current_content = content_id;
        self.is_playing = is_playing;
        self.last_update = Utc::now();
    }
}

impl Default for PlayerState {
    fn default() -> Self {
        Self::new()
    }
}
