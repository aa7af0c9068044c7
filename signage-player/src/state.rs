//! Shared player state
//!
//! State shared between the playback engine, the scheduler and the HTTP
//! layer: the player state snapshot and the notification hub.

use signage_common::{ContentId, NotificationHub, PlayerState, SignageEvent, Subscription};
use tokio::sync::RwLock;

/// Shared state accessible by all components
///
/// The player state is written only by the playback engine.
pub struct SharedState {
    player_state: RwLock<PlayerState>,

    hub: NotificationHub,
}

impl SharedState {
    /// Create shared state with a hub of the given per-subscriber capacity
    pub fn new(event_queue_capacity: usize) -> Self {
        Self {
            player_state: RwLock::new(PlayerState::new()),
            hub: NotificationHub::new(event_queue_capacity),
        }
    }

    /// Snapshot of the player state
    pub async fn player_state(&self) -> PlayerState {
        self.player_state.read().await.clone()
    }

    pub async fn volume(&self) -> u8 {
        self.player_state.read().await.volume
    }

    pub(crate) async fn set_volume(&self, volume: u8) {
        self.player_state.write().await.set_volume(volume);
    }

    pub(crate) async fn set_current(&self, content_id: Option<ContentId>, is_playing: bool) {
        self.player_state
            .write()
            .await
            .set_current(content_id, is_playing);
    }

    /// Publish an event to all subscribers, returning how many accepted it
    pub fn publish(&self, event: SignageEvent) -> usize {
        self.hub.publish(event)
    }

    pub fn subscribe(&self) -> Subscription {
        self.hub.subscribe()
    }

    pub fn hub(&self) -> &NotificationHub {
        &self.hub
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new(signage_common::events::DEFAULT_SUBSCRIBER_CAPACITY)
    }
}
