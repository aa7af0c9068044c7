//! Scheduler loop
//!
//! Cycles the playlist forever, handing one descriptor at a time to the
//! playback engine and holding it on screen for its slot duration.
//!
//! # Selection
//!
//! - With a playlist set, entries play in order from the cursor, wrapping
//!   at the end. The cursor advances as soon as an entry is selected, unless
//!   the playlist was replaced in the meantime (the replacement already
//!   rewound it).
//! - With no playlist, the whole registry plays in listing order. This
//!   fallback is never stored as the playlist.
//! - With nothing to play, the loop idles for the backoff and re-checks.
//!
//! Playlist entries whose content has been removed are skipped without
//! waiting. A full pass of such entries idles for the backoff so a playlist
//! of dead ids does not spin.
//!
//! The loop ends when its cancellation token fires; pending waits are
//! interrupted immediately.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use signage_common::{ContentDescriptor, ContentId, PlayerState, SignageEvent};

use super::engine::PlaybackEngine;
use super::playlist::Playlist;
use crate::error::Result;
use crate::registry::ContentRegistry;
use crate::state::SharedState;

/// Outcome of one loop iteration
enum Step {
    /// Content was dispatched; hold it for this long
    Played(Duration),
    /// Dead playlist entry; move on immediately
    Skipped,
    /// Nothing playable right now
    Idle,
    Cancelled,
}

/// Consecutive dead entries seen within one playlist generation
#[derive(Default)]
struct SkipRun {
    generation: u64,
    count: usize,
}

/// Loop-local position: fallback cursor over the registry listing, dead-entry run
#[derive(Default)]
struct LoopCursor {
    fallback: usize,
    skips: SkipRun,
}

/// Playback scheduler and owner of the content-facing operations
pub struct Scheduler {
    registry: Arc<dyn ContentRegistry>,
    engine: Mutex<PlaybackEngine>,
    playlist: RwLock<Playlist>,
    state: Arc<SharedState>,
    idle_backoff: Duration,
}

impl Scheduler {
    pub fn new(
        registry: Arc<dyn ContentRegistry>,
        engine: PlaybackEngine,
        state: Arc<SharedState>,
        idle_backoff: Duration,
    ) -> Self {
        Self {
            registry,
            engine: Mutex::new(engine),
            playlist: RwLock::new(Playlist::new()),
            state,
            idle_backoff,
        }
    }

    pub fn state(&self) -> &Arc<SharedState> {
        &self.state
    }

    /// Run the loop on a new task
    pub fn spawn(self: &Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        let scheduler = Arc::clone(self);
        tokio::spawn(async move { scheduler.run(cancel).await })
    }

    /// Run the loop until `cancel` fires
    pub async fn run(&self, cancel: CancellationToken) {
        info!("Scheduler loop started (idle backoff {:?})", self.idle_backoff);
        let mut cursor = LoopCursor::default();

        loop {
            if cancel.is_cancelled() {
                break;
            }

            let wait = match self.step(&mut cursor, &cancel).await {
                Step::Played(slot) => slot,
                Step::Skipped => continue,
                Step::Idle => self.idle_backoff,
                Step::Cancelled => break,
            };

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(wait) => {}
            }
        }

        info!("Scheduler loop stopped");
    }

    async fn step(&self, cursor: &mut LoopCursor, cancel: &CancellationToken) -> Step {
        let selection = self.playlist.read().await.select();

        let Some(selection) = selection else {
            return self.step_fallback(cursor, cancel).await;
        };

        if !self.playlist.write().await.advance(&selection) {
            debug!("Playlist replaced during selection; cursor already rewound");
        }

        match self.registry.get(selection.id).await {
            Ok(Some(content)) => {
                cursor.skips = SkipRun::default();
                self.play_slot(&content, cancel).await
            }
            Ok(None) => {
                warn!(
                    "Playlist entry {} (index {}) is not in the registry, skipping",
                    selection.id, selection.index
                );

                if cursor.skips.generation != selection.generation {
                    cursor.skips = SkipRun {
                        generation: selection.generation,
                        count: 0,
                    };
                }
                cursor.skips.count += 1;

                if cursor.skips.count >= selection.len {
                    warn!("No playlist entry resolves, idling");
                    cursor.skips.count = 0;
                    Step::Idle
                } else {
                    Step::Skipped
                }
            }
            Err(e) => {
                error!("Registry lookup for {} failed: {}", selection.id, e);
                Step::Idle
            }
        }
    }

    async fn step_fallback(&self, cursor: &mut LoopCursor, cancel: &CancellationToken) -> Step {
        let contents = match self.registry.list().await {
            Ok(contents) => contents,
            Err(e) => {
                error!("Registry listing failed: {}", e);
                return Step::Idle;
            }
        };

        if contents.is_empty() {
            debug!("Nothing to play");
            return Step::Idle;
        }

        let index = cursor.fallback % contents.len();
        cursor.fallback = (index + 1) % contents.len();
        self.play_slot(&contents[index], cancel).await
    }

    async fn play_slot(&self, content: &ContentDescriptor, cancel: &CancellationToken) -> Step {
        if cancel.is_cancelled() {
            return Step::Cancelled;
        }

        self.engine.lock().await.play(content).await;

        self.state.publish(SignageEvent::NowPlaying {
            content_id: content.id,
            name: content.name.clone(),
        });

        Step::Played(content.slot_duration())
    }

    // ========================================
    // Content operations
    // ========================================

    /// Register a descriptor; the playlist is left alone
    pub async fn add_content(&self, content: ContentDescriptor) -> Result<()> {
        self.registry.put(content.clone()).await?;
        info!("Added {} '{}' ({})", content.content_type, content.name, content.id);

        self.state.publish(SignageEvent::ContentAdded { content });
        Ok(())
    }

    /// Remove a descriptor from the registry
    ///
    /// Playlist entries referring to it are left in place and skipped when
    /// reached.
    pub async fn remove_content(&self, id: ContentId) -> Result<Option<ContentDescriptor>> {
        let removed = self.registry.delete(id).await?;

        if let Some(content) = &removed {
            info!("Removed '{}' ({})", content.name, id);
            self.state.publish(SignageEvent::ContentDeleted { content_id: id });
        }

        Ok(removed)
    }

    /// Replace the playlist with the given ids that exist in the registry
    ///
    /// Input order and duplicates are kept; the cursor rewinds to the start.
    /// The item on screen keeps playing until its slot ends. Returns the
    /// retained ids.
    pub async fn set_playlist(&self, ids: Vec<ContentId>) -> Result<Vec<ContentId>> {
        let present: HashSet<ContentId> = self
            .registry
            .list()
            .await?
            .into_iter()
            .map(|content| content.id)
            .collect();

        let requested = ids.len();
        let retained: Vec<ContentId> = ids.into_iter().filter(|id| present.contains(id)).collect();

        self.playlist.write().await.replace(retained.clone());
        info!("Playlist updated: {} of {} entries retained", retained.len(), requested);

        self.state.publish(SignageEvent::PlaylistUpdated {
            content_ids: retained.clone(),
        });
        Ok(retained)
    }

    pub async fn player_state(&self) -> PlayerState {
        self.state.player_state().await
    }

    /// Stored playlist (empty when the registry fallback is in use)
    pub async fn playlist(&self) -> Vec<ContentId> {
        self.playlist.read().await.ids().to_vec()
    }

    pub async fn contents(&self) -> Result<Vec<ContentDescriptor>> {
        self.registry.list().await
    }

    pub async fn get_content(&self, id: ContentId) -> Result<Option<ContentDescriptor>> {
        self.registry.get(id).await
    }

    /// Stop playback and tear down the active target
    pub async fn stop(&self) {
        self.engine.lock().await.stop().await;
    }
}
