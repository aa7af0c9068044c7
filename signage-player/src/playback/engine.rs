//! Playback engine
//!
//! Owns the single active render target and switches between targets:
//!
//! 1. If a target is active, ramp the audio down to silence and tear the
//!    target down (stop video, clear image, close the browser process).
//! 2. Dispatch the new descriptor to its backend. Videos start muted, loop
//!    with hardware decode, and ramp up to the target volume. Images and web
//!    pages switch instantly with no audio ramp.
//!
//! Backend failures never propagate: they are logged and recorded in the
//! player state as `is_playing = false` with `current_content` still naming
//! the attempted descriptor.
//!
//! All methods take `&mut self`, so at most one `play`/`stop` runs at a time.

use std::sync::Arc;
use tracing::{debug, error, info, warn};

use signage_common::{ContentDescriptor, ContentId, ContentType};

use super::fader::{AudioFade, FadeDirection};
use crate::error::Result;
use crate::render::{Renderers, WebProcess};
use crate::state::SharedState;

/// Render target currently on screen
#[derive(Debug)]
enum ActiveTarget {
    Video,
    Image,
    Web(WebProcess),
}

impl ActiveTarget {
    fn label(&self) -> &'static str {
        match self {
            ActiveTarget::Video => "video",
            ActiveTarget::Image => "image",
            ActiveTarget::Web(_) => "web",
        }
    }
}

pub struct PlaybackEngine {
    renderers: Renderers,
    state: Arc<SharedState>,
    fade: AudioFade,
    target_volume: u8,
    active: Option<(ContentId, ActiveTarget)>,
}

impl PlaybackEngine {
    pub fn new(renderers: Renderers, state: Arc<SharedState>, fade: AudioFade, target_volume: u8) -> Self {
        Self {
            renderers,
            state,
            fade,
            target_volume: target_volume.min(signage_common::PlayerState::MAX_VOLUME),
            active: None,
        }
    }

    /// Id of the content whose target is currently up
    pub fn active_content(&self) -> Option<ContentId> {
        self.active.as_ref().map(|(id, _)| *id)
    }

    /// Switch the display to `content`
    pub async fn play(&mut self, content: &ContentDescriptor) {
        if let Some((previous, target)) = self.active.take() {
            debug!("Switching from {} ({}) to {}", previous, target.label(), content.id);
            self.fade_out().await;
            self.teardown(target).await;
        }

        match self.start(content).await {
            Ok(target) => {
                info!("Playing {} '{}' ({})", content.content_type, content.name, content.id);
                let is_video = matches!(target, ActiveTarget::Video);
                self.active = Some((content.id, target));
                self.state.set_current(Some(content.id), true).await;

                if is_video {
                    self.fade_in().await;
                }
            }
            Err(e) => {
                error!(
                    "Failed to play {} '{}' ({}): {}",
                    content.content_type, content.name, content.id, e
                );
                self.state.set_current(Some(content.id), false).await;
            }
        }
    }

    /// Silence output, tear down the active target and clear the player state
    pub async fn stop(&mut self) {
        if self.state.volume().await > 0 {
            self.apply_volume(0).await;
        }

        if let Some((id, target)) = self.active.take() {
            info!("Stopping {} ({})", id, target.label());
            self.teardown(target).await;
        }

        self.state.set_current(None, false).await;
    }

    async fn start(&self, content: &ContentDescriptor) -> Result<ActiveTarget> {
        match content.content_type {
            ContentType::Video => {
                self.apply_volume(0).await;
                self.renderers.video.play(&content.path, true, true).await?;
                Ok(ActiveTarget::Video)
            }
            ContentType::Image => {
                self.renderers.image.show(&content.path).await?;
                Ok(ActiveTarget::Image)
            }
            ContentType::Web => {
                let process = self.renderers.web.open(&content.path).await?;
                Ok(ActiveTarget::Web(process))
            }
        }
    }

    async fn teardown(&self, target: ActiveTarget) {
        let label = target.label();
        let result = match target {
            ActiveTarget::Video => self.renderers.video.stop().await,
            ActiveTarget::Image => self.renderers.image.clear().await,
            ActiveTarget::Web(process) => self.renderers.web.close(process).await,
        };

        if let Err(e) = result {
            warn!("Failed to tear down {} target: {}", label, e);
        }
    }

    async fn fade_out(&self) {
        let current = self.state.volume().await;
        if current == 0 {
            return;
        }
        self.ramp(FadeDirection::Out, current).await;
    }

    async fn fade_in(&self) {
        self.ramp(FadeDirection::In, self.target_volume).await;
    }

    async fn ramp(&self, direction: FadeDirection, level: u8) {
        let interval = self.fade.step_interval();
        debug!("Fade {:?} at level {} over {:?}", direction, level, self.fade.window());

        for volume in self.fade.levels(direction, level) {
            if !self.apply_volume(volume).await {
                return;
            }
            tokio::time::sleep(interval).await;
        }
    }

    /// Set output volume, recording it in the player state on success
    async fn apply_volume(&self, volume: u8) -> bool {
        match self.renderers.video.set_volume(volume).await {
            Ok(()) => {
                self.state.set_volume(volume).await;
                true
            }
            Err(e) => {
                warn!("Failed to set volume to {}: {}", volume, e);
                false
            }
        }
    }
}
