//! Render backends
//!
//! The playback engine drives three kinds of render target through the traits
//! below. Production implementations are [`MpvRenderer`] (images and video)
//! and [`KioskBrowser`] (web pages); tests substitute recording fakes.

pub mod browser;
pub mod mpv;

use async_trait::async_trait;
use std::sync::Arc;
use tokio::process::Child;

use crate::error::Result;

pub use browser::KioskBrowser;
pub use mpv::MpvRenderer;

/// Fullscreen video output with volume control
#[async_trait]
pub trait VideoRenderer: Send + Sync {
    /// Start playing `path`, looping and with hardware decode when requested
    async fn play(&self, path: &str, looping: bool, hw_accel: bool) -> Result<()>;

    /// Set the output volume (0-100)
    async fn set_volume(&self, volume: u8) -> Result<()>;

    async fn stop(&self) -> Result<()>;
}

/// Fullscreen still-image output
#[async_trait]
pub trait ImageRenderer: Send + Sync {
    async fn show(&self, path: &str) -> Result<()>;

    async fn clear(&self) -> Result<()>;
}

/// Kiosk-mode browser processes, one per web slot
#[async_trait]
pub trait WebRenderer: Send + Sync {
    /// Spawn a browser showing `uri`
    async fn open(&self, uri: &str) -> Result<WebProcess>;

    /// Terminate exactly the process `open` returned
    async fn close(&self, process: WebProcess) -> Result<()>;
}

/// Handle to one spawned browser process
#[derive(Debug)]
pub struct WebProcess {
    pid: Option<u32>,
    child: Option<Child>,
}

impl WebProcess {
    /// Wrap a child this process spawned and owns
    pub fn spawned(child: Child) -> Self {
        Self {
            pid: child.id(),
            child: Some(child),
        }
    }

    /// Refer to a process by pid only (supervised elsewhere)
    pub fn from_pid(pid: u32) -> Self {
        Self {
            pid: Some(pid),
            child: None,
        }
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn child_mut(&mut self) -> Option<&mut Child> {
        self.child.as_mut()
    }
}

/// The set of backends one playback engine dispatches to
#[derive(Clone)]
pub struct Renderers {
    pub video: Arc<dyn VideoRenderer>,
    pub image: Arc<dyn ImageRenderer>,
    pub web: Arc<dyn WebRenderer>,
}
