//! Configuration for signage-player
//!
//! Bootstrap configuration loaded from a TOML file. Every key is optional;
//! built-in defaults are defined in code. Command-line arguments and
//! environment variables (see `main.rs`) override the file.
//!
//! ```toml
//! port = 8000
//! idle_backoff_secs = 5
//!
//! [fade]
//! window_ms = 300
//! steps = 15
//!
//! [renderer]
//! mpv_binary = "mpv"
//! browser_binary = "chromium-browser"
//! ```

use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::time::Duration;

use crate::playback::fader::AudioFade;

/// Bootstrap configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// HTTP server port
    pub port: u16,

    /// Address the HTTP server binds to (overridden by `--service`)
    pub bind_address: IpAddr,

    /// Root folder for database, logs and stored content (optional)
    pub root_folder: Option<PathBuf>,

    /// Slot duration for uploads that do not specify one (seconds)
    pub default_duration_secs: u32,

    /// Wait before re-checking when there is nothing to play (seconds)
    pub idle_backoff_secs: u64,

    /// Undelivered events queued per event-stream subscriber
    pub event_queue_capacity: usize,

    /// Largest accepted upload (megabytes)
    pub max_upload_mb: usize,

    pub fade: FadeConfig,

    pub renderer: RendererConfig,
}

/// Audio fade applied when switching render targets
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FadeConfig {
    /// Length of one fade ramp (milliseconds)
    pub window_ms: u64,

    /// Number of linear volume steps per ramp
    pub steps: u32,

    /// Volume a video fades in to (0-100)
    pub target_volume: u8,
}

/// External renderer processes
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// mpv executable used for images and videos
    pub mpv_binary: String,

    /// Unix socket for mpv's JSON IPC
    pub ipc_socket: PathBuf,

    /// mpv `hwdec` value used when hardware decode is requested
    pub hwdec: String,

    /// Extra arguments passed to mpv at launch
    pub mpv_args: Vec<String>,

    /// Browser executable used for web content
    pub browser_binary: String,

    /// Browser flags (kiosk mode, GPU acceleration); the URI is appended
    pub browser_flags: Vec<String>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            bind_address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            root_folder: None,
            default_duration_secs: signage_common::content::DEFAULT_DURATION_SECS,
            idle_backoff_secs: 5,
            event_queue_capacity: signage_common::events::DEFAULT_SUBSCRIBER_CAPACITY,
            max_upload_mb: 512,
            fade: FadeConfig::default(),
            renderer: RendererConfig::default(),
        }
    }
}

impl Default for FadeConfig {
    fn default() -> Self {
        Self {
            window_ms: 300,
            steps: 15,
            target_volume: 100,
        }
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            mpv_binary: "mpv".to_string(),
            ipc_socket: std::env::temp_dir().join("signage-mpv.sock"),
            hwdec: "auto".to_string(),
            mpv_args: Vec::new(),
            browser_binary: "chromium-browser".to_string(),
            browser_flags: default_browser_flags(),
        }
    }
}

fn default_browser_flags() -> Vec<String> {
    [
        "--kiosk",
        "--noerrdialogs",
        "--disable-infobars",
        "--no-first-run",
        "--enable-features=VaapiVideoDecoder",
        "--use-gl=egl",
        "--ignore-gpu-blocklist",
        "--disable-quic",
        "--enable-fast-unload",
        "--enable-tcp-fast-open",
        "--disable-features=TranslateUI",
        "--disk-cache-size=64000000",
        "--disable-component-extensions-with-background-pages",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl PlayerConfig {
    pub fn idle_backoff(&self) -> Duration {
        Duration::from_secs(self.idle_backoff_secs.max(1))
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}

impl FadeConfig {
    pub fn to_fade(&self) -> AudioFade {
        AudioFade::new(Duration::from_millis(self.window_ms), self.steps)
    }
}
