//! Test helpers for signage-player integration tests
//!
//! - `FakeRenderers`: records every render call with its (virtual) time
//! - `CountingRegistry`: memory registry that counts lookups and can refuse writes
//! - `Harness`: scheduler wired to the fakes
//! - descriptor builders

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use signage_common::{ContentDescriptor, ContentId, ContentType};
use signage_player::playback::{AudioFade, PlaybackEngine, Scheduler};
use signage_player::registry::{ContentRegistry, MemoryRegistry};
use signage_player::render::{ImageRenderer, Renderers, VideoRenderer, WebProcess, WebRenderer};
use signage_player::{Error, Result, SharedState};

pub const IDLE_BACKOFF: Duration = Duration::from_secs(5);

// ========================================
// Fake renderers
// ========================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderCall {
    Video(String),
    VideoStop,
    Volume(u8),
    Image(String),
    ImageClear,
    WebOpen(String, u32),
    WebClose(u32),
}

impl RenderCall {
    /// Path or URI put on screen by this call, if any
    pub fn shown(&self) -> Option<&str> {
        match self {
            RenderCall::Video(path) | RenderCall::Image(path) | RenderCall::WebOpen(path, _) => {
                Some(path)
            }
            _ => None,
        }
    }
}

/// Image, video and web renderer that records calls instead of rendering
#[derive(Default)]
pub struct FakeRenderers {
    calls: Mutex<Vec<(Instant, RenderCall)>>,
    failing: Mutex<HashSet<String>>,
    next_pid: AtomicU32,
}

impl FakeRenderers {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            next_pid: AtomicU32::new(1000),
            ..Default::default()
        })
    }

    pub fn renderers(self: &Arc<Self>) -> Renderers {
        Renderers {
            video: self.clone(),
            image: self.clone(),
            web: self.clone(),
        }
    }

    /// Make every future render of `path` fail
    pub fn fail_on(&self, path: &str) {
        self.failing.lock().unwrap().insert(path.to_string());
    }

    pub fn calls(&self) -> Vec<RenderCall> {
        self.calls.lock().unwrap().iter().map(|(_, c)| c.clone()).collect()
    }

    pub fn timed_calls(&self) -> Vec<(Instant, RenderCall)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Paths/URIs put on screen, in order
    pub fn shown(&self) -> Vec<String> {
        self.calls()
            .iter()
            .filter_map(|c| c.shown().map(str::to_string))
            .collect()
    }

    /// Paths/URIs put on screen with the time they appeared
    pub fn shown_at(&self) -> Vec<(Instant, String)> {
        self.timed_calls()
            .into_iter()
            .filter_map(|(t, c)| c.shown().map(|p| (t, p.to_string())))
            .collect()
    }

    pub fn volumes(&self) -> Vec<u8> {
        self.calls()
            .iter()
            .filter_map(|c| match c {
                RenderCall::Volume(v) => Some(*v),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: RenderCall) {
        self.calls.lock().unwrap().push((Instant::now(), call));
    }

    fn check(&self, path: &str) -> Result<()> {
        if self.failing.lock().unwrap().contains(path) {
            return Err(Error::Render(format!("cannot render {}", path)));
        }
        Ok(())
    }
}

#[async_trait]
impl VideoRenderer for FakeRenderers {
    async fn play(&self, path: &str, looping: bool, hw_accel: bool) -> Result<()> {
        assert!(looping, "videos are always looped");
        assert!(hw_accel, "videos always request hardware decode");
        self.check(path)?;
        self.record(RenderCall::Video(path.to_string()));
        Ok(())
    }

    async fn set_volume(&self, volume: u8) -> Result<()> {
        self.record(RenderCall::Volume(volume));
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        self.record(RenderCall::VideoStop);
        Ok(())
    }
}

#[async_trait]
impl ImageRenderer for FakeRenderers {
    async fn show(&self, path: &str) -> Result<()> {
        self.check(path)?;
        self.record(RenderCall::Image(path.to_string()));
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.record(RenderCall::ImageClear);
        Ok(())
    }
}

#[async_trait]
impl WebRenderer for FakeRenderers {
    async fn open(&self, uri: &str) -> Result<WebProcess> {
        self.check(uri)?;
        let pid = self.next_pid.fetch_add(1, Ordering::Relaxed);
        self.record(RenderCall::WebOpen(uri.to_string(), pid));
        Ok(WebProcess::from_pid(pid))
    }

    async fn close(&self, process: WebProcess) -> Result<()> {
        let pid = process.pid().unwrap_or_default();
        self.record(RenderCall::WebClose(pid));
        Ok(())
    }
}

// ========================================
// Counting registry
// ========================================

/// Memory registry counting `get` and `list` calls
#[derive(Default)]
pub struct CountingRegistry {
    inner: MemoryRegistry,
    gets: AtomicUsize,
    lists: AtomicUsize,
    puts_refused: AtomicBool,
}

impl CountingRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn lists(&self) -> usize {
        self.lists.load(Ordering::SeqCst)
    }

    /// Make every future `put` fail with a database error
    pub fn refuse_puts(&self) {
        self.puts_refused.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ContentRegistry for CountingRegistry {
    async fn get(&self, id: ContentId) -> Result<Option<ContentDescriptor>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get(id).await
    }

    async fn list(&self) -> Result<Vec<ContentDescriptor>> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        self.inner.list().await
    }

    async fn put(&self, content: ContentDescriptor) -> Result<()> {
        if self.puts_refused.load(Ordering::SeqCst) {
            return Err(Error::Database(sqlx::Error::PoolClosed));
        }
        self.inner.put(content).await
    }

    async fn delete(&self, id: ContentId) -> Result<Option<ContentDescriptor>> {
        self.inner.delete(id).await
    }
}

// ========================================
// Scheduler harness
// ========================================

pub struct Harness {
    pub scheduler: Arc<Scheduler>,
    pub registry: Arc<CountingRegistry>,
    pub fake: Arc<FakeRenderers>,
    pub state: Arc<SharedState>,
    pub cancel: CancellationToken,
}

impl Harness {
    pub fn new() -> Self {
        let fake = FakeRenderers::new();
        let registry = CountingRegistry::new();
        let state = Arc::new(SharedState::default());

        let engine = PlaybackEngine::new(fake.renderers(), Arc::clone(&state), AudioFade::default(), 100);
        let scheduler = Arc::new(Scheduler::new(
            registry.clone(),
            engine,
            Arc::clone(&state),
            IDLE_BACKOFF,
        ));

        Self {
            scheduler,
            registry,
            fake,
            state,
            cancel: CancellationToken::new(),
        }
    }

    pub fn start(&self) -> JoinHandle<()> {
        self.scheduler.spawn(self.cancel.clone())
    }

    /// Register descriptors directly (no event)
    pub async fn register(&self, contents: &[&ContentDescriptor]) {
        for content in contents {
            self.registry.put((*content).clone()).await.unwrap();
        }
    }
}

// ========================================
// Descriptor builders
// ========================================

pub fn image(name: &str, duration: u32) -> ContentDescriptor {
    ContentDescriptor::new(name, ContentType::Image, format!("/content/images/{}", name), duration)
        .unwrap()
}

pub fn video(name: &str, duration: u32) -> ContentDescriptor {
    ContentDescriptor::new(name, ContentType::Video, format!("/content/videos/{}", name), duration)
        .unwrap()
}

pub fn web(name: &str, url: &str, duration: u32) -> ContentDescriptor {
    ContentDescriptor::new(name, ContentType::Web, url, duration).unwrap()
}

/// Sleep on the (paused) test clock
pub async fn advance(duration: Duration) {
    tokio::time::sleep(duration).await;
}
