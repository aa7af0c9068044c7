//! Event catalogue and notification fan-out
//!
//! # Architecture
//!
//! Observers (SSE clients, tests, future integrations) register with the
//! [`NotificationHub`] and receive every [`SignageEvent`] published after
//! they subscribed. Each subscriber owns a bounded queue:
//!
//! - Delivery is at-most-once per subscriber per `publish` call
//! - A subscriber whose queue is closed (receiver dropped) or full
//!   (consumer lagging past the cap) is unregistered on the spot
//! - Failures are never reported back to the publisher
//! - Ordering holds within one subscriber's queue, not across subscribers

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

use crate::content::{ContentDescriptor, ContentId};

/// Default number of undelivered events queued per subscriber
pub const DEFAULT_SUBSCRIBER_CAPACITY: usize = 64;

/// State-change events broadcast to observers
///
/// Serialized as `{"type": "<snake_case name>", ...payload}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SignageEvent {
    /// A descriptor was registered
    ContentAdded {
        content: ContentDescriptor,
    },

    /// A descriptor was removed from the registry
    ContentDeleted {
        content_id: ContentId,
    },

    /// The playlist was replaced (ids that were actually retained)
    PlaylistUpdated {
        content_ids: Vec<ContentId>,
    },

    /// The scheduler dispatched a new slot to the playback engine
    NowPlaying {
        content_id: ContentId,
        name: String,
    },
}

impl SignageEvent {
    /// Value of the `type` discriminator
    pub fn event_type(&self) -> &'static str {
        match self {
            SignageEvent::ContentAdded { .. } => "content_added",
            SignageEvent::ContentDeleted { .. } => "content_deleted",
            SignageEvent::PlaylistUpdated { .. } => "playlist_updated",
            SignageEvent::NowPlaying { .. } => "now_playing",
        }
    }
}

/// Identifier handed out by [`NotificationHub::subscribe`]
pub type SubscriberId = u64;

/// A registered subscriber's receiving end
///
/// Dropping the subscription closes its queue; the hub forgets it on the
/// next publish.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriberId,
    rx: mpsc::Receiver<SignageEvent>,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Wait for the next event (None once the hub dropped this subscriber)
    pub async fn recv(&mut self) -> Option<SignageEvent> {
        self.rx.recv().await
    }

    /// Take the next queued event without waiting
    pub fn try_recv(&mut self) -> Option<SignageEvent> {
        self.rx.try_recv().ok()
    }

    /// Give up the subscription wrapper, keeping the raw receiver
    pub fn into_receiver(self) -> mpsc::Receiver<SignageEvent> {
        self.rx
    }
}

struct Subscriber {
    id: SubscriberId,
    tx: mpsc::Sender<SignageEvent>,
}

/// Best-effort fan-out broadcaster
pub struct NotificationHub {
    subscribers: Mutex<Vec<Subscriber>>,
    next_id: AtomicU64,
    capacity: usize,
}

impl NotificationHub {
    /// Create a hub whose subscribers each queue at most `capacity` events
    pub fn new(capacity: usize) -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            capacity: capacity.max(1),
        }
    }

    /// Register a new subscriber
    ///
    /// Only events published after this call are received.
    pub fn subscribe(&self) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(self.capacity);

        let mut subscribers = self.lock();
        subscribers.push(Subscriber { id, tx });
        debug!("Subscriber {} registered ({} total)", id, subscribers.len());

        Subscription { id, rx }
    }

    /// Remove a subscriber; returns false if it was already gone
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let mut subscribers = self.lock();
        let before = subscribers.len();
        subscribers.retain(|s| s.id != id);
        before != subscribers.len()
    }

    /// Deliver `event` to every registered subscriber
    ///
    /// Returns how many subscribers accepted the event. Subscribers whose
    /// delivery fails are dropped silently.
    pub fn publish(&self, event: SignageEvent) -> usize {
        let mut subscribers = self.lock();
        let mut delivered = 0;

        subscribers.retain(|subscriber| match subscriber.tx.try_send(event.clone()) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                warn!(
                    "Subscriber {} fell {} events behind, dropping it",
                    subscriber.id, self.capacity
                );
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!("Subscriber {} disconnected, dropping it", subscriber.id);
                false
            }
        });

        debug!("Published {} to {} subscribers", event.event_type(), delivered);
        delivered
    }

    /// Current number of registered subscribers
    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    /// Per-subscriber queue capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Subscriber>> {
        // A panic while holding the lock cannot leave the Vec half-updated
        self.subscribers.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new(DEFAULT_SUBSCRIBER_CAPACITY)
    }
}
