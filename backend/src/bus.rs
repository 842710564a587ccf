//! In-process publish/subscribe bus.
//!
//! Channels are plain names. A subscription matches either one exact channel
//! or, when the pattern ends in `*`, every channel sharing the prefix (so
//! `visibility-requests:*` receives `visibility-requests:alice`). Payloads are
//! JSON strings, mirroring what a broker such as Redis would carry.
//!
//! Each subscriber owns a bounded queue. A publish never waits: when a
//! subscriber's queue is full the message is dropped for that subscriber and
//! a warning is logged. Subscribers whose receiving side has gone away are
//! pruned on the next publish.

use parking_lot::RwLock;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::db::repository::{ErrorContext, RepositoryError, RepositoryResult};

/// Inbound element sets.
pub const ELEMENT_UPDATES: &str = "element-updates";
/// Prefix of per-requester visibility request channels.
pub const VISIBILITY_REQUESTS_PREFIX: &str = "visibility-requests:";
/// Pattern matching every visibility request channel.
pub const VISIBILITY_REQUESTS_PATTERN: &str = "visibility-requests:*";
/// One message per produced sample.
pub const POSITIONS: &str = "positions";
/// One message per completed propagation batch.
pub const BATCH_SUMMARY: &str = "batch-summary";

/// Default per-subscriber queue depth.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// A message as delivered to a subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusMessage {
    pub channel: String,
    pub payload: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Pattern {
    Exact(String),
    Prefix(String),
}

impl Pattern {
    fn parse(pattern: &str) -> Self {
        match pattern.strip_suffix('*') {
            Some(prefix) => Self::Prefix(prefix.to_string()),
            None => Self::Exact(pattern.to_string()),
        }
    }

    fn matches(&self, channel: &str) -> bool {
        match self {
            Self::Exact(name) => name == channel,
            Self::Prefix(prefix) => channel.starts_with(prefix.as_str()),
        }
    }
}

struct Subscriber {
    id: u64,
    pattern: Pattern,
    tx: mpsc::Sender<BusMessage>,
}

struct BusInner {
    subscribers: RwLock<Vec<Subscriber>>,
    capacity: usize,
    next_id: AtomicU64,
    closed: AtomicBool,
}

/// Cheaply cloneable handle to a shared bus.
#[derive(Clone)]
pub struct MessageBus {
    inner: Arc<BusInner>,
}

impl MessageBus {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(BusInner {
                subscribers: RwLock::new(Vec::new()),
                capacity: capacity.max(1),
                next_id: AtomicU64::new(1),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Subscribe to an exact channel or a `prefix*` pattern.
    pub fn subscribe(&self, pattern: &str) -> Subscription {
        let (tx, rx) = mpsc::channel(self.inner.capacity);
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        if !self.is_closed() {
            self.inner.subscribers.write().push(Subscriber {
                id,
                pattern: Pattern::parse(pattern),
                tx,
            });
        }
        debug!(pattern, subscriber = id, "bus subscription created");
        Subscription {
            pattern: pattern.to_string(),
            rx,
        }
    }

    /// Publish a raw payload. Returns how many subscribers received it.
    pub fn publish(&self, channel: &str, payload: impl Into<String>) -> RepositoryResult<usize> {
        if self.is_closed() {
            return Err(RepositoryError::connection_with_context(
                "message bus is closed",
                ErrorContext::new("publish").with_entity("channel").with_entity_id(channel),
            ));
        }

        let payload = payload.into();
        let mut delivered = 0;
        let mut stale = Vec::new();
        {
            let subscribers = self.inner.subscribers.read();
            for subscriber in subscribers.iter().filter(|s| s.pattern.matches(channel)) {
                let message = BusMessage {
                    channel: channel.to_string(),
                    payload: payload.clone(),
                };
                match subscriber.tx.try_send(message) {
                    Ok(()) => delivered += 1,
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        warn!(channel, subscriber = subscriber.id, "subscriber queue full, dropping message");
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => stale.push(subscriber.id),
                }
            }
        }

        if !stale.is_empty() {
            self.inner
                .subscribers
                .write()
                .retain(|s| !stale.contains(&s.id));
            debug!(channel, pruned = stale.len(), "pruned closed subscribers");
        }
        Ok(delivered)
    }

    /// Serialize `value` as JSON and publish it.
    pub fn publish_json<T: Serialize>(&self, channel: &str, value: &T) -> RepositoryResult<usize> {
        let payload = serde_json::to_string(value).map_err(|e| {
            RepositoryError::serialization_with_context(
                e.to_string(),
                ErrorContext::new("publish").with_entity("channel").with_entity_id(channel),
            )
        })?;
        self.publish(channel, payload)
    }

    /// Shut the bus down. Every subscription drains and then ends; later
    /// publishes fail with a connection error.
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
        self.inner.subscribers.write().clear();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.read().len()
    }
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

/// Receiving side of a bus subscription, consumed in delivery order.
pub struct Subscription {
    pattern: String,
    rx: mpsc::Receiver<BusMessage>,
}

impl Subscription {
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Wait for the next message; `None` once the bus is closed and drained.
    pub async fn recv(&mut self) -> Option<BusMessage> {
        self.rx.recv().await
    }

    /// Take a message if one is already queued.
    pub fn try_recv(&mut self) -> Option<BusMessage> {
        self.rx.try_recv().ok()
    }
}
