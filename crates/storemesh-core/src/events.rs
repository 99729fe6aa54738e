//! Store lifecycle events.
//!
//! The [`EventBroadcaster`] is the notification bus the service layer fires
//! into after every successful mutation. It wraps a tokio broadcast channel:
//! multiple subscribers, fire-and-observe semantics, and no return value is
//! consumed by the publisher beyond a debug log.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio::sync::broadcast;

use crate::store::Store;

/// Default buffer size for the broadcast channel. Slow receivers that fall
/// further behind than this lose the oldest events.
const DEFAULT_BUFFER_SIZE: usize = 256;

/// Kind of store lifecycle change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreEventKind {
    /// Store was created.
    Created,
    /// Store was updated.
    Updated,
    /// Store was deleted.
    Deleted,
}

impl StoreEventKind {
    /// String representation of the event kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreEventKind::Created => "created",
            StoreEventKind::Updated => "updated",
            StoreEventKind::Deleted => "deleted",
        }
    }
}

impl std::fmt::Display for StoreEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Event describing a change to a store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreEvent {
    /// Kind of change (created, updated, deleted).
    pub kind: StoreEventKind,
    /// The store as it was written (for deletions: as it was removed).
    pub store: Store,
    /// When the event was emitted.
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl StoreEvent {
    /// Create a new event with the current timestamp.
    pub fn new(kind: StoreEventKind, store: Store) -> Self {
        Self {
            kind,
            store,
            timestamp: OffsetDateTime::now_utc(),
        }
    }

    /// Create a "created" event.
    pub fn created(store: Store) -> Self {
        Self::new(StoreEventKind::Created, store)
    }

    /// Create an "updated" event.
    pub fn updated(store: Store) -> Self {
        Self::new(StoreEventKind::Updated, store)
    }

    /// Create a "deleted" event.
    pub fn deleted(store: Store) -> Self {
        Self::new(StoreEventKind::Deleted, store)
    }
}

/// Broadcaster for store lifecycle events.
///
/// Cloneable and cheap to share; every clone publishes into the same
/// channel. Subscribers only receive events sent after they subscribed.
#[derive(Clone)]
pub struct EventBroadcaster {
    sender: broadcast::Sender<StoreEvent>,
}

impl EventBroadcaster {
    /// Create a broadcaster with the default buffer size.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BUFFER_SIZE)
    }

    /// Create a broadcaster with a custom buffer size.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Create a broadcaster wrapped in an `Arc` for sharing.
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Send an event to all subscribers.
    ///
    /// Returns the number of subscribers that received it; 0 when nobody is
    /// listening, which is not an error.
    pub fn send(&self, event: StoreEvent) -> usize {
        let kind = event.kind;
        let received = self.sender.send(event).unwrap_or_default();
        tracing::debug!(kind = %kind, subscribers = received, "store event emitted");
        received
    }

    /// Send a "store created" event.
    pub fn send_created(&self, store: Store) -> usize {
        self.send(StoreEvent::created(store))
    }

    /// Send a "store updated" event.
    pub fn send_updated(&self, store: Store) -> usize {
        self.send(StoreEvent::updated(store))
    }

    /// Send a "store deleted" event.
    pub fn send_deleted(&self, store: Store) -> usize {
        self.send(StoreEvent::deleted(store))
    }

    /// Subscribe to events emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.sender.subscribe()
    }

    /// Number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscriber_receives_events() {
        let broadcaster = EventBroadcaster::new();
        let mut rx = broadcaster.subscribe();

        let store = Store::new("Main", "https://shop.example.com");
        let received = broadcaster.send_created(store.clone());
        assert_eq!(received, 1);

        let event = rx.recv().await.unwrap();
        assert_eq!(event.kind, StoreEventKind::Created);
        assert_eq!(event.store.id, store.id);
    }

    #[tokio::test]
    async fn send_without_subscribers_is_not_an_error() {
        let broadcaster = EventBroadcaster::new();
        let store = Store::new("Main", "https://shop.example.com");
        assert_eq!(broadcaster.send_deleted(store), 0);
    }

    #[tokio::test]
    async fn multiple_subscribers_all_receive() {
        let broadcaster = EventBroadcaster::new();
        let mut rx1 = broadcaster.subscribe();
        let mut rx2 = broadcaster.subscribe();

        let store = Store::new("Outlet", "https://outlet.example.com");
        assert_eq!(broadcaster.send_updated(store), 2);

        assert_eq!(rx1.recv().await.unwrap().kind, StoreEventKind::Updated);
        assert_eq!(rx2.recv().await.unwrap().kind, StoreEventKind::Updated);
    }

    #[test]
    fn kind_display() {
        assert_eq!(StoreEventKind::Created.as_str(), "created");
        assert_eq!(StoreEventKind::Deleted.to_string(), "deleted");
    }
}
