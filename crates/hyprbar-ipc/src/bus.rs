//! Event bus fanning parsed events out to subscribers
//!
//! ## Architecture
//!
//! ```text
//! +-------------+   dispatch   +----------+   try_send   +----------------+
//! | EventStream | -----------> | Registry | -----------> | subscriber mpsc |  x N
//! | (reader)    |              | (RwLock) |              | (bounded)       |
//! +-------------+              +----------+              +----------------+
//! ```
//!
//! The registry maps subscriber ids to the sending half of a bounded queue.
//! `dispatch` holds the read lock for one full pass, so concurrent dispatches
//! share it while `subscribe`/`unsubscribe`/`close` wait for the whole pass to
//! finish. A sender is only dropped after it has been removed under the write
//! lock, which means no dispatch can ever hold a sender whose queue is closing.
//!
//! Delivery is best effort: a full queue loses that event for that subscriber
//! only, and `dispatch` never waits on a consumer.

use std::collections::HashMap;
use std::fmt;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};
use std::task::{Context, Poll};

use tokio::sync::mpsc::error::{TryRecvError, TrySendError};
use tokio::sync::{mpsc, Semaphore};
use tokio_stream::Stream;
use tracing::{debug, trace};

use super::Event;

/// Pending events each subscriber may hold before new events are dropped for it
pub const DEFAULT_SUBSCRIBER_CAPACITY: usize = 100;

/// Opaque identity of a subscriber, used for removal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

#[derive(Debug, Default)]
struct Registry {
    subscribers: HashMap<SubscriberId, mpsc::Sender<Event>>,
    closed: bool,
}

#[derive(Debug)]
struct Shared {
    registry: RwLock<Registry>,
    next_id: AtomicU64,
    capacity: usize,
}

impl Shared {
    // A panic while holding the lock cannot leave the map half-updated, so a
    // poisoned lock is still safe to use.
    fn read(&self) -> RwLockReadGuard<'_, Registry> {
        self.registry.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Registry> {
        self.registry.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn remove(&self, id: SubscriberId) -> bool {
        let removed = self.write().subscribers.remove(&id);

        // The write guard is gone; closing the queue now cannot race a dispatch
        match removed {
            Some(sender) => {
                drop(sender);
                debug!(subscriber = %id, "Unsubscribed from Hyprland events");
                true
            }
            None => false,
        }
    }
}

/// Fan-out bus for Hyprland events
///
/// Cloning is cheap; all clones share one registry. The bus is owned by a
/// [`HyprClient`](crate::HyprClient) and closed when the client or its event
/// stream shuts down.
///
/// # Example
///
/// ```ignore
/// let bus = EventBus::new();
/// let mut sub = bus.subscribe();
/// bus.dispatch(&Event::parse("workspace>>3").unwrap());
/// assert_eq!(sub.recv().await.unwrap().kind, "workspace");
/// ```
#[derive(Debug, Clone)]
pub struct EventBus {
    shared: Arc<Shared>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_SUBSCRIBER_CAPACITY)
    }

    /// Create a bus whose subscriber queues hold `capacity` events
    ///
    /// Clamped to what a Tokio channel accepts.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            shared: Arc::new(Shared {
                registry: RwLock::new(Registry::default()),
                next_id: AtomicU64::new(1),
                capacity: capacity.clamp(1, Semaphore::MAX_PERMITS),
            }),
        }
    }

    /// Register a new subscriber
    ///
    /// Never fails. On a closed bus the returned subscription is already at
    /// end-of-stream.
    pub fn subscribe(&self) -> Subscription {
        let id = SubscriberId(self.shared.next_id.fetch_add(1, Ordering::Relaxed));
        let (sender, receiver) = mpsc::channel(self.shared.capacity);

        {
            let mut registry = self.shared.write();
            if registry.closed {
                debug!(subscriber = %id, "Subscribed to a closed event bus");
            } else {
                registry.subscribers.insert(id, sender);
                debug!(subscriber = %id, "Subscribed to Hyprland events");
            }
        }

        Subscription {
            id,
            receiver,
            bus: Arc::downgrade(&self.shared),
        }
    }

    /// Remove a subscriber and close its queue
    ///
    /// Idempotent: unknown or already removed ids are ignored. Returns whether
    /// a subscriber was actually removed. Events queued before removal stay
    /// readable; after them the consumer sees end-of-stream.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        self.shared.remove(id)
    }

    /// Offer `event` to every current subscriber without blocking
    ///
    /// Returns the number of subscribers the event was enqueued for.
    pub fn dispatch(&self, event: &Event) -> usize {
        let registry = self.shared.read();
        if registry.closed {
            return 0;
        }

        let mut delivered = 0;
        for (id, sender) in &registry.subscribers {
            match sender.try_send(event.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    debug!(subscriber = %id, kind = %event.kind, "Subscriber queue full, dropping event");
                }
                Err(TrySendError::Closed(_)) => {
                    // Receiver dropped; its Drop impl removes the entry shortly
                    trace!(subscriber = %id, "Subscriber receiver gone, skipping");
                }
            }
        }

        delivered
    }

    /// Remove and close every subscriber; later dispatches are no-ops
    pub fn close(&self) {
        let drained: Vec<_> = {
            let mut registry = self.shared.write();
            registry.closed = true;
            registry.subscribers.drain().collect()
        };

        if !drained.is_empty() {
            debug!(subscribers = drained.len(), "Event bus closed");
        }
        drop(drained);
    }

    pub fn is_closed(&self) -> bool {
        self.shared.read().closed
    }

    pub fn subscriber_count(&self) -> usize {
        self.shared.read().subscribers.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving end of one bus subscription
///
/// `recv` returns `None` once the subscriber has been removed (or the bus
/// closed) and every queued event has been read. Dropping the subscription
/// unregisters it.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriberId,
    receiver: mpsc::Receiver<Event>,
    bus: Weak<Shared>,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Wait for the next event
    pub async fn recv(&mut self) -> Option<Event> {
        self.receiver.recv().await
    }

    /// Take the next event if one is queued
    pub fn try_recv(&mut self) -> Result<Event, TryRecvError> {
        self.receiver.try_recv()
    }
}

impl Stream for Subscription {
    type Item = Event;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Event>> {
        self.receiver.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(shared) = self.bus.upgrade() {
            shared.remove(self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn event(kind: &str, field: &str) -> Event {
        Event::new(kind, vec![field.to_string()])
    }

    fn drain(sub: &mut Subscription) -> Vec<Event> {
        let mut events = Vec::new();
        while let Ok(event) = sub.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_events_delivered_in_order() {
        let bus = EventBus::new();
        let mut sub = bus.subscribe();

        for i in 0..10 {
            assert_eq!(bus.dispatch(&event("workspace", &i.to_string())), 1);
        }

        for i in 0..10 {
            let received = sub.recv().await.unwrap();
            assert_eq!(received.fields, vec![i.to_string()]);
        }
    }

    #[tokio::test]
    async fn test_huge_capacity_is_clamped() {
        let bus = EventBus::with_capacity(usize::MAX);
        let mut sub = bus.subscribe();

        assert_eq!(bus.dispatch(&event("submap", "resize")), 1);
        assert_eq!(sub.recv().await.unwrap().fields, vec!["resize"]);
    }

    #[test]
    fn test_overflow_dropped_only_for_full_subscriber() {
        let bus = EventBus::with_capacity(2);
        let mut slow = bus.subscribe();
        let mut fast = bus.subscribe();

        bus.dispatch(&event("workspace", "1"));
        bus.dispatch(&event("workspace", "2"));
        assert_eq!(drain(&mut fast).len(), 2);

        // `slow` is full, `fast` has room again
        assert_eq!(bus.dispatch(&event("workspace", "3")), 1);

        let slow_fields: Vec<_> = drain(&mut slow).into_iter().map(|e| e.fields[0].clone()).collect();
        let fast_fields: Vec<_> = drain(&mut fast).into_iter().map(|e| e.fields[0].clone()).collect();
        assert_eq!(slow_fields, vec!["1", "2"]);
        assert_eq!(fast_fields, vec!["3"]);
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_delivery_and_signals_end() {
        let bus = EventBus::new();
        let mut sub = bus.subscribe();

        bus.dispatch(&event("workspace", "1"));
        assert!(bus.unsubscribe(sub.id()));
        assert_eq!(bus.dispatch(&event("workspace", "2")), 0);

        // Queued before removal, still readable; then end-of-stream
        assert_eq!(sub.recv().await.unwrap().fields, vec!["1"]);
        assert!(sub.recv().await.is_none());
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let bus = EventBus::new();
        let sub = bus.subscribe();
        let id = sub.id();

        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        assert!(!bus.unsubscribe(SubscriberId(9999)));
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_dropping_subscription_unregisters() {
        let bus = EventBus::new();
        let sub = bus.subscribe();
        let _other = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        drop(sub);
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn test_close_ends_all_subscriptions() {
        let bus = EventBus::new();
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();

        bus.close();

        assert!(bus.is_closed());
        assert_eq!(bus.subscriber_count(), 0);
        assert!(a.recv().await.is_none());
        assert!(b.recv().await.is_none());
        assert_eq!(bus.dispatch(&event("workspace", "1")), 0);
    }

    #[tokio::test]
    async fn test_subscribe_after_close_is_already_ended() {
        let bus = EventBus::new();
        bus.close();

        let mut sub = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 0);
        assert!(sub.recv().await.is_none());
    }

    #[test]
    fn test_dispatch_without_subscribers() {
        let bus = EventBus::new();
        assert_eq!(bus.dispatch(&event("workspace", "1")), 0);
    }

    #[tokio::test]
    async fn test_subscription_as_stream() {
        use tokio_stream::StreamExt;

        let bus = EventBus::new();
        let sub = bus.subscribe();
        bus.dispatch(&event("submap", "resize"));
        bus.dispatch(&event("submap", ""));
        bus.close();

        let kinds: Vec<_> = sub.map(|e| e.fields[0].clone()).collect().await;
        assert_eq!(kinds, vec!["resize", ""]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_subscribe_unsubscribe_dispatch() {
        let bus = EventBus::with_capacity(8);
        let mut tasks = Vec::new();

        for _ in 0..8 {
            let bus = bus.clone();
            tasks.push(tokio::spawn(async move {
                for _ in 0..200 {
                    let mut sub = bus.subscribe();
                    tokio::task::yield_now().await;
                    let _ = sub.try_recv();
                    bus.unsubscribe(sub.id());
                    bus.unsubscribe(sub.id());
                    // Nothing may arrive after removal beyond what was queued
                    while sub.try_recv().is_ok() {}
                    assert!(sub.recv().await.is_none());
                }
            }));
        }

        for n in 0..4 {
            let bus = bus.clone();
            tasks.push(tokio::spawn(async move {
                for i in 0..500 {
                    bus.dispatch(&event("workspace", &format!("{}-{}", n, i)));
                    if i % 16 == 0 {
                        tokio::task::yield_now().await;
                    }
                }
            }));
        }

        let results = tokio::time::timeout(Duration::from_secs(30), futures::future::join_all(tasks))
            .await
            .expect("stress test deadlocked");

        for result in results {
            result.expect("stress task panicked");
        }
        assert_eq!(bus.subscriber_count(), 0);

        bus.close();
        assert_eq!(bus.dispatch(&event("workspace", "after")), 0);
    }
}
