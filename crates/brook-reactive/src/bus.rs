//! Process-wide commit notification bus.

use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};

use dashmap::DashMap;
use futures::Stream;
use tokio::sync::mpsc;

use brook_schema::CommitSet;

type Predicate = Box<dyn Fn(&CommitSet) -> bool + Send + Sync + 'static>;

struct Subscriber {
    predicate: Predicate,
    sink: mpsc::UnboundedSender<CommitSet>,
}

/// Multicasts the entity types touched by committed transactions.
///
/// The bus is hot: a notification reaches only the subscriptions alive when
/// it is published, and nothing is replayed to late subscribers. Publishing
/// never blocks; each subscription buffers independently. Cloning the bus
/// clones a handle to the same subscriber registry.
#[derive(Clone)]
pub struct CommitBus {
    inner: Arc<BusInner>,
}

struct BusInner {
    /// Active subscriptions keyed by subscription ID.
    subscribers: DashMap<u64, Subscriber>,
    /// Next subscription ID.
    next_id: AtomicU64,
}

impl CommitBus {
    /// Create a new bus with no subscribers.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(BusInner {
                subscribers: DashMap::new(),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Subscribe to every commit notification.
    pub fn subscribe(&self) -> BusSubscription {
        self.subscribe_filtered(|_| true)
    }

    /// Subscribe to commit notifications matching a predicate.
    ///
    /// The predicate runs on the publishing thread, so it should stay cheap.
    pub fn subscribe_filtered(
        &self,
        predicate: impl Fn(&CommitSet) -> bool + Send + Sync + 'static,
    ) -> BusSubscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::unbounded_channel();

        self.inner.subscribers.insert(
            id,
            Subscriber {
                predicate: Box::new(predicate),
                sink: tx,
            },
        );

        tracing::debug!(subscription_id = id, "bus subscription created");

        BusSubscription {
            rx,
            _guard: SubscriptionGuard {
                bus: Arc::downgrade(&self.inner),
                id,
            },
        }
    }

    /// Publish a commit change set to every matching subscriber.
    ///
    /// Empty sets are dropped; nothing changed, so nothing is delivered.
    pub fn publish(&self, changes: &CommitSet) {
        if changes.is_empty() {
            return;
        }

        // Sends can fail when a subscription is being dropped concurrently.
        // Collect those IDs and prune after iterating; removing from a
        // dashmap while holding its iterator would deadlock.
        let mut dead = Vec::new();
        for entry in self.inner.subscribers.iter() {
            let subscriber = entry.value();
            if (subscriber.predicate)(changes) && subscriber.sink.send(changes.clone()).is_err() {
                dead.push(*entry.key());
            }
        }
        for id in dead {
            self.inner.subscribers.remove(&id);
        }

        tracing::trace!(types = changes.len(), "published commit notification");
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.len()
    }
}

impl Default for CommitBus {
    fn default() -> Self {
        Self::new()
    }
}

/// A live subscription to the commit bus.
///
/// Dropping the subscription unsubscribes it.
pub struct BusSubscription {
    rx: mpsc::UnboundedReceiver<CommitSet>,
    _guard: SubscriptionGuard,
}

impl BusSubscription {
    /// Wait for the next matching commit notification.
    ///
    /// Returns `None` once every handle to the bus has been dropped.
    pub async fn recv(&mut self) -> Option<CommitSet> {
        self.rx.recv().await
    }

    /// Take a notification if one is already buffered.
    pub fn try_recv(&mut self) -> Option<CommitSet> {
        self.rx.try_recv().ok()
    }
}

impl Stream for BusSubscription {
    type Item = CommitSet;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

/// Deregisters the subscription on drop.
///
/// Holds the registry weakly so a subscription does not keep its own sender
/// alive; receivers observe end-of-stream once the bus itself is gone.
struct SubscriptionGuard {
    bus: Weak<BusInner>,
    id: u64,
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.subscribers.remove(&self.id);
            tracing::debug!(subscription_id = self.id, "bus subscription removed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brook_schema::EntityType;
    use futures::StreamExt;

    fn set_of(names: &[&str]) -> CommitSet {
        names.iter().map(|n| EntityType::from(*n)).collect()
    }

    #[tokio::test]
    async fn test_subscriber_receives_published_set() {
        let bus = CommitBus::new();
        let mut sub = bus.subscribe();

        bus.publish(&set_of(&["User"]));

        let received = sub.recv().await.unwrap();
        assert!(received.contains_name("User"));
    }

    #[tokio::test]
    async fn test_predicate_filters_notifications() {
        let bus = CommitBus::new();
        let mut sub = bus.subscribe_filtered(|set| set.contains_name("User"));

        bus.publish(&set_of(&["Post"]));
        assert!(sub.try_recv().is_none());

        bus.publish(&set_of(&["Post", "User"]));
        let received = sub.try_recv().unwrap();
        assert!(received.contains_name("Post"));
    }

    #[tokio::test]
    async fn test_late_subscriber_misses_earlier_events() {
        let bus = CommitBus::new();
        bus.publish(&set_of(&["User"]));

        let mut sub = bus.subscribe();
        assert!(sub.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_empty_set_is_not_delivered() {
        let bus = CommitBus::new();
        let mut sub = bus.subscribe();

        bus.publish(&CommitSet::new());
        assert!(sub.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_drop_unsubscribes() {
        let bus = CommitBus::new();
        let sub = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);

        drop(sub);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_multiple_subscribers_fan_out() {
        let bus = CommitBus::new();
        let mut a = bus.subscribe();
        let mut b = bus.subscribe_filtered(|set| set.contains_name("User"));
        let mut c = bus.subscribe_filtered(|set| set.contains_name("Post"));

        bus.publish(&set_of(&["User"]));

        assert!(a.try_recv().is_some());
        assert!(b.try_recv().is_some());
        assert!(c.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_recv_ends_when_bus_is_gone() {
        let bus = CommitBus::new();
        let mut sub = bus.subscribe();

        bus.publish(&set_of(&["User"]));
        drop(bus);

        // The buffered event is still delivered, then the stream ends.
        assert!(sub.recv().await.is_some());
        assert!(sub.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_subscription_is_a_stream() {
        let bus = CommitBus::new();
        let mut sub = bus.subscribe();

        bus.publish(&set_of(&["User"]));
        bus.publish(&set_of(&["Post"]));

        let first = sub.next().await.unwrap();
        let second = sub.next().await.unwrap();
        assert!(first.contains_name("User"));
        assert!(second.contains_name("Post"));
    }
}
