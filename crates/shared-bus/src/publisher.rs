//! # Event Publisher
//!
//! Post-commit fan-out of partner events.

use crate::events::{EventFilter, PartnerEvent};
use crate::subscriber::{EventStream, Subscription, Watchers};
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use shared_types::entities::AccountId;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

/// Publishing side of the bus.
///
/// Never fails the caller. An event nobody is listening for is counted and
/// dropped; the operation that produced it has already committed.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish `event`, returning how many subscribers received it.
    async fn publish(&self, event: PartnerEvent) -> usize;

    /// Events published since start.
    fn events_published(&self) -> u64;
}

/// Broadcast-channel bus for a single process.
///
/// A deployment with push delivery subscribes here and relays per recipient.
pub struct InMemoryEventBus {
    sender: broadcast::Sender<PartnerEvent>,
    watchers: Arc<Watchers>,
    published: AtomicU64,
    unheard: AtomicU64,
}

impl InMemoryEventBus {
    /// Bus with the default per-subscriber buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Bus buffering up to `capacity` events per subscriber.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            watchers: Arc::new(Watchers::default()),
            published: AtomicU64::new(0),
            unheard: AtomicU64::new(0),
        }
    }

    /// Subscribe to events matching `filter`.
    #[must_use]
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        let guard = self.watchers.watch(&filter);
        debug!(topics = ?filter.topics, recipients = filter.recipients.len(), "New subscription");
        Subscription::new(self.sender.subscribe(), filter, guard)
    }

    /// Subscribe and wrap the subscription as a stream.
    #[must_use]
    pub fn event_stream(&self, filter: EventFilter) -> EventStream {
        self.subscribe(filter).into_stream()
    }

    /// Live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Whether some subscription would receive an event for `recipient`.
    #[must_use]
    pub fn is_watched(&self, recipient: &AccountId) -> bool {
        self.watchers.is_watched(recipient)
    }

    /// Events published while nobody watched their recipient.
    #[must_use]
    pub fn unheard_count(&self) -> u64 {
        self.unheard.load(Ordering::Relaxed)
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, event: PartnerEvent) -> usize {
        self.published.fetch_add(1, Ordering::Relaxed);
        let topic = event.topic();
        let recipient = event.recipient().clone();

        if !self.watchers.is_watched(&recipient) {
            self.unheard.fetch_add(1, Ordering::Relaxed);
            debug!(topic = ?topic, recipient = %recipient, "No listener for recipient");
        }

        match self.sender.send(event) {
            Ok(receivers) => {
                debug!(topic = ?topic, recipient = %recipient, receivers, "Partner event published");
                receivers
            }
            Err(_) => 0,
        }
    }

    fn events_published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disconnected(to: &str) -> PartnerEvent {
        PartnerEvent::PartnerDisconnected {
            recipient: AccountId::from(to),
            former_partner_id: AccountId::from("x"),
        }
    }

    #[tokio::test]
    async fn test_publish_without_listener_is_counted() {
        let bus = InMemoryEventBus::new();

        assert_eq!(bus.publish(disconnected("a")).await, 0);
        assert_eq!(bus.events_published(), 1);
        assert_eq!(bus.unheard_count(), 1);
    }

    #[tokio::test]
    async fn test_listener_for_other_recipient_does_not_hear() {
        let bus = InMemoryEventBus::new();
        let _b = bus.subscribe(EventFilter::for_recipient("b".into()));

        // Broadcast still reaches the receiver; the filter drops it on recv.
        assert_eq!(bus.publish(disconnected("a")).await, 1);
        assert_eq!(bus.unheard_count(), 1);

        bus.publish(disconnected("b")).await;
        assert_eq!(bus.unheard_count(), 1);
    }

    #[tokio::test]
    async fn test_unfiltered_listener_hears_everyone() {
        let bus = InMemoryEventBus::new();
        let _all = bus.subscribe(EventFilter::all());

        assert!(bus.is_watched(&AccountId::from("anyone")));
        bus.publish(disconnected("a")).await;
        assert_eq!(bus.unheard_count(), 0);
    }

    #[test]
    fn test_default_bus_is_empty() {
        let bus = InMemoryEventBus::default();
        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(bus.events_published(), 0);
        assert_eq!(bus.unheard_count(), 0);
    }
}
