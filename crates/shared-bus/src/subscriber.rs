//! # Event Subscriber
//!
//! The receiving side of the bus. A subscription registers the recipients it
//! watches so the publisher can tell whether anyone will hear an event.

use crate::events::{EventFilter, PartnerEvent};
use parking_lot::Mutex;
use shared_types::entities::AccountId;
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{ready, Context, Poll};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::Stream;
use tracing::debug;

/// Errors from subscription operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The event bus was closed.
    #[error("Event bus closed")]
    Closed,
}

/// Anything that hands out subscriptions.
pub trait EventSubscriber: Send + Sync {
    /// Subscribe to events matching a filter.
    fn subscribe(&self, filter: EventFilter) -> Subscription;
}

impl EventSubscriber for crate::publisher::InMemoryEventBus {
    fn subscribe(&self, filter: EventFilter) -> Subscription {
        crate::publisher::InMemoryEventBus::subscribe(self, filter)
    }
}

/// Live watcher counts, per recipient plus unfiltered listeners.
#[derive(Debug, Default)]
pub(crate) struct Watchers {
    by_recipient: Mutex<HashMap<AccountId, usize>>,
    unfiltered: AtomicUsize,
}

impl Watchers {
    pub(crate) fn watch(self: &Arc<Self>, filter: &EventFilter) -> WatchGuard {
        if filter.recipients.is_empty() {
            self.unfiltered.fetch_add(1, Ordering::SeqCst);
        } else {
            let mut map = self.by_recipient.lock();
            for recipient in &filter.recipients {
                *map.entry(recipient.clone()).or_default() += 1;
            }
        }
        WatchGuard {
            watchers: Arc::clone(self),
            recipients: filter.recipients.clone(),
        }
    }

    pub(crate) fn is_watched(&self, recipient: &AccountId) -> bool {
        self.unfiltered.load(Ordering::SeqCst) > 0
            || self.by_recipient.lock().contains_key(recipient)
    }
}

/// Releases a subscription's watcher registration on drop.
#[derive(Debug)]
pub(crate) struct WatchGuard {
    watchers: Arc<Watchers>,
    recipients: Vec<AccountId>,
}

impl Drop for WatchGuard {
    fn drop(&mut self) {
        if self.recipients.is_empty() {
            self.watchers.unfiltered.fetch_sub(1, Ordering::SeqCst);
            return;
        }
        let mut map = self.watchers.by_recipient.lock();
        for recipient in &self.recipients {
            if let Some(count) = map.get_mut(recipient) {
                *count = count.saturating_sub(1);
                if *count == 0 {
                    map.remove(recipient);
                }
            }
        }
        debug!(recipients = self.recipients.len(), "Subscription dropped");
    }
}

/// A subscription handle. Dropping it unregisters its recipients.
pub struct Subscription {
    receiver: broadcast::Receiver<PartnerEvent>,
    filter: EventFilter,
    guard: WatchGuard,
}

impl Subscription {
    pub(crate) fn new(
        receiver: broadcast::Receiver<PartnerEvent>,
        filter: EventFilter,
        guard: WatchGuard,
    ) -> Self {
        Self {
            receiver,
            filter,
            guard,
        }
    }

    /// Wait for the next matching event; `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<PartnerEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.filter.matches(&event) => return Some(event),
                Ok(_) => {}
                Err(broadcast::error::RecvError::Closed) => return None,
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    debug!(missed, "Subscriber lagged, partner events lost");
                }
            }
        }
    }

    /// Next matching event if one is already queued.
    pub fn try_recv(&mut self) -> Result<Option<PartnerEvent>, SubscriptionError> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if self.filter.matches(&event) => return Ok(Some(event)),
                Ok(_) | Err(broadcast::error::TryRecvError::Lagged(_)) => {}
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Closed) => {
                    return Err(SubscriptionError::Closed)
                }
            }
        }
    }

    /// The filter this subscription was created with.
    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }

    /// Turn the subscription into a `Stream`.
    #[must_use]
    pub fn into_stream(self) -> EventStream {
        EventStream {
            inner: BroadcastStream::new(self.receiver),
            filter: self.filter,
            _guard: self.guard,
        }
    }
}

/// Matching events as a `tokio_stream::Stream`, for a relay that forwards
/// them to a push provider.
pub struct EventStream {
    inner: BroadcastStream<PartnerEvent>,
    filter: EventFilter,
    _guard: WatchGuard,
}

impl EventStream {
    /// The filter this stream was created with.
    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }
}

impl Stream for EventStream {
    type Item = PartnerEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match ready!(Pin::new(&mut self.inner).poll_next(cx)) {
                Some(Ok(event)) if self.filter.matches(&event) => return Poll::Ready(Some(event)),
                Some(Ok(_)) => {}
                Some(Err(BroadcastStreamRecvError::Lagged(missed))) => {
                    debug!(missed, "Event stream lagged, partner events lost");
                }
                None => return Poll::Ready(None),
            }
        }
    }
}
