// Event Bus Interface
//
// Publish-subscribe seam between the pipeline services and their
// observers. Two subscription styles exist: synchronous handlers invoked
// on the publisher's call path, and asynchronous bounded channels for
// consumers that drain at their own pace (the realtime broadcaster).

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::interfaces::messaging::domain_event::DomainEvent;
use crate::interfaces::messaging::event_handler::EventHandler;
use crate::shared::error::MessagingError;

/// Event bus interface
///
/// # Thread Safety
/// Event bus implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publish an event to all subscribers.
    ///
    /// Synchronous handlers run before this returns; channel subscribers
    /// receive the event asynchronously. Handler failures are logged, not
    /// returned.
    async fn publish<T: DomainEvent>(&self, event: T) -> Result<(), MessagingError>;

    /// Subscribe a synchronous handler to an event type.
    async fn subscribe<T: DomainEvent>(
        &self,
        handler: Arc<dyn EventHandler<T>>,
    ) -> Result<(), MessagingError>;

    /// Subscribe a bounded channel to an event type.
    ///
    /// A full channel drops the oldest undelivered events for that
    /// subscriber; drops are counted on the receiver.
    async fn subscribe_channel<T: DomainEvent>(&self, capacity: usize) -> BusReceiver<T>;
}

/// Receiving half of a channel subscription.
///
/// Wraps the broadcast receiver so that lag (oldest events evicted by the
/// bounded buffer) is absorbed and counted instead of surfacing as an
/// error to the consumer.
pub struct BusReceiver<T: DomainEvent> {
    inner: broadcast::Receiver<T>,
    dropped: Arc<AtomicU64>,
}

impl<T: DomainEvent> BusReceiver<T> {
    pub fn new(inner: broadcast::Receiver<T>, dropped: Arc<AtomicU64>) -> Self {
        Self { inner, dropped }
    }

    /// Receive the next event; `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<T> {
        loop {
            match self.inner.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    self.dropped.fetch_add(n, Ordering::Relaxed);
                    tracing::warn!(
                        "Channel subscriber lagged; dropped {} {} event(s)",
                        n,
                        std::any::type_name::<T>()
                    );
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Total events dropped for this subscriber.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
