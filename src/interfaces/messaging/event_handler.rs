// Event Handler Interface
//
// Handlers subscribe to a single event type and run on the publisher's
// call path; they must not block.

use async_trait::async_trait;

use crate::interfaces::messaging::domain_event::DomainEvent;
use crate::shared::error::MessagingError;

/// Handler for a single event type
///
/// # Thread Safety
/// Handlers must be thread-safe (Send + Sync); the bus invokes them from
/// whichever task published the event.
#[async_trait]
pub trait EventHandler<T: DomainEvent>: Send + Sync {
    /// Handle a published event. Errors are logged by the bus and never
    /// propagate to the publisher.
    async fn handle(&self, event: T) -> Result<(), MessagingError>;

    /// Handler name used in logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
