// Domain Event Interface
//
// Base trait for all activity-bus events. Event payload shape is fixed by
// the event type itself; a publish can only carry the payload its topic
// declares.

use serde::{Deserialize, Serialize};

/// Base trait for all domain events
///
/// # Requirements
/// - Must be `Send + Sync` for thread safety
/// - Must be `Serialize + Deserialize` for transmission over the realtime
///   channel
/// - Must have a `'static` lifetime
pub trait DomainEvent:
    Send + Sync + Clone + Serialize + for<'de> Deserialize<'de> + 'static
{
    /// Unique topic identifier, used for routing and logging.
    fn event_type(&self) -> &'static str;
}
