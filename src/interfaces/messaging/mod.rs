//! Messaging Interfaces
//!
//! Trait seams for the activity bus.

pub mod domain_event;
pub mod event_bus;
pub mod event_handler;

pub use domain_event::DomainEvent;
pub use event_bus::{BusReceiver, EventBus};
pub use event_handler::EventHandler;
