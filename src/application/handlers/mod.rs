//! Application Event Handlers

pub mod media_persisted_handler;

pub use media_persisted_handler::MediaPersistedHandler;
