//! Shared application state for the HTTP and realtime surfaces

use std::sync::Arc;

use crate::application::{IngestService, StoreService, TranscodeService};
use crate::infrastructure::auth::TokenService;
use crate::infrastructure::messaging::InMemoryEventBus;
use crate::presentation::ws::WsHub;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<StoreService>,
    pub ingest: Arc<IngestService>,
    pub scheduler: Arc<TranscodeService>,
    pub tokens: Arc<TokenService>,
    pub event_bus: Arc<InMemoryEventBus>,
    pub ws_hub: Arc<WsHub>,
}
