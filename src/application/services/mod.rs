//! Application Services Module

pub mod ingest_service;
pub mod store_service;
pub mod transcode_service;

pub use ingest_service::{IngestOptions, IngestService, ResolveContext};
pub use store_service::StoreService;
pub use transcode_service::{TranscodeOptions, TranscodeService};
