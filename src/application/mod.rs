//! Application Module
//!
//! The orchestration core: ingest pipeline, transcode scheduling,
//! workflow matching and the store facade, plus the bus handlers that
//! glue them together.

pub mod handlers;
pub mod services;

pub use services::{
    IngestOptions, IngestService, ResolveContext, StoreService, TranscodeOptions,
    TranscodeService,
};
