//! Domain Repositories Module
//!
//! Persistence trait seams implemented by the sqlite adapters.

pub mod ingest_repository;
pub mod media_repository;
pub mod series_repository;
pub mod target_repository;
pub mod transcode_repository;
pub mod user_repository;
pub mod workflow_repository;

pub use ingest_repository::IngestRepository;
pub use media_repository::MediaRepository;
pub use series_repository::SeriesRepository;
pub use target_repository::TargetRepository;
pub use transcode_repository::TranscodeRepository;
pub use user_repository::UserRepository;
pub use workflow_repository::WorkflowRepository;
