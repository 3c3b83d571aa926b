//! SQLite Persistence Implementations

pub mod ingest_repository;
pub mod media_repository;
pub mod series_repository;
pub mod target_repository;
pub mod transcode_repository;
pub mod user_repository;
pub mod workflow_repository;

pub use ingest_repository::SqliteIngestRepository;
pub use media_repository::SqliteMediaRepository;
pub use series_repository::SqliteSeriesRepository;
pub use target_repository::SqliteTargetRepository;
pub use transcode_repository::SqliteTranscodeRepository;
pub use user_repository::SqliteUserRepository;
pub use workflow_repository::SqliteWorkflowRepository;
