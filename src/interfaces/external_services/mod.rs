//! External Service Interfaces
//!
//! Trait seams over the opaque external tools: the metadata prober, the
//! title searcher and the transcoder runner.

pub mod metadata_prober;
pub mod title_searcher;
pub mod transcode_runner;

pub use metadata_prober::MetadataProber;
pub use title_searcher::{TitleQuery, TitleSearcher};
pub use transcode_runner::{RunnerJob, TranscodeRunner};
