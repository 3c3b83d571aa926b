// Title Searcher Interface
//
// Seam over the external title database. The pipeline distinguishes
// zero, one and many candidates; transport faults surface separately so
// the user can retry them.

use async_trait::async_trait;

use crate::domain::value_objects::{TitleCandidate, TitleKind};
use crate::shared::error::SearchError;

/// Parsed title information handed to the searcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleQuery {
    pub title: String,
    pub year: Option<i32>,
    /// Kind the ingest pipeline inferred from episodic hints
    pub kind: TitleKind,
}

#[async_trait]
pub trait TitleSearcher: Send + Sync {
    /// Search for candidates matching the query. An empty result is not
    /// an error; the pipeline raises the trouble.
    async fn search(&self, query: &TitleQuery) -> Result<Vec<TitleCandidate>, SearchError>;

    /// Fetch a record by its external id, for user-specified resolution.
    async fn fetch(&self, tmdb_id: &str) -> Result<TitleCandidate, SearchError>;
}
