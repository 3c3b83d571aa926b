//! Ingest DTOs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::IngestItem;
use crate::domain::value_objects::{ResolutionMethod, TitleCandidate, Trouble};

#[derive(Debug, Serialize)]
pub struct TroubleResponse {
    pub kind: String,
    pub message: String,
    pub allowed_resolutions: Vec<ResolutionMethod>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub candidates: Vec<TitleCandidate>,
}

impl From<&Trouble> for TroubleResponse {
    fn from(trouble: &Trouble) -> Self {
        let candidates = match trouble {
            Trouble::SearchMultipleResults { candidates, .. } => candidates.clone(),
            _ => Vec::new(),
        };
        Self {
            kind: trouble.kind().to_string(),
            message: trouble.message().to_string(),
            allowed_resolutions: trouble.allowed_resolutions().to_vec(),
            candidates,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct IngestItemResponse {
    pub id: Uuid,
    pub source_path: String,
    pub state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trouble: Option<TroubleResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_id: Option<Uuid>,
}

impl From<IngestItem> for IngestItemResponse {
    fn from(item: IngestItem) -> Self {
        Self {
            id: item.id,
            source_path: item.source_path.to_string_lossy().to_string(),
            state: item.state.as_str().to_string(),
            trouble: item.trouble.as_ref().map(TroubleResponse::from),
            media_id: item.media_id,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub method: ResolutionMethod,
    /// External title id for `specify_title_id`
    pub tmdb_id: Option<String>,
}
