//! Trouble value object
//!
//! A machine-readable failure attached to an ingest item awaiting user
//! action. Each variant declares the resolution methods it accepts; the
//! ingest service rejects anything outside that set.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::value_objects::TitleCandidate;
use crate::shared::error::DomainError;

/// User-facing resolution methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMethod {
    Retry,
    Abort,
    SpecifyTitleId,
}

impl ResolutionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionMethod::Retry => "retry",
            ResolutionMethod::Abort => "abort",
            ResolutionMethod::SpecifyTitleId => "specify_title_id",
        }
    }
}

impl fmt::Display for ResolutionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResolutionMethod {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "retry" => Ok(ResolutionMethod::Retry),
            "abort" => Ok(ResolutionMethod::Abort),
            "specify_title_id" => Ok(ResolutionMethod::SpecifyTitleId),
            other => Err(DomainError::InvalidInput(format!(
                "unknown resolution method: {other}"
            ))),
        }
    }
}

/// Failure attached to a troubled ingest item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Trouble {
    /// The prober could not extract usable metadata
    MetadataFailure { message: String },
    /// The searcher returned zero candidates
    SearchNoResult { message: String },
    /// The searcher returned more than one candidate
    SearchMultipleResults {
        message: String,
        candidates: Vec<TitleCandidate>,
    },
    /// The searcher failed at the transport level
    SearchTransport { message: String },
    /// Internal fault recovered by the worker
    Unknown { message: String },
}

impl Trouble {
    pub fn kind(&self) -> &'static str {
        match self {
            Trouble::MetadataFailure { .. } => "metadata_failure",
            Trouble::SearchNoResult { .. } => "search_no_result",
            Trouble::SearchMultipleResults { .. } => "search_multiple_results",
            Trouble::SearchTransport { .. } => "search_transport",
            Trouble::Unknown { .. } => "unknown",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Trouble::MetadataFailure { message }
            | Trouble::SearchNoResult { message }
            | Trouble::SearchMultipleResults { message, .. }
            | Trouble::SearchTransport { message }
            | Trouble::Unknown { message } => message,
        }
    }

    /// Resolution methods this trouble accepts.
    pub fn allowed_resolutions(&self) -> &'static [ResolutionMethod] {
        match self {
            Trouble::MetadataFailure { .. } => {
                &[ResolutionMethod::Retry, ResolutionMethod::Abort]
            }
            Trouble::SearchNoResult { .. } => &[
                ResolutionMethod::Retry,
                ResolutionMethod::SpecifyTitleId,
                ResolutionMethod::Abort,
            ],
            Trouble::SearchMultipleResults { .. } => &[
                ResolutionMethod::SpecifyTitleId,
                ResolutionMethod::Retry,
                ResolutionMethod::Abort,
            ],
            Trouble::SearchTransport { .. } => {
                &[ResolutionMethod::Retry, ResolutionMethod::Abort]
            }
            Trouble::Unknown { .. } => &[ResolutionMethod::Retry, ResolutionMethod::Abort],
        }
    }

    pub fn allows(&self, method: ResolutionMethod) -> bool {
        self.allowed_resolutions().contains(&method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_trouble_cannot_specify_title() {
        let trouble = Trouble::SearchTransport {
            message: "connection refused".to_string(),
        };
        assert!(trouble.allows(ResolutionMethod::Retry));
        assert!(trouble.allows(ResolutionMethod::Abort));
        assert!(!trouble.allows(ResolutionMethod::SpecifyTitleId));
    }

    #[test]
    fn multiple_results_allows_specify_title() {
        let trouble = Trouble::SearchMultipleResults {
            message: "2 candidates".to_string(),
            candidates: Vec::new(),
        };
        assert!(trouble.allows(ResolutionMethod::SpecifyTitleId));
    }

    #[test]
    fn kind_tags_are_stable() {
        let trouble = Trouble::Unknown {
            message: "panic".to_string(),
        };
        assert_eq!(trouble.kind(), "unknown");
    }
}
