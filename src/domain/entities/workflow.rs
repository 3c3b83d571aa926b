//! Workflow entity
//!
//! A user-authored rule mapping media properties to a set of targets.
//! Criteria evaluation is a strict left-to-right fold; the combine
//! operator carried on a criterion joins the running value to the
//! criterion that follows it. This is a user-visible rule, not boolean
//! algebra.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::shared::error::DomainError;

/// Operator joining the running fold value to the next criterion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Combine {
    And,
    Or,
}

impl Combine {
    pub fn as_str(&self) -> &'static str {
        match self {
            Combine::And => "and",
            Combine::Or => "or",
        }
    }
}

impl fmt::Display for Combine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Combine {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "and" => Ok(Combine::And),
            "or" => Ok(Combine::Or),
            other => Err(DomainError::InvalidInput(format!(
                "unknown combine operator: {}",
                other
            ))),
        }
    }
}

/// Media property a criterion inspects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriterionKey {
    Title,
    Resolution,
    SeasonNumber,
    EpisodeNumber,
    SourcePath,
    SourceName,
    SourceExtension,
}

impl CriterionKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            CriterionKey::Title => "title",
            CriterionKey::Resolution => "resolution",
            CriterionKey::SeasonNumber => "season_number",
            CriterionKey::EpisodeNumber => "episode_number",
            CriterionKey::SourcePath => "source_path",
            CriterionKey::SourceName => "source_name",
            CriterionKey::SourceExtension => "source_extension",
        }
    }
}

impl fmt::Display for CriterionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CriterionKey {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "title" => Ok(CriterionKey::Title),
            "resolution" => Ok(CriterionKey::Resolution),
            "season_number" => Ok(CriterionKey::SeasonNumber),
            "episode_number" => Ok(CriterionKey::EpisodeNumber),
            "source_path" => Ok(CriterionKey::SourcePath),
            "source_name" => Ok(CriterionKey::SourceName),
            "source_extension" => Ok(CriterionKey::SourceExtension),
            other => Err(DomainError::InvalidInput(format!(
                "unknown criterion key: {}",
                other
            ))),
        }
    }
}

/// Comparison applied to the stringified property value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriterionOp {
    Equals,
    NotEquals,
    Matches,
    DoesNotMatch,
    LessThan,
    GreaterThan,
    IsPresent,
    IsNotPresent,
}

impl CriterionOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            CriterionOp::Equals => "equals",
            CriterionOp::NotEquals => "not_equals",
            CriterionOp::Matches => "matches",
            CriterionOp::DoesNotMatch => "does_not_match",
            CriterionOp::LessThan => "less_than",
            CriterionOp::GreaterThan => "greater_than",
            CriterionOp::IsPresent => "is_present",
            CriterionOp::IsNotPresent => "is_not_present",
        }
    }
}

impl fmt::Display for CriterionOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CriterionOp {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "equals" => Ok(CriterionOp::Equals),
            "not_equals" => Ok(CriterionOp::NotEquals),
            "matches" => Ok(CriterionOp::Matches),
            "does_not_match" => Ok(CriterionOp::DoesNotMatch),
            "less_than" => Ok(CriterionOp::LessThan),
            "greater_than" => Ok(CriterionOp::GreaterThan),
            "is_present" => Ok(CriterionOp::IsPresent),
            "is_not_present" => Ok(CriterionOp::IsNotPresent),
            other => Err(DomainError::InvalidInput(format!(
                "unknown criterion op: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Criterion {
    pub combine: Combine,
    pub key: CriterionKey,
    pub op: CriterionOp,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    pub id: Uuid,
    pub label: String,
    pub enabled: bool,
    /// Ordered criteria list; order is semantically significant
    pub criteria: Vec<Criterion>,
    pub target_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Workflow {
    pub fn new(
        label: String,
        enabled: bool,
        criteria: Vec<Criterion>,
        target_ids: Vec<Uuid>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            label,
            enabled,
            criteria,
            target_ids,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enum_round_trips() {
        assert_eq!("and".parse::<Combine>().unwrap(), Combine::And);
        assert_eq!(CriterionKey::SourceExtension.as_str(), "source_extension");
        assert_eq!(
            "does_not_match".parse::<CriterionOp>().unwrap(),
            CriterionOp::DoesNotMatch
        );
        assert!("xor".parse::<Combine>().is_err());
    }
}
