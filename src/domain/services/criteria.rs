//! Workflow criteria evaluation
//!
//! The fold is strictly left-to-right with no precedence rules: the first
//! criterion's result seeds the accumulator, and the combine operator
//! carried on a criterion joins the running value to the criterion that
//! follows it. The final criterion's combine is never consulted. An empty
//! list matches everything.

use std::path::Path;
use tracing::warn;

use crate::domain::entities::{Combine, Criterion, CriterionKey, CriterionOp, MediaContainer};

/// Evaluates an ordered criteria list against a media container.
pub fn evaluate(criteria: &[Criterion], media: &MediaContainer) -> bool {
    let mut acc = true;
    let mut pending: Option<Combine> = None;

    for criterion in criteria {
        let hit = matches_criterion(criterion, media);
        acc = match pending {
            None => hit,
            Some(Combine::And) => acc && hit,
            Some(Combine::Or) => acc || hit,
        };
        pending = Some(criterion.combine);
    }
    acc
}

/// Stringified value of the inspected property, `None` when the media
/// kind does not carry it (e.g. season number of a movie).
fn field_value(key: CriterionKey, media: &MediaContainer) -> Option<String> {
    match key {
        CriterionKey::Title => Some(media.title().to_string()),
        CriterionKey::Resolution => Some(media.resolution().to_string()),
        CriterionKey::SeasonNumber => media.season_number().map(|n| n.to_string()),
        CriterionKey::EpisodeNumber => media.episode_number().map(|n| n.to_string()),
        CriterionKey::SourcePath => Some(media.source_path().to_string()),
        CriterionKey::SourceName => Path::new(media.source_path())
            .file_stem()
            .and_then(|s| s.to_str())
            .map(|s| s.to_string()),
        CriterionKey::SourceExtension => Path::new(media.source_path())
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_string()),
    }
}

fn matches_criterion(criterion: &Criterion, media: &MediaContainer) -> bool {
    let value = field_value(criterion.key, media);

    match criterion.op {
        CriterionOp::IsPresent => value.is_some(),
        CriterionOp::IsNotPresent => value.is_none(),
        _ => {
            let Some(actual) = value else {
                return false;
            };
            match criterion.op {
                CriterionOp::Equals => actual == criterion.value,
                CriterionOp::NotEquals => actual != criterion.value,
                CriterionOp::Matches => regex_hit(&criterion.value, &actual),
                CriterionOp::DoesNotMatch => !regex_hit(&criterion.value, &actual),
                CriterionOp::LessThan => numeric_cmp(&actual, &criterion.value)
                    .map(|ord| ord.is_lt())
                    .unwrap_or(false),
                CriterionOp::GreaterThan => numeric_cmp(&actual, &criterion.value)
                    .map(|ord| ord.is_gt())
                    .unwrap_or(false),
                CriterionOp::IsPresent | CriterionOp::IsNotPresent => unreachable!(),
            }
        }
    }
}

fn regex_hit(pattern: &str, value: &str) -> bool {
    match regex::Regex::new(pattern) {
        Ok(re) => re.is_match(value),
        Err(e) => {
            warn!("Invalid criterion pattern {:?}: {}", pattern, e);
            false
        }
    }
}

fn numeric_cmp(actual: &str, expected: &str) -> Option<std::cmp::Ordering> {
    let a: i64 = actual.trim().parse().ok()?;
    let b: i64 = expected.trim().parse().ok()?;
    Some(a.cmp(&b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Movie;
    use crate::domain::value_objects::Resolution;

    fn shaun() -> MediaContainer {
        MediaContainer::Movie(
            Movie::new(
                "tt0365748".to_string(),
                "Shaun of the Dead".to_string(),
                "/ingest/Shaun.of.the.Dead.2004.mkv".to_string(),
                Resolution::new(1280, 760),
            )
            .unwrap(),
        )
    }

    fn criterion(combine: Combine, key: CriterionKey, op: CriterionOp, value: &str) -> Criterion {
        Criterion {
            combine,
            key,
            op,
            value: value.to_string(),
        }
    }

    #[test]
    fn empty_list_matches_everything() {
        assert!(evaluate(&[], &shaun()));
    }

    #[test]
    fn single_criterion_yields_its_own_result_regardless_of_combine() {
        let hit = criterion(Combine::Or, CriterionKey::Title, CriterionOp::Matches, "Shaun");
        assert!(evaluate(std::slice::from_ref(&hit), &shaun()));

        let miss = criterion(Combine::Or, CriterionKey::Title, CriterionOp::Matches, "^x$");
        assert!(!evaluate(std::slice::from_ref(&miss), &shaun()));
    }

    #[test]
    fn left_to_right_fold_has_no_precedence() {
        // ((((false OR true) AND false) OR true) AND true) == true
        let criteria = vec![
            criterion(Combine::Or, CriterionKey::Title, CriterionOp::Matches, "^x$"),
            criterion(Combine::And, CriterionKey::Title, CriterionOp::Matches, "Shaun"),
            criterion(
                Combine::Or,
                CriterionKey::Resolution,
                CriterionOp::Matches,
                "1920x1080",
            ),
            criterion(Combine::And, CriterionKey::Title, CriterionOp::Matches, "Shaun"),
            criterion(
                Combine::And,
                CriterionKey::Resolution,
                CriterionOp::Matches,
                "1280x760",
            ),
        ];
        assert!(evaluate(&criteria, &shaun()));
    }

    #[test]
    fn fold_is_not_boolean_algebra() {
        // (false OR true) AND false == false
        let criteria = vec![
            criterion(Combine::Or, CriterionKey::Title, CriterionOp::Matches, "^x$"),
            criterion(Combine::And, CriterionKey::Title, CriterionOp::Matches, "Shaun"),
            criterion(
                Combine::And,
                CriterionKey::Resolution,
                CriterionOp::Equals,
                "1920x1080",
            ),
        ];
        assert!(!evaluate(&criteria, &shaun()));
    }

    #[test]
    fn missing_field_fails_comparisons_but_satisfies_is_not_present() {
        let media = shaun();
        let cmp = criterion(
            Combine::And,
            CriterionKey::SeasonNumber,
            CriterionOp::Equals,
            "1",
        );
        assert!(!evaluate(std::slice::from_ref(&cmp), &media));

        let absent = criterion(
            Combine::And,
            CriterionKey::SeasonNumber,
            CriterionOp::IsNotPresent,
            "",
        );
        assert!(evaluate(&[absent], &media));
    }

    #[test]
    fn numeric_comparison_on_unparsable_value_is_false() {
        let media = shaun();
        let res = criterion(
            Combine::And,
            CriterionKey::Resolution,
            CriterionOp::LessThan,
            "1920",
        );
        assert!(!evaluate(std::slice::from_ref(&res), &media));
    }

    #[test]
    fn source_fields_derive_from_path() {
        let media = shaun();
        let ext = criterion(
            Combine::And,
            CriterionKey::SourceExtension,
            CriterionOp::Equals,
            "mkv",
        );
        let name = criterion(
            Combine::And,
            CriterionKey::SourceName,
            CriterionOp::Matches,
            r"^Shaun\.of\.the\.Dead",
        );
        assert!(evaluate(&[ext, name], &media));
    }

    #[test]
    fn invalid_pattern_evaluates_false() {
        let broken = criterion(Combine::And, CriterionKey::Title, CriterionOp::Matches, "(");
        assert!(!evaluate(&[broken], &shaun()));
    }
}
