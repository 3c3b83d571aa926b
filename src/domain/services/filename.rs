//! Source filename parsing
//!
//! Extracts the hints the title searcher needs (title, year, season and
//! episode numbers) from release-style file names such as
//! `Shaun.of.the.Dead.2004.1080p.BluRay.mkv` or
//! `Some.Show.S02E05.WEB-DL.mkv`.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

/// Hints parsed from a source file name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameHints {
    pub title: String,
    pub year: Option<i32>,
    pub season: Option<u32>,
    pub episode: Option<u32>,
}

// S01E01, S1E1, s01.e01
static SEASON_EPISODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bS(\d{1,2})\s*\.?E(\d{1,3})\b").unwrap());

// 1x01 format
static SEASON_X_EPISODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d{1,2})x(\d{1,3})\b").unwrap());

// Reasonable release-year range
static YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(19[4-9]\d|20[0-3]\d)\b").unwrap());

// Tokens after which nothing belongs to the title
static MARKERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(2160p|1080[pi]|720p|576p|480p|4K|UHD|BluRay|Blu-Ray|BDRip|BRRip|WEB-?DL|WEBRip|HDTV|PDTV|DVDRip|x264|x265|H\.?264|H\.?265|HEVC|AAC|AC3|DTS|REMUX|PROPER|REPACK)\b",
    )
    .unwrap()
});

/// Parses name hints from a source path.
///
/// The title is everything before the first structural marker (season/
/// episode tag, year, or quality token) with separators normalised to
/// spaces. Falls back to the whole stem when no marker is present.
pub fn parse_name_hints(path: &Path) -> NameHints {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let cleaned = stem.replace(['.', '_'], " ");

    let mut season = None;
    let mut episode = None;
    let mut cut = cleaned.len();

    if let Some(caps) = SEASON_EPISODE.captures(&cleaned) {
        season = caps.get(1).and_then(|m| m.as_str().parse().ok());
        episode = caps.get(2).and_then(|m| m.as_str().parse().ok());
        if let Some(m) = caps.get(0) {
            cut = cut.min(m.start());
        }
    } else if let Some(caps) = SEASON_X_EPISODE.captures(&cleaned) {
        season = caps.get(1).and_then(|m| m.as_str().parse().ok());
        episode = caps.get(2).and_then(|m| m.as_str().parse().ok());
        if let Some(m) = caps.get(0) {
            cut = cut.min(m.start());
        }
    }

    let mut year = None;
    if let Some(caps) = YEAR.captures(&cleaned) {
        if let Some(m) = caps.get(0) {
            // A leading year is part of the title ("2001 A Space Odyssey")
            if m.start() > 0 {
                year = m.as_str().parse().ok();
                cut = cut.min(m.start());
            }
        }
    }

    if let Some(m) = MARKERS.find(&cleaned) {
        cut = cut.min(m.start());
    }

    let title = cleaned[..cut]
        .trim_matches(|c: char| c.is_whitespace() || c == '-')
        .to_string();
    let title = if title.is_empty() { cleaned.trim().to_string() } else { title };

    NameHints {
        title,
        year,
        season,
        episode,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_movie_with_year() {
        let hints = parse_name_hints(Path::new("/ingest/Shaun.of.the.Dead.2004.mkv"));
        assert_eq!(hints.title, "Shaun of the Dead");
        assert_eq!(hints.year, Some(2004));
        assert_eq!(hints.season, None);
        assert_eq!(hints.episode, None);
    }

    #[test]
    fn parses_episode_tag() {
        let hints = parse_name_hints(Path::new("Some.Show.S02E05.720p.WEB-DL.mkv"));
        assert_eq!(hints.title, "Some Show");
        assert_eq!(hints.season, Some(2));
        assert_eq!(hints.episode, Some(5));
    }

    #[test]
    fn parses_season_x_episode_form() {
        let hints = parse_name_hints(Path::new("Another Show 3x12 HDTV.mkv"));
        assert_eq!(hints.title, "Another Show");
        assert_eq!(hints.season, Some(3));
        assert_eq!(hints.episode, Some(12));
    }

    #[test]
    fn leading_year_stays_in_title() {
        let hints = parse_name_hints(Path::new("2001.A.Space.Odyssey.1968.mkv"));
        assert_eq!(hints.title, "2001 A Space Odyssey");
        assert_eq!(hints.year, Some(1968));
    }

    #[test]
    fn quality_tokens_cut_the_title() {
        let hints = parse_name_hints(Path::new("Plain.Movie.1080p.BluRay.x264.mkv"));
        assert_eq!(hints.title, "Plain Movie");
        assert_eq!(hints.year, None);
    }

    #[test]
    fn bare_name_falls_back_to_whole_stem() {
        let hints = parse_name_hints(Path::new("holiday footage.mkv"));
        assert_eq!(hints.title, "holiday footage");
        assert_eq!(hints.year, None);
    }
}
