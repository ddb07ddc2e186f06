//! Season/episode marker extraction.
//!
//! Patterns are tried in order of specificity; the first hit wins. All
//! offsets are byte offsets into the scanned string so callers can truncate
//! the title at the marker.

use once_cell::sync::Lazy;
use regex::Regex;

/// `S01E02`, `S01.E02`, multi-episode `S01E01E02` / `S01E01-E03`.
static SXXEXX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bs(\d{1,2})[\s._-]*e(\d{1,3})(?:[\s._-]*-?[\s._-]*e(\d{1,3}))?").unwrap()
});

/// `1x01` style.
static NXNN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(\d{1,2})x(\d{2,3})\b").unwrap());

/// Verbose `Season 1 Episode 2`, or `Season 1` alone.
static VERBOSE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bseason[\s._]+(\d{1,2})(?:[\s._-]+episode[\s._]+(\d{1,3}))?").unwrap()
});

/// Season pack: `S01` followed by a year, resolution, COMPLETE/FULL, or end
/// of string.
static SEASON_PACK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bs(\d{1,2})(?:[\s._-]+(?:complete|full|(?:19|20)\d{2}|\d{3,4}p)\b|[\s._-]*$)")
        .unwrap()
});

/// A season/episode marker found in a release name.
#[derive(Debug, Clone, Copy)]
pub struct EpisodeHit {
    pub season: Option<u32>,
    pub episode: Option<u32>,
    pub episode_end: Option<u32>,
    /// Byte offset where the marker begins.
    pub start: usize,
}

/// Scan for a season/episode marker.
pub fn extract(input: &str) -> Option<EpisodeHit> {
    if let Some(caps) = SXXEXX_RE.captures(input) {
        let m = caps.get(0).expect("group 0 always present");
        return Some(EpisodeHit {
            season: parse_num(caps.get(1)),
            episode: parse_num(caps.get(2)),
            episode_end: parse_num(caps.get(3)),
            start: m.start(),
        });
    }

    if let Some(caps) = NXNN_RE.captures(input) {
        let m = caps.get(0).expect("group 0 always present");
        return Some(EpisodeHit {
            season: parse_num(caps.get(1)),
            episode: parse_num(caps.get(2)),
            episode_end: None,
            start: m.start(),
        });
    }

    if let Some(caps) = VERBOSE_RE.captures(input) {
        let m = caps.get(0).expect("group 0 always present");
        return Some(EpisodeHit {
            season: parse_num(caps.get(1)),
            episode: parse_num(caps.get(2)),
            episode_end: None,
            start: m.start(),
        });
    }

    if let Some(caps) = SEASON_PACK_RE.captures(input) {
        let m = caps.get(0).expect("group 0 always present");
        return Some(EpisodeHit {
            season: parse_num(caps.get(1)),
            episode: None,
            episode_end: None,
            start: m.start(),
        });
    }

    None
}

fn parse_num(m: Option<regex::Match<'_>>) -> Option<u32> {
    m.and_then(|m| m.as_str().parse().ok())
}
