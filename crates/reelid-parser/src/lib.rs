//! # reelid-parser
//!
//! A structural parser for media release names.
//!
//! This crate extracts best-effort structured metadata from release names
//! commonly found on downloaded media: title, year, season/episode markers,
//! resolution, source, codec, and release group.
//!
//! ## Quick Start
//!
//! ```
//! use reelid_parser::parse;
//!
//! let result = parse("The.Matrix.1999.1080p.BluRay.x264-GROUP");
//!
//! assert_eq!(result.title, "The Matrix");
//! assert_eq!(result.year, Some(1999));
//! ```
//!
//! The output is a guess, not a verdict: a name with no recognizable
//! structure still produces a [`ParsedName`], with
//! [`ParsedName::has_structural_signal`] reporting `false`.

pub mod episode;
pub mod metadata;
mod model;
pub mod title;

pub use model::{MediaType, ParsedName};

use once_cell::sync::Lazy;
use regex::Regex;

/// Absolute-episode form used by bracketed-group releases:
/// `Title - 12 [1080p]`.
static ABSOLUTE_EP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.+?)\s*-\s*(\d{1,3})\b").unwrap());

/// Parse a release name into structured metadata.
///
/// # Examples
///
/// ```
/// use reelid_parser::{parse, MediaType};
///
/// let result = parse("Breaking.Bad.S01E07.720p.BluRay.x264-DEMAND");
/// assert_eq!(result.title, "Breaking Bad");
/// assert_eq!(result.season, Some(1));
/// assert_eq!(result.episode, Some(7));
/// assert_eq!(result.media_type, MediaType::Series);
/// ```
pub fn parse(input: &str) -> ParsedName {
    let release_title = input.to_string();
    let trimmed = input.trim();

    let (rest, container) = metadata::strip_container(trimmed);
    let (rest, leading_group) = metadata::strip_leading_group(rest);

    // Bracketed-group absolute-episode convention gets its own path: the
    // episode number follows the title with a dash, no SxxEyy marker.
    if leading_group.is_some() {
        if let Some(caps) = ABSOLUTE_EP_RE.captures(rest) {
            let tags = metadata::extract(rest);
            return ParsedName {
                title: title::clean(&caps[1]),
                year: None,
                season: None,
                episode: caps[2].parse().ok(),
                episode_end: None,
                media_type: MediaType::Series,
                resolution: tags.resolution,
                source: tags.source,
                video_codec: tags.video_codec,
                release_group: leading_group,
                container,
                release_title,
            };
        }
    }

    let episode_hit = episode::extract(rest);
    let tags = metadata::extract(rest);

    // The title ends at the earliest structural marker.
    let mut boundary = rest.len();
    if let Some(hit) = &episode_hit {
        boundary = boundary.min(hit.start);
    }
    if let Some(start) = tags.first_tag_start {
        boundary = boundary.min(start);
    }

    // A year-shaped token that IS the title ("2012", "1923") stays in the
    // title; otherwise the year becomes metadata and the title ends there.
    let mut year = None;
    if let Some((y, ystart)) = title::extract_year(&rest[..boundary]) {
        if !title::clean(&rest[..ystart]).is_empty() {
            year = Some(y);
            boundary = boundary.min(ystart);
        }
    }

    // A trailing -GROUP suffix is only trustworthy when the name carries
    // real structure; a bare hyphenated title looks identical.
    let structural = episode_hit.is_some() || tags.any() || year.is_some();
    let release_group = leading_group.or_else(|| {
        if structural {
            metadata::trailing_group(rest).map(|(_, g)| g)
        } else {
            None
        }
    });

    let mut title = title::clean(&rest[..boundary]);
    if title.is_empty() {
        title = title::clean(rest);
    }

    let (season, episode, episode_end) = match episode_hit {
        Some(hit) => (hit.season, hit.episode, hit.episode_end),
        None => (None, None, None),
    };

    let media_type = if season.is_some() || episode.is_some() {
        MediaType::Series
    } else if year.is_some() {
        MediaType::Movie
    } else {
        MediaType::Unknown
    };

    ParsedName {
        title,
        year,
        season,
        episode,
        episode_end,
        media_type,
        resolution: tags.resolution,
        source: tags.source,
        video_codec: tags.video_codec,
        release_group,
        container,
        release_title,
    }
}
