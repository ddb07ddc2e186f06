//! Structural parser cascade.
//!
//! A raw input may be a bare release name or a whole path. Path segments are
//! tried last-to-first — the filename is the most specific hint, but parent
//! folders often carry the real series name and year when the filename is
//! abbreviated. The first segment yielding a strong structural signal wins
//! and the remaining segments are discarded.

use reelid_common::MediaKind;
use reelid_parser::{parse, MediaType};
use tracing::debug;

use super::normalize::normalize;

/// Best-effort structured hint recovered from one raw name.
#[derive(Debug, Clone)]
pub struct ParsedHint {
    /// Cleaned, lower-cased title ready for retrieval.
    pub title: String,
    /// Season number, when a marker was found.
    pub season: Option<u32>,
    /// Episode number, when a marker was found.
    pub episode: Option<u32>,
    /// Release year, when present.
    pub year: Option<u16>,
    /// What the parser thought the name was.
    pub kind_hint: MediaType,
}

impl ParsedHint {
    /// Decide movie vs. series.
    ///
    /// An explicit parser verdict wins. Otherwise a season OR an episode —
    /// either alone — implies a series: season packs carry no episode, and
    /// absolute-numbered releases carry no season. Everything else is a
    /// movie.
    pub fn kind(&self) -> MediaKind {
        match self.kind_hint {
            MediaType::Series => MediaKind::Series,
            MediaType::Movie => MediaKind::Movie,
            MediaType::Unknown => {
                if self.season.is_some() || self.episode.is_some() {
                    MediaKind::Series
                } else {
                    MediaKind::Movie
                }
            }
        }
    }
}

/// Run the cascade over a raw name or path.
///
/// Returns `None` when no segment yields any structural signal — the
/// fast, free failure path taken before any network call.
pub fn parse_hint(raw: &str) -> Option<ParsedHint> {
    for segment in raw.split(['/', '\\']).rev() {
        let cleaned = normalize(segment);
        if cleaned.is_empty() {
            continue;
        }

        // The parser tries series-shaped markers first and falls back to
        // movie-shaped year/tag extraction on its own.
        let parsed = parse(&cleaned);
        if !parsed.has_structural_signal() {
            continue;
        }

        debug!(
            segment = segment,
            title = %parsed.title,
            season = ?parsed.season,
            episode = ?parsed.episode,
            year = ?parsed.year,
            "cascade found structural signal"
        );

        return Some(ParsedHint {
            title: parsed.title.clone(),
            season: parsed.season,
            episode: parsed.episode,
            year: parsed.year,
            kind_hint: parsed.media_type,
        });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movie_name() {
        let hint = parse_hint("The.Matrix.1999.1080p.BluRay.x264").unwrap();
        assert_eq!(hint.title, "the matrix");
        assert_eq!(hint.year, Some(1999));
        assert_eq!(hint.kind(), MediaKind::Movie);
        assert_eq!(hint.season, None);
        assert_eq!(hint.episode, None);
    }

    #[test]
    fn test_series_episode() {
        let hint = parse_hint("Show.Name.S02E05.1080p").unwrap();
        assert_eq!(hint.title, "show name");
        assert_eq!(hint.season, Some(2));
        assert_eq!(hint.episode, Some(5));
        assert_eq!(hint.kind(), MediaKind::Series);
    }

    #[test]
    fn test_season_pack_implies_series() {
        let hint = parse_hint("Show.Name.S01.COMPLETE").unwrap();
        assert_eq!(hint.season, Some(1));
        assert_eq!(hint.episode, None);
        assert_eq!(hint.kind(), MediaKind::Series);
    }

    #[test]
    fn test_filename_tried_before_folders() {
        let hint = parse_hint("/downloads/Some Folder/Show.S03E07.720p.mkv").unwrap();
        assert_eq!(hint.title, "show");
        assert_eq!(hint.season, Some(3));
        assert_eq!(hint.episode, Some(7));
    }

    #[test]
    fn test_folder_rescues_unparseable_filename() {
        // The filename is junk; the parent folder carries the structure.
        let hint = parse_hint("The.Movie.2018.1080p.WEB-DL/episode-dump").unwrap();
        assert_eq!(hint.title, "the movie");
        assert_eq!(hint.year, Some(2018));
        assert_eq!(hint.kind(), MediaKind::Movie);
    }

    #[test]
    fn test_no_signal_fails_fast() {
        assert!(parse_hint("notes about dinner").is_none());
        assert!(parse_hint("").is_none());
        assert!(parse_hint("///").is_none());
    }

    #[test]
    fn test_tag_only_name_defaults_to_movie() {
        let hint = parse_hint("Some.Title.720p").unwrap();
        assert_eq!(hint.kind(), MediaKind::Movie);
    }
}
