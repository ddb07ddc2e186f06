//! Parsed release data model.

/// Media type guess reported by the parser.
///
/// `Unknown` means the name carried no structural evidence either way; the
/// caller decides what to do with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum MediaType {
    Movie,
    Series,
    #[default]
    Unknown,
}

/// Structured metadata extracted from a release name.
///
/// Every field except `title` and `release_title` is best-effort: absence
/// means the name carried no recognizable marker, not that parsing failed.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParsedName {
    /// Cleaned title with separators normalized to single spaces.
    pub title: String,
    /// Release or premiere year, if a plausible year token was found.
    pub year: Option<u16>,
    /// Season number from an `SxxEyy`-style or season-pack marker.
    pub season: Option<u32>,
    /// First episode number from the episode marker.
    pub episode: Option<u32>,
    /// Last episode of a multi-episode range (`S01E01E02`, `S01E01-E03`).
    pub episode_end: Option<u32>,
    /// Media type implied by the markers that were found.
    pub media_type: MediaType,
    /// Resolution tag (e.g. `1080p`, `2160p`, `4K`).
    pub resolution: Option<String>,
    /// Source tag (e.g. `BluRay`, `WEB-DL`, `HDTV`).
    pub source: Option<String>,
    /// Video codec tag (e.g. `x264`, `HEVC`).
    pub video_codec: Option<String>,
    /// Release group name from a trailing `-GROUP` or leading `[Group]`.
    pub release_group: Option<String>,
    /// Container extension, when the input looked like a filename.
    pub container: Option<String>,
    /// The original input, unmodified.
    pub release_title: String,
}

impl ParsedName {
    /// `true` when the name yielded at least one strong structural signal:
    /// a season/episode marker, a year, or a resolution/source/codec tag.
    ///
    /// Names without any such signal are indistinguishable from free text
    /// and should not be trusted for lookups.
    #[must_use]
    pub fn has_structural_signal(&self) -> bool {
        self.season.is_some()
            || self.episode.is_some()
            || self.year.is_some()
            || self.resolution.is_some()
            || self.source.is_some()
            || self.video_codec.is_some()
    }
}
