//! Extraction of non-structural release tags: resolution, source, codec,
//! release group, and container extension.

use once_cell::sync::Lazy;
use regex::Regex;

static RESOLUTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(2160p|1440p|1080p|960p|720p|576p|480p|4k|uhd)\b").unwrap());

static SOURCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(blu-?ray|bdrip|brrip|web-?dl|webrip|hdtv|dvdrip|dvd|remux|hdrip|cam|web)\b")
        .unwrap()
});

static CODEC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(x\.?264|x\.?265|h\.?264|h\.?265|hevc|avc|av1|xvid|divx)\b").unwrap());

static CONTAINER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\.(mkv|mp4|avi|m4v|ts|wmv|mov)\s*$").unwrap());

static TRAILING_GROUP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-([A-Za-z0-9]+)\s*$").unwrap());

static LEADING_GROUP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[([^\]]+)\]\s*").unwrap());

/// Quality/encoding tags found in a release name.
#[derive(Debug, Clone, Default)]
pub struct TagHits {
    pub resolution: Option<String>,
    pub source: Option<String>,
    pub video_codec: Option<String>,
    /// Byte offset of the earliest tag; everything before it is title-ish.
    pub first_tag_start: Option<usize>,
}

impl TagHits {
    /// `true` when at least one tag was found.
    pub fn any(&self) -> bool {
        self.first_tag_start.is_some()
    }
}

/// Scan a release name for resolution, source, and codec tags.
pub fn extract(input: &str) -> TagHits {
    let mut hits = TagHits::default();
    let mut earliest: Option<usize> = None;

    if let Some(m) = RESOLUTION_RE.find(input) {
        hits.resolution = Some(m.as_str().to_ascii_lowercase());
        earliest = Some(earliest.map_or(m.start(), |e: usize| e.min(m.start())));
    }
    if let Some(m) = SOURCE_RE.find(input) {
        hits.source = Some(canonical_source(m.as_str()));
        earliest = Some(earliest.map_or(m.start(), |e: usize| e.min(m.start())));
    }
    if let Some(m) = CODEC_RE.find(input) {
        hits.video_codec = Some(canonical_codec(m.as_str()));
        earliest = Some(earliest.map_or(m.start(), |e: usize| e.min(m.start())));
    }

    hits.first_tag_start = earliest;
    hits
}

/// Strip a trailing container extension, returning the remainder and the
/// extension (lowercased) when present.
pub fn strip_container(input: &str) -> (&str, Option<String>) {
    match CONTAINER_RE.find(input) {
        Some(m) => (
            &input[..m.start()],
            Some(m.as_str().trim_start_matches('.').trim().to_ascii_lowercase()),
        ),
        None => (input, None),
    }
}

/// Find a trailing `-GROUP` suffix. The input is not modified; the caller
/// decides whether the hit is trustworthy (a bare hyphenated title looks
/// identical to a group suffix).
pub fn trailing_group(input: &str) -> Option<(usize, String)> {
    TRAILING_GROUP_RE
        .captures(input)
        .and_then(|caps| caps.get(1).map(|m| (m.start() - 1, m.as_str().to_string())))
}

/// Strip a leading `[Group]` prefix, returning the remainder and the group.
pub fn strip_leading_group(input: &str) -> (&str, Option<String>) {
    match LEADING_GROUP_RE.captures(input) {
        Some(caps) => {
            let full = caps.get(0).expect("group 0 always present");
            let name = caps.get(1).expect("capture 1 present on match");
            (&input[full.end()..], Some(name.as_str().to_string()))
        }
        None => (input, None),
    }
}

fn canonical_source(raw: &str) -> String {
    let folded: String = raw
        .chars()
        .filter(|c| *c != '-')
        .collect::<String>()
        .to_ascii_lowercase();
    match folded.as_str() {
        "bluray" => "BluRay",
        "bdrip" => "BDRip",
        "brrip" => "BRRip",
        "webdl" => "WEB-DL",
        "webrip" => "WEBRip",
        "web" => "WEB",
        "hdtv" => "HDTV",
        "dvdrip" => "DVDRip",
        "dvd" => "DVD",
        "remux" => "Remux",
        "hdrip" => "HDRip",
        "cam" => "CAM",
        other => return other.to_string(),
    }
    .to_string()
}

fn canonical_codec(raw: &str) -> String {
    raw.chars()
        .filter(|c| *c != '.')
        .collect::<String>()
        .to_ascii_lowercase()
}
