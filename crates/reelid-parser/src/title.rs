//! Title cleanup and year extraction.

use once_cell::sync::Lazy;
use regex::Regex;

static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(19\d{2}|20\d{2})\b").unwrap());

static SEPARATOR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[._]+").unwrap());

static BRACKET_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\[\]\(\)\{\}]+").unwrap());

static MULTI_SPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Find the most plausible release year: the **last** year-shaped token in
/// the scanned region. Returns the year and its byte offset.
///
/// Scanning last-to-first keeps a leading year-shaped title ("1923", "2012")
/// intact while still catching the real year in "2012.2009.1080p".
pub fn extract_year(input: &str) -> Option<(u16, usize)> {
    YEAR_RE
        .find_iter(input)
        .last()
        .and_then(|m| m.as_str().parse::<u16>().ok().map(|y| (y, m.start())))
}

/// Normalize a raw title fragment: separators to spaces, brackets removed,
/// whitespace collapsed, stray leading/trailing dashes trimmed.
pub fn clean(input: &str) -> String {
    let no_sep = SEPARATOR_RE.replace_all(input, " ");
    let no_brackets = BRACKET_RE.replace_all(&no_sep, " ");
    let collapsed = MULTI_SPACE_RE.replace_all(&no_brackets, " ");
    collapsed
        .trim()
        .trim_matches('-')
        .trim()
        .to_string()
}
