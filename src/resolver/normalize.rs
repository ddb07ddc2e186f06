//! Input normalization.
//!
//! One pure, total function: [`normalize`]. The worst case is an empty
//! string, which callers must treat as unparseable. The function is
//! idempotent — normalizing already-normalized text is a no-op.

use once_cell::sync::Lazy;
use regex::Regex;

/// Pixel-dimension noise like `1920x1080`.
static PIXEL_DIMENSIONS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{3,}x\d{3,}").unwrap());

/// Long digit runs: torrent hashes, episode-dump numbering, timestamps.
static LONG_DIGITS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{6,}").unwrap());

static MULTI_SPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Clean one raw name into a form suitable for structural parsing.
///
/// Applies the release-group prefix heuristic, strips pixel-dimension
/// markers and long digit runs, replaces hyphens with spaces and drops
/// colons, collapses whitespace, trims, and lower-cases.
pub fn normalize(raw: &str) -> String {
    // The space-run heuristic must see the raw input: the noise
    // replacements below create their own space runs.
    let cleaned = strip_space_run_prefix(raw);

    let cleaned = PIXEL_DIMENSIONS_RE.replace_all(&cleaned, " ");
    let cleaned = LONG_DIGITS_RE.replace_all(&cleaned, " ");
    let cleaned = cleaned.replace('-', " ").replace(':', "");

    MULTI_SPACE_RE
        .replace_all(&cleaned, " ")
        .trim()
        .to_lowercase()
}

/// Release groups sometimes prefix a name with their tag followed by a run
/// of spaces. When the longest space run is wider than one, keep only the
/// chunk after the last such run — at the risk of discarding a title that
/// legitimately contained doubled spaces.
fn strip_space_run_prefix(input: &str) -> String {
    let mut longest = 0usize;
    let mut current = 0usize;
    for c in input.chars() {
        if c == ' ' {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }

    if longest <= 1 {
        return input.to_string();
    }

    let run = " ".repeat(longest);
    input
        .split(run.as_str())
        .filter(|chunk| !chunk.trim().is_empty())
        .last()
        .unwrap_or("")
        .to_string()
}
