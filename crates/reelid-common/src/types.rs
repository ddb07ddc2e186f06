//! Shared enums for the resolution pipeline.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The kind of media a candidate or resolved record refers to.
///
/// Serialized with the wire names the HTTP surface uses (`movie`/`series`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Movie,
    Series,
}

impl MediaKind {
    /// `true` for kinds that carry season/episode structure.
    #[must_use]
    pub fn is_episodic(&self) -> bool {
        matches!(self, Self::Series)
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Movie => write!(f, "movie"),
            Self::Series => write!(f, "series"),
        }
    }
}

impl FromStr for MediaKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "movie" => Ok(Self::Movie),
            "series" | "tv" | "tvshow" => Ok(Self::Series),
            _ => Err(format!("Unknown media kind: {s}")),
        }
    }
}
