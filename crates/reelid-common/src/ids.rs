//! Typed identifier wrappers for reelid.
//!
//! The canonical output of the resolution pipeline is an IMDB-style
//! identifier: a literal `tt` prefix followed by a zero-padded numeric part
//! at least seven digits wide. Retrieval backends routinely strip the prefix
//! and the leading zeros, so [`ImdbId`] owns the re-padding and accepts both
//! forms on input.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};

/// Minimum digit width of the numeric part in canonical form.
const MIN_DIGITS: usize = 7;

/// Canonical identifier prefix.
const PREFIX: &str = "tt";

/// A canonical IMDB-style identifier.
///
/// Stored as the bare numeric value; formatting re-applies the `tt` prefix
/// and zero-pads back to the minimum width. Identifiers whose numeric part
/// is wider than the minimum keep their natural width.
///
/// # Examples
///
/// ```
/// use reelid_common::ImdbId;
///
/// let id = ImdbId::from_numeric(133093);
/// assert_eq!(id.to_string(), "tt0133093");
///
/// let parsed: ImdbId = "tt0133093".parse().unwrap();
/// assert_eq!(parsed, id);
/// assert_eq!(parsed.numeric(), 133093);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImdbId(u64);

impl ImdbId {
    /// Create an identifier from its bare numeric value.
    #[must_use]
    pub fn from_numeric(value: u64) -> Self {
        Self(value)
    }

    /// The bare numeric value with prefix and padding stripped.
    #[must_use]
    pub fn numeric(&self) -> u64 {
        self.0
    }

    /// Parse an identifier from either canonical (`tt0133093`) or bare
    /// numeric (`133093`, `0133093`) form.
    pub fn parse(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix(PREFIX)
            .or_else(|| trimmed.strip_prefix(&PREFIX.to_uppercase()))
            .unwrap_or(trimmed);

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::invalid_input(format!(
                "not a valid IMDB identifier: {s:?}"
            )));
        }

        let value: u64 = digits
            .parse()
            .map_err(|_| Error::invalid_input(format!("IMDB identifier out of range: {s:?}")))?;

        Ok(Self(value))
    }
}

impl fmt::Display for ImdbId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{PREFIX}{:0width$}", self.0, width = MIN_DIGITS)
    }
}

impl FromStr for ImdbId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<u64> for ImdbId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl Serialize for ImdbId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ImdbId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pads_to_minimum_width() {
        assert_eq!(ImdbId::from_numeric(1).to_string(), "tt0000001");
        assert_eq!(ImdbId::from_numeric(133093).to_string(), "tt0133093");
        assert_eq!(ImdbId::from_numeric(9999999).to_string(), "tt9999999");
    }

    #[test]
    fn test_wide_ids_keep_natural_width() {
        assert_eq!(ImdbId::from_numeric(10872600).to_string(), "tt10872600");
    }

    #[test]
    fn test_parse_canonical_form() {
        let id = ImdbId::parse("tt0133093").unwrap();
        assert_eq!(id.numeric(), 133093);
    }

    #[test]
    fn test_parse_bare_numeric_forms() {
        assert_eq!(ImdbId::parse("133093").unwrap().numeric(), 133093);
        assert_eq!(ImdbId::parse("0133093").unwrap().numeric(), 133093);
        assert_eq!(ImdbId::parse("  tt0000001 ").unwrap().numeric(), 1);
    }

    #[test]
    fn test_round_trip() {
        // Stripping the prefix and padding recovers the original value for
        // any id narrower than the minimum width.
        for value in [1u64, 42, 133093, 9999999, 10872600] {
            let id = ImdbId::from_numeric(value);
            let reparsed = ImdbId::parse(&id.to_string()).unwrap();
            assert_eq!(reparsed.numeric(), value);
        }
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(ImdbId::parse("").is_err());
        assert!(ImdbId::parse("tt").is_err());
        assert!(ImdbId::parse("nm0000001").is_err());
        assert!(ImdbId::parse("tt12ab").is_err());
    }

    #[test]
    fn test_serde_round_trip() {
        let id = ImdbId::from_numeric(133093);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"tt0133093\"");

        let back: ImdbId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
