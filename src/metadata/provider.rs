//! Trait definition and types for retrieval backends.
//!
//! This module defines the [`SearchBackend`] trait that all retrieval
//! backends must implement, along with the shared data types returned by
//! backend queries. The trait covers the two backend shapes the pipeline can
//! consume — a keyword-search index (TMDB-style REST) or a vector-similarity
//! index — by keeping the contract at the candidate level: every backend
//! returns scored [`Candidate`]s and resolves winners to IMDB identifiers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use reelid_common::{ImdbId, MediaKind, Result};

// ---------------------------------------------------------------------------
// Candidates
// ---------------------------------------------------------------------------

/// A single candidate returned from a backend search.
///
/// Candidates are ephemeral: produced per request, consumed by the scoring
/// funnel, never persisted. The `score` is backend-relative — its scale is
/// only meaningful within one request's candidate set.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Backend-specific numeric identifier for this record.
    pub raw_id: u64,
    /// Display title of the record.
    pub title: String,
    /// Backend relevance score; scale is backend-specific.
    pub score: f64,
    /// Release or premiere year, if known.
    pub year: Option<u16>,
    /// Whether the record is a movie or a series.
    pub kind: MediaKind,
    /// Whether the backend has rich detail (runtime-level metadata) for this
    /// record. Poorly documented records get penalized during tie-breaks.
    pub has_detail: bool,
}

/// Hard constraints applied at the retrieval boundary.
///
/// A candidate violating these must never appear in the returned set —
/// filtering happens backend-side, not as a post-filter.
#[derive(Debug, Clone, Copy)]
pub struct SearchFilters {
    pub kind: MediaKind,
    pub year: Option<u16>,
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Full metadata record for a resolved identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaRecord {
    /// Canonical identifier.
    pub imdb_id: ImdbId,
    /// Numeric id of the record in the retrieval backend, when known.
    /// Required for season/episode lookups.
    pub backend_id: Option<u64>,
    /// Display title.
    pub title: String,
    /// Movie or series.
    pub kind: MediaKind,
    /// Release or premiere year.
    pub year: Option<u16>,
    /// Synopsis text.
    pub overview: Option<String>,
    /// Poster image path fragment.
    pub poster_path: Option<String>,
    /// Backdrop image path fragment.
    pub backdrop_path: Option<String>,
}

/// One season's episode listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeasonRecord {
    pub season_number: u32,
    pub episodes: Vec<EpisodeRecord>,
}

/// A single episode's detail blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeRecord {
    pub episode_number: u32,
    pub name: Option<String>,
    pub overview: Option<String>,
    pub runtime: Option<u32>,
    pub still_path: Option<String>,
    pub air_date: Option<String>,
}

// ---------------------------------------------------------------------------
// Backend trait
// ---------------------------------------------------------------------------

/// Async trait implemented by every retrieval backend.
///
/// Backends are expected to be wrapped in an `Arc` and shared across
/// requests. None of the methods retry beyond transport-level back-off; a
/// failed call surfaces as a per-item error in the batch result.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Short, lowercase identifier for this backend (e.g. `"tmdb"`).
    fn name(&self) -> &'static str;

    /// `true` when the backend is configured with plausible credentials.
    fn is_available(&self) -> bool;

    /// Search for candidates matching `title` under the given hard filters.
    ///
    /// The returned list is bounded to one backend page.
    async fn search(&self, title: &str, filters: &SearchFilters) -> Result<Vec<Candidate>>;

    /// Resolve a winning candidate's backend id to its IMDB identifier.
    ///
    /// Returns `None` when the backend has no IMDB mapping for the record.
    async fn imdb_id(&self, raw_id: u64, kind: MediaKind) -> Result<Option<ImdbId>>;

    /// Fetch the full record for a canonical identifier.
    async fn find_by_imdb(&self, id: ImdbId) -> Result<Option<MediaRecord>>;

    /// Fetch one season's episode listing by the backend's numeric id.
    async fn fetch_season(&self, backend_id: u64, season: u32) -> Result<SeasonRecord>;
}
