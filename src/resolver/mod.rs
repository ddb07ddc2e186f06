//! The name-to-identifier resolution pipeline.
//!
//! One raw name flows through: normalizer → parser cascade → candidate
//! retrieval → scoring funnel → identifier formatting. Batches are processed
//! sequentially and every entry resolves independently — one failure never
//! aborts its siblings.
//!
//! # Module layout
//!
//! - [`normalize`] -- input cleanup.
//! - [`cascade`] -- structural parsing of path segments into a [`cascade::ParsedHint`].
//! - [`funnel`] -- the scoring and convergence funnel.
//! - [`records`] -- cache-through full-record fetches.
//! - [`episodes`] -- episode lookup with the season freshness policy.

pub mod cascade;
pub mod episodes;
pub mod funnel;
pub mod normalize;
pub mod records;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use reelid_common::{Error, ImdbId, MediaKind, Result};

use crate::metadata::provider::{SearchBackend, SearchFilters};
use funnel::{Funnel, FunnelConfig, Outcome};

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Per-item result of a resolution request.
///
/// `inputhash` is always present so callers can correlate results without
/// echoing the raw (potentially sensitive) input. Exactly one of `imdbid`
/// or `error` is populated; `season`/`episode` appear iff the item resolved
/// to a series.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolutionResult {
    #[serde(rename = "inputhash")]
    pub input_hash: String,

    #[serde(rename = "imdbid", skip_serializing_if = "Option::is_none")]
    pub imdb_id: Option<ImdbId>,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<MediaKind>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub season: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub episode: Option<u32>,

    /// Set when convergence exhausted every tie-break rule and returned the
    /// first survivor of a genuine tie.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub ambiguous: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Default for ResolutionResult {
    fn default() -> Self {
        Self {
            input_hash: String::new(),
            imdb_id: None,
            kind: None,
            season: None,
            episode: None,
            ambiguous: false,
            error: None,
        }
    }
}

struct Resolved {
    imdb_id: ImdbId,
    kind: MediaKind,
    season: Option<u32>,
    episode: Option<u32>,
    ambiguous: bool,
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// The resolution pipeline.
pub struct Resolver {
    backend: Arc<dyn SearchBackend>,
    funnel: Funnel,
}

impl Resolver {
    pub fn new(backend: Arc<dyn SearchBackend>, funnel_config: FunnelConfig) -> Self {
        Self {
            backend,
            funnel: Funnel::new(funnel_config),
        }
    }

    /// Resolve a batch of raw names, sequentially and independently.
    pub async fn resolve_batch(&self, inputs: &[String]) -> Vec<ResolutionResult> {
        let mut results = Vec::with_capacity(inputs.len());
        for raw in inputs {
            results.push(self.resolve_one(raw).await);
        }
        results
    }

    /// Resolve a single raw name. Never fails — errors land in the result.
    pub async fn resolve_one(&self, raw: &str) -> ResolutionResult {
        let input_hash = input_hash(raw);

        match self.resolve_inner(raw).await {
            Ok(resolved) => ResolutionResult {
                input_hash,
                imdb_id: Some(resolved.imdb_id),
                kind: Some(resolved.kind),
                season: resolved.season,
                episode: resolved.episode,
                ambiguous: resolved.ambiguous,
                error: None,
            },
            Err(e) => {
                debug!(error = %e, "resolution failed");
                ResolutionResult {
                    input_hash,
                    error: Some(e.to_string()),
                    ..Default::default()
                }
            }
        }
    }

    async fn resolve_inner(&self, raw: &str) -> Result<Resolved> {
        let hint = cascade::parse_hint(raw)
            .ok_or_else(|| Error::invalid_input("Unable to parse input"))?;

        let kind = hint.kind();
        let filters = SearchFilters {
            kind,
            year: hint.year,
        };

        let candidates = self.backend.search(&hint.title, &filters).await?;
        debug!(
            title = %hint.title,
            kind = %kind,
            candidates = candidates.len(),
            "retrieved candidates"
        );

        match self.funnel.resolve(&hint.title, &candidates) {
            Outcome::NoMatch { reason } => Err(Error::not_found(reason)),
            Outcome::Match { winner, ambiguous } => {
                let imdb_id = self
                    .backend
                    .imdb_id(winner.candidate.raw_id, winner.candidate.kind)
                    .await?
                    .ok_or_else(|| {
                        Error::not_found(format!(
                            "the matched {kind} has no IMDB identifier in the backend"
                        ))
                    })?;

                // A season pack carries no episode, and an absolute-numbered
                // release carries no season; both default to 1.
                let (season, episode) = if kind.is_episodic() {
                    (Some(hint.season.unwrap_or(1)), Some(hint.episode.unwrap_or(1)))
                } else {
                    (None, None)
                };

                debug!(
                    id = %imdb_id,
                    kind = %kind,
                    ambiguous = ambiguous,
                    "resolved"
                );

                Ok(Resolved {
                    imdb_id,
                    kind,
                    season,
                    episode,
                    ambiguous,
                })
            }
        }
    }
}

/// Privacy-preserving correlation key: hex SHA-256 of the raw input.
pub fn input_hash(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    hex::encode(hasher.finalize())
}
