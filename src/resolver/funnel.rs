//! Scoring and convergence funnel.
//!
//! Given a cleaned query title and a set of retrieval candidates, the funnel
//! converges on exactly one winner or an explicit no-match. Stages:
//!
//! 1. **Normalize** — rescale backend scores into [0,1] within this request;
//!    compute lexical similarity (Dice coefficient) per candidate.
//! 2. **Primary filter** — drop candidates below the retrieval floor or the
//!    similarity floor. Either signal alone is unreliable: retrieval score
//!    tolerates wrong titles, lexical similarity is blind to rewordings.
//! 3. **Detail penalty** — candidates without rich backend metadata lose
//!    similarity when an equally or better matching documented candidate
//!    exists.
//! 4. **Relaxed fallback** — if nothing survives, restart from the
//!    unfiltered set with whole-word overlap scoring and re-apply the
//!    primary thresholds once.
//! 5. **Convergence** — deterministic tie-breaking down to one candidate;
//!    a tie that survives every rule is returned flagged as ambiguous
//!    rather than silently disambiguated.
//!
//! No-match is a first-class outcome: the funnel never errors.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::metadata::provider::Candidate;

/// Two similarities closer than this are a tie.
const TIE_EPSILON: f64 = 1e-9;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Tunable funnel thresholds.
///
/// The defaults are one consistent set; deployments can tighten or relax
/// them per backend without touching code.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FunnelConfig {
    /// Minimum normalized retrieval score to pass the primary filter.
    pub retrieval_floor: f64,
    /// Minimum lexical similarity to pass the primary filter.
    pub similarity_floor: f64,
    /// Similarity penalty for candidates without rich backend metadata.
    pub detail_penalty: f64,
    /// Per-token similarity adjustment in the relaxed fallback pass.
    pub word_bonus: f64,
    /// Normalized-score bar used during convergence tie-breaking.
    pub convergence_bar: f64,
}

impl Default for FunnelConfig {
    fn default() -> Self {
        Self {
            retrieval_floor: 0.6,
            similarity_floor: 0.5,
            detail_penalty: 0.2,
            word_bonus: 0.1,
            convergence_bar: 0.85,
        }
    }
}

// ---------------------------------------------------------------------------
// Scored candidates and outcomes
// ---------------------------------------------------------------------------

/// A candidate annotated with request-relative scores.
///
/// Funnel stages never mutate in place; each stage produces a new sequence
/// so the pipeline stays auditable stage by stage.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub candidate: Candidate,
    /// Retrieval score rescaled into [0,1] within this request.
    pub norm_score: f64,
    /// Lexical similarity to the query title, possibly adjusted by later
    /// stages. The raw retrieval score is never touched.
    pub similarity: f64,
}

/// Terminal result of a funnel run.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// Exactly one winner; `ambiguous` records that the final tie-break
    /// could not separate the survivors and the first was returned.
    Match {
        winner: ScoredCandidate,
        ambiguous: bool,
    },
    /// Nothing survived either pass.
    NoMatch { reason: String },
}

/// The two passes, tried in order; the first to leave survivors wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    Strict,
    Relaxed,
}

// ---------------------------------------------------------------------------
// Funnel
// ---------------------------------------------------------------------------

/// The scoring and convergence funnel.
pub struct Funnel {
    cfg: FunnelConfig,
}

impl Funnel {
    /// Create a funnel with the given thresholds.
    pub fn new(cfg: FunnelConfig) -> Self {
        Self { cfg }
    }

    /// Converge a candidate set to one winner or an explicit no-match.
    pub fn resolve(&self, query: &str, candidates: &[Candidate]) -> Outcome {
        if candidates.is_empty() {
            return Outcome::NoMatch {
                reason: "retrieval returned no candidates".to_string(),
            };
        }

        let scored = score(query, candidates);

        for pass in [Pass::Strict, Pass::Relaxed] {
            if let Some(survivors) = self.attempt(pass, query, &scored) {
                debug!(pass = ?pass, survivors = survivors.len(), "funnel pass succeeded");
                let (winner, ambiguous) = self.converge(survivors);
                return Outcome::Match { winner, ambiguous };
            }
        }

        Outcome::NoMatch {
            reason: "no identifier found even after relaxing rules".to_string(),
        }
    }

    /// Run one pass over the stage-1 scored set. Returns `None` when the
    /// pass eliminates every candidate.
    fn attempt(
        &self,
        pass: Pass,
        query: &str,
        scored: &[ScoredCandidate],
    ) -> Option<Vec<ScoredCandidate>> {
        let survivors = match pass {
            Pass::Strict => {
                let filtered = self.threshold_filter(scored.to_vec());
                let penalized = self.apply_detail_penalty(filtered);
                // The penalty may push a survivor back under the floor.
                self.threshold_filter(penalized)
            }
            Pass::Relaxed => {
                let rescored = self.word_overlap_rescore(query, scored);
                self.threshold_filter(rescored)
            }
        };

        (!survivors.is_empty()).then_some(survivors)
    }

    /// Stage 2: drop candidates under either floor.
    fn threshold_filter(&self, scored: Vec<ScoredCandidate>) -> Vec<ScoredCandidate> {
        scored
            .into_iter()
            .filter(|c| {
                c.norm_score >= self.cfg.retrieval_floor
                    && c.similarity >= self.cfg.similarity_floor
            })
            .collect()
    }

    /// Stage 3: bias selection toward well-documented records when the set
    /// is ambiguous. A candidate without detail is penalized whenever a
    /// documented candidate matches at least as well.
    fn apply_detail_penalty(&self, scored: Vec<ScoredCandidate>) -> Vec<ScoredCandidate> {
        let snapshot = scored.clone();
        scored
            .into_iter()
            .enumerate()
            .map(|(i, mut c)| {
                if !c.candidate.has_detail {
                    let outranked = snapshot.iter().enumerate().any(|(j, other)| {
                        j != i
                            && other.candidate.has_detail
                            && other.similarity >= c.similarity - TIE_EPSILON
                    });
                    if outranked {
                        c.similarity = (c.similarity - self.cfg.detail_penalty).max(0.0);
                    }
                }
                c
            })
            .collect()
    }

    /// Stage 4: per-token whole-word overlap scoring over the unfiltered
    /// set. Each query token present in the candidate title as a whole word
    /// earns a bonus; each absent token costs the same amount.
    fn word_overlap_rescore(
        &self,
        query: &str,
        scored: &[ScoredCandidate],
    ) -> Vec<ScoredCandidate> {
        scored
            .iter()
            .map(|c| {
                let words: Vec<String> = c
                    .candidate
                    .title
                    .split(|ch: char| !ch.is_alphanumeric())
                    .filter(|w| !w.is_empty())
                    .map(str::to_lowercase)
                    .collect();

                let mut similarity = c.similarity;
                for token in query
                    .split(|ch: char| !ch.is_alphanumeric())
                    .filter(|t| !t.is_empty())
                {
                    if words.iter().any(|w| w == &token.to_lowercase()) {
                        similarity += self.cfg.word_bonus;
                    } else {
                        similarity -= self.cfg.word_bonus;
                    }
                }

                ScoredCandidate {
                    candidate: c.candidate.clone(),
                    norm_score: c.norm_score,
                    similarity: similarity.clamp(0.0, 1.0),
                }
            })
            .collect()
    }

    /// Stage 5: deterministic tie-breaking, in fixed order, until one
    /// candidate remains or the tie is accepted as genuinely ambiguous.
    fn converge(&self, mut survivors: Vec<ScoredCandidate>) -> (ScoredCandidate, bool) {
        // (a) Stable sort by similarity descending.
        survivors.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        // (b) Keep only the candidates tied at the top.
        let top = survivors[0].similarity;
        let mut tied: Vec<ScoredCandidate> = survivors
            .into_iter()
            .take_while(|c| top - c.similarity < TIE_EPSILON)
            .collect();

        // (c) Prefer high-confidence retrieval among the tied.
        if tied.len() > 1 {
            let confident: Vec<ScoredCandidate> = tied
                .iter()
                .filter(|c| c.norm_score > self.cfg.convergence_bar)
                .cloned()
                .collect();
            if !confident.is_empty() {
                tied = confident;
            }
        }

        // (d) Newest release wins: re-releases and reboots of a title are
        // queried far more often than the original.
        if tied.len() > 1 {
            if let Some(max_year) = tied.iter().filter_map(|c| c.candidate.year).max() {
                let newest: Vec<ScoredCandidate> = tied
                    .iter()
                    .filter(|c| c.candidate.year == Some(max_year))
                    .cloned()
                    .collect();
                if !newest.is_empty() {
                    tied = newest;
                }
            }
        }

        // (e) Still tied: genuinely ambiguous. Return the first survivor and
        // say so, rather than inventing further disambiguation.
        let ambiguous = tied.len() > 1;
        (tied.remove(0), ambiguous)
    }
}

// ---------------------------------------------------------------------------
// Stage 1 scoring
// ---------------------------------------------------------------------------

/// Rescale retrieval scores into [0,1] within this request and compute
/// lexical similarity per candidate.
///
/// When every candidate shares one score the scale collapses to a step
/// function: everything at that value scores 1.0.
fn score(query: &str, candidates: &[Candidate]) -> Vec<ScoredCandidate> {
    let min = candidates
        .iter()
        .map(|c| c.score)
        .fold(f64::INFINITY, f64::min);
    let max = candidates
        .iter()
        .map(|c| c.score)
        .fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    candidates
        .iter()
        .map(|c| ScoredCandidate {
            candidate: c.clone(),
            norm_score: if range < TIE_EPSILON {
                1.0
            } else {
                (c.score - min) / range
            },
            similarity: lexical_similarity(query, &c.title),
        })
        .collect()
}

/// Case-insensitive bigram Dice coefficient in [0,1].
pub fn lexical_similarity(a: &str, b: &str) -> f64 {
    strsim::sorensen_dice(&a.to_lowercase(), &b.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelid_common::MediaKind;

    fn candidate(id: u64, title: &str, score: f64) -> Candidate {
        Candidate {
            raw_id: id,
            title: title.to_string(),
            score,
            year: None,
            kind: MediaKind::Movie,
            has_detail: true,
        }
    }

    fn funnel() -> Funnel {
        Funnel::new(FunnelConfig::default())
    }

    fn winner_id(outcome: Outcome) -> u64 {
        match outcome {
            Outcome::Match { winner, .. } => winner.candidate.raw_id,
            Outcome::NoMatch { reason } => panic!("expected a match, got no-match: {reason}"),
        }
    }

    #[test]
    fn test_lexical_similarity_bounds() {
        assert!((lexical_similarity("the matrix", "The Matrix") - 1.0).abs() < f64::EPSILON);
        assert!(lexical_similarity("the matrix", "completely unrelated") < 0.3);
    }

    #[test]
    fn test_empty_candidate_set_is_no_match() {
        let outcome = funnel().resolve("the matrix", &[]);
        assert!(matches!(outcome, Outcome::NoMatch { .. }));
    }

    #[test]
    fn test_exact_title_wins() {
        let candidates = vec![
            candidate(1, "The Matrix", 80.0),
            candidate(2, "The Matrix Reloaded", 60.0),
            candidate(3, "Matrix Inc", 10.0),
        ];
        assert_eq!(winner_id(funnel().resolve("the matrix", &candidates)), 1);
    }

    #[test]
    fn test_min_max_collapse_is_step_function() {
        // Single candidate: min == max, norm score must be 1.0 so the
        // retrieval floor cannot reject it.
        let candidates = vec![candidate(7, "The Matrix", 0.003)];
        assert_eq!(winner_id(funnel().resolve("the matrix", &candidates)), 7);
    }

    #[test]
    fn test_below_similarity_floor_is_no_match() {
        let candidates = vec![candidate(1, "Totally Different Name", 90.0)];
        let outcome = funnel().resolve("the matrix", &candidates);
        match outcome {
            Outcome::NoMatch { reason } => {
                assert!(reason.contains("even after relaxing rules"));
            }
            Outcome::Match { winner, .. } => {
                panic!("unexpected match: {}", winner.candidate.title)
            }
        }
    }

    #[test]
    fn test_below_retrieval_floor_is_filtered() {
        // Good title but bottom-of-the-pile retrieval score: the primary
        // filter drops it, and word overlap cannot raise the score floor.
        let candidates = vec![
            candidate(1, "the matrix", 1.0),
            candidate(2, "irrelevant noise", 100.0),
        ];
        let outcome = funnel().resolve("the matrix", &candidates);
        assert!(matches!(outcome, Outcome::NoMatch { .. }));
    }

    #[test]
    fn test_detail_penalty_breaks_tie() {
        let mut poor = candidate(1, "The Matrix", 80.0);
        poor.has_detail = false;
        let rich = candidate(2, "The Matrix", 80.0);

        let outcome = funnel().resolve("the matrix", &[poor, rich]);
        match outcome {
            Outcome::Match { winner, ambiguous } => {
                assert_eq!(winner.candidate.raw_id, 2);
                assert!(!ambiguous);
            }
            Outcome::NoMatch { reason } => panic!("no match: {reason}"),
        }
    }

    #[test]
    fn test_relaxed_fallback_rescues_word_overlap() {
        // Similarity floor misses: "dark knight" vs the full title scores
        // under 0.5 on bigrams alone; every query token appears as a whole
        // word, so the relaxed pass rescues it.
        let candidates = vec![candidate(5, "The Dark Knight Rises Again Tonight", 50.0)];
        let outcome = funnel().resolve("dark knight", &candidates);
        assert_eq!(winner_id(outcome), 5);
    }

    #[test]
    fn test_year_tie_break_keeps_newest() {
        let mut old = candidate(1, "Dune", 80.0);
        old.year = Some(2005);
        let mut new = candidate(2, "Dune", 80.0);
        new.year = Some(2019);

        let outcome = funnel().resolve("dune", &[old, new]);
        match outcome {
            Outcome::Match { winner, ambiguous } => {
                assert_eq!(winner.candidate.raw_id, 2);
                assert_eq!(winner.candidate.year, Some(2019));
                assert!(!ambiguous);
            }
            Outcome::NoMatch { reason } => panic!("no match: {reason}"),
        }
    }

    #[test]
    fn test_surviving_tie_is_flagged_ambiguous() {
        let mut a = candidate(1, "Dune", 80.0);
        a.year = Some(2019);
        let mut b = candidate(2, "Dune", 80.0);
        b.year = Some(2019);

        let outcome = funnel().resolve("dune", &[a, b]);
        match outcome {
            Outcome::Match { winner, ambiguous } => {
                assert!(ambiguous);
                // First survivor in stable order.
                assert_eq!(winner.candidate.raw_id, 1);
            }
            Outcome::NoMatch { reason } => panic!("no match: {reason}"),
        }
    }

    #[test]
    fn test_convergence_is_deterministic() {
        let candidates = vec![
            candidate(1, "The Matrix", 80.0),
            candidate(2, "The Matrix", 80.0),
            candidate(3, "The Matrix Reloaded", 70.0),
        ];

        let first = winner_id(funnel().resolve("the matrix", &candidates));
        for _ in 0..10 {
            assert_eq!(winner_id(funnel().resolve("the matrix", &candidates)), first);
        }
    }

    #[test]
    fn test_strict_pass_results_respect_thresholds() {
        // Whatever wins the strict pass must sit at or above both floors.
        let candidates = vec![
            candidate(1, "The Matrix", 90.0),
            candidate(2, "The Matrix Revolutions", 40.0),
        ];
        match funnel().resolve("the matrix", &candidates) {
            Outcome::Match { winner, .. } => {
                let cfg = FunnelConfig::default();
                assert!(winner.norm_score >= cfg.retrieval_floor);
                assert!(winner.similarity >= cfg.similarity_floor);
            }
            Outcome::NoMatch { reason } => panic!("no match: {reason}"),
        }
    }

    #[test]
    fn test_config_defaults() {
        let cfg = FunnelConfig::default();
        assert!((cfg.retrieval_floor - 0.6).abs() < f64::EPSILON);
        assert!((cfg.similarity_floor - 0.5).abs() < f64::EPSILON);
        assert!((cfg.detail_penalty - 0.2).abs() < f64::EPSILON);
        assert!((cfg.word_bonus - 0.1).abs() < f64::EPSILON);
        assert!((cfg.convergence_bar - 0.85).abs() < f64::EPSILON);
    }
}
