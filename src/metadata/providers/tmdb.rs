//! TMDB (The Movie Database) retrieval backend.
//!
//! Implements [`SearchBackend`] by querying the TMDB v3 REST API.
//!
//! Features:
//! - Token-bucket rate limiting at 4 requests / second via [`governor`].
//! - Automatic retry on HTTP 429 with `Retry-After` header support (max 3 retries).
//! - 30-second request timeout.
//! - Hard kind/year filters applied through distinct search endpoints and
//!   backend-side year parameters, plus an original-language allowlist.

use std::num::NonZeroU32;
use std::time::Duration;

use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, warn};

use reelid_common::{Error, ImdbId, MediaKind, Result};

use crate::config::BackendConfig;
use crate::metadata::provider::{
    Candidate, EpisodeRecord, MediaRecord, SearchBackend, SearchFilters, SeasonRecord,
};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_RETRIES: u32 = 3;

// ---------------------------------------------------------------------------
// TMDB API response types (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TmdbSearchResponse<T> {
    results: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct TmdbMovieResult {
    id: u64,
    title: Option<String>,
    release_date: Option<String>,
    overview: Option<String>,
    poster_path: Option<String>,
    original_language: Option<String>,
    #[serde(default)]
    popularity: f64,
}

#[derive(Debug, Deserialize)]
struct TmdbTvResult {
    id: u64,
    name: Option<String>,
    first_air_date: Option<String>,
    overview: Option<String>,
    poster_path: Option<String>,
    original_language: Option<String>,
    #[serde(default)]
    popularity: f64,
}

#[derive(Debug, Deserialize)]
struct TmdbExternalIds {
    imdb_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TmdbFindResponse {
    #[serde(default)]
    movie_results: Vec<TmdbFindMovie>,
    #[serde(default)]
    tv_results: Vec<TmdbFindTv>,
}

#[derive(Debug, Deserialize)]
struct TmdbFindMovie {
    id: u64,
    title: Option<String>,
    release_date: Option<String>,
    overview: Option<String>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TmdbFindTv {
    id: u64,
    name: Option<String>,
    first_air_date: Option<String>,
    overview: Option<String>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TmdbSeasonResponse {
    season_number: u32,
    #[serde(default)]
    episodes: Vec<TmdbEpisode>,
}

#[derive(Debug, Deserialize)]
struct TmdbEpisode {
    episode_number: u32,
    name: Option<String>,
    overview: Option<String>,
    runtime: Option<u32>,
    still_path: Option<String>,
    air_date: Option<String>,
}

// ---------------------------------------------------------------------------
// Backend implementation
// ---------------------------------------------------------------------------

/// TMDB retrieval backend.
///
/// Wraps the TMDB v3 REST API with built-in rate limiting and retry logic.
pub struct TmdbBackend {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    language: String,
    allowed_languages: Vec<String>,
    page_limit: usize,
    rate_limiter: governor::RateLimiter<
        governor::state::NotKeyed,
        governor::state::InMemoryState,
        governor::clock::DefaultClock,
    >,
}

impl TmdbBackend {
    /// Create a new TMDB backend from configuration.
    ///
    /// Rate limiting is configured at 4 requests per second.
    pub fn new(config: &BackendConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to build reqwest client");

        let quota = Quota::per_second(NonZeroU32::new(4).expect("nonzero quota"));
        let rate_limiter = RateLimiter::direct(quota);

        Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            language: config.language.clone(),
            allowed_languages: config.allowed_languages.clone(),
            page_limit: config.page_limit,
            rate_limiter,
        }
    }

    /// Execute a GET request with rate limiting and 429-retry logic.
    async fn get(&self, url: &str) -> Result<reqwest::Response> {
        let mut retries = 0u32;
        loop {
            self.rate_limiter.until_ready().await;

            let resp = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| Error::backend(format!("TMDB request failed: {e}")))?;

            if resp.status() == StatusCode::TOO_MANY_REQUESTS && retries < MAX_RETRIES {
                retries += 1;
                let wait = resp
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(1);
                warn!(
                    retry = retries,
                    wait_secs = wait,
                    "TMDB returned 429, backing off"
                );
                tokio::time::sleep(Duration::from_secs(wait)).await;
                continue;
            }

            if !resp.status().is_success() {
                return Err(Error::backend(format!(
                    "TMDB returned {} for {url}",
                    resp.status()
                )));
            }

            return Ok(resp);
        }
    }

    /// Build a full API URL with the API key and language query parameters.
    fn url(&self, path: &str, extra_params: &[(&str, &str)]) -> String {
        let mut url = format!(
            "{}{path}?api_key={}&language={}",
            self.base_url, self.api_key, self.language
        );
        for (key, value) in extra_params {
            url.push('&');
            url.push_str(key);
            url.push('=');
            url.push_str(&urlencoded(value));
        }
        url
    }

    fn language_allowed(&self, language: Option<&str>) -> bool {
        language_allowed(&self.allowed_languages, language)
    }
}

/// Minimal percent-encoding for query parameter values.
fn urlencoded(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char);
            }
            b' ' => out.push('+'),
            _ => {
                out.push('%');
                out.push(char::from(HEX[(b >> 4) as usize]));
                out.push(char::from(HEX[(b & 0x0f) as usize]));
            }
        }
    }
    out
}

const HEX: [u8; 16] = *b"0123456789ABCDEF";

/// Extract a four-digit year from a date string like `"2023-04-15"`.
fn parse_year(date: &Option<String>) -> Option<u16> {
    date.as_deref()
        .and_then(|d| d.get(..4))
        .and_then(|y| y.parse::<u16>().ok())
}

/// Apply the original-language allowlist. An empty allowlist admits
/// everything; a result without a language field is never admitted by a
/// non-empty allowlist.
fn language_allowed(allowed: &[String], language: Option<&str>) -> bool {
    if allowed.is_empty() {
        return true;
    }
    language.is_some_and(|lang| allowed.iter().any(|a| a == lang))
}

/// Detail richness proxy: TMDB search payloads carry no runtime, so a record
/// counts as well-documented when it has both an overview and a poster.
fn payload_has_detail(overview: &Option<String>, poster_path: &Option<String>) -> bool {
    overview.as_deref().is_some_and(|o| !o.is_empty()) && poster_path.is_some()
}

impl TmdbMovieResult {
    fn into_candidate(self) -> Candidate {
        let has_detail = payload_has_detail(&self.overview, &self.poster_path);
        Candidate {
            raw_id: self.id,
            title: self.title.unwrap_or_default(),
            score: self.popularity,
            year: parse_year(&self.release_date),
            kind: MediaKind::Movie,
            has_detail,
        }
    }
}

impl TmdbTvResult {
    fn into_candidate(self) -> Candidate {
        let has_detail = payload_has_detail(&self.overview, &self.poster_path);
        Candidate {
            raw_id: self.id,
            title: self.name.unwrap_or_default(),
            score: self.popularity,
            year: parse_year(&self.first_air_date),
            kind: MediaKind::Series,
            has_detail,
        }
    }
}

#[async_trait]
impl SearchBackend for TmdbBackend {
    fn name(&self) -> &'static str {
        "tmdb"
    }

    fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn search(&self, title: &str, filters: &SearchFilters) -> Result<Vec<Candidate>> {
        let year_str = filters.year.map(|y| y.to_string());

        let candidates = match filters.kind {
            MediaKind::Movie => {
                let mut params = vec![("query", title), ("page", "1")];
                if let Some(ref y) = year_str {
                    params.push(("year", y.as_str()));
                }
                let url = self.url("/search/movie", &params);
                debug!(url = %url, "TMDB search movie");

                let body: TmdbSearchResponse<TmdbMovieResult> = self
                    .get(&url)
                    .await?
                    .json()
                    .await
                    .map_err(|e| {
                        Error::backend(format!("failed to parse TMDB movie search response: {e}"))
                    })?;

                body.results
                    .into_iter()
                    .filter(|r| self.language_allowed(r.original_language.as_deref()))
                    .map(TmdbMovieResult::into_candidate)
                    .collect::<Vec<_>>()
            }
            MediaKind::Series => {
                let mut params = vec![("query", title), ("page", "1")];
                if let Some(ref y) = year_str {
                    params.push(("first_air_date_year", y.as_str()));
                }
                let url = self.url("/search/tv", &params);
                debug!(url = %url, "TMDB search TV");

                let body: TmdbSearchResponse<TmdbTvResult> = self
                    .get(&url)
                    .await?
                    .json()
                    .await
                    .map_err(|e| {
                        Error::backend(format!("failed to parse TMDB TV search response: {e}"))
                    })?;

                body.results
                    .into_iter()
                    .filter(|r| self.language_allowed(r.original_language.as_deref()))
                    .map(TmdbTvResult::into_candidate)
                    .collect::<Vec<_>>()
            }
        };

        Ok(candidates.into_iter().take(self.page_limit).collect())
    }

    async fn imdb_id(&self, raw_id: u64, kind: MediaKind) -> Result<Option<ImdbId>> {
        let path = match kind {
            MediaKind::Movie => format!("/movie/{raw_id}/external_ids"),
            MediaKind::Series => format!("/tv/{raw_id}/external_ids"),
        };
        let url = self.url(&path, &[]);
        debug!(url = %url, "TMDB external ids");

        let ids: TmdbExternalIds = self
            .get(&url)
            .await?
            .json()
            .await
            .map_err(|e| Error::backend(format!("failed to parse TMDB external ids: {e}")))?;

        Ok(ids
            .imdb_id
            .as_deref()
            .and_then(|raw| ImdbId::parse(raw).ok()))
    }

    async fn find_by_imdb(&self, id: ImdbId) -> Result<Option<MediaRecord>> {
        let url = self.url(
            &format!("/find/{id}"),
            &[("external_source", "imdb_id")],
        );
        debug!(url = %url, "TMDB find by IMDB id");

        let found: TmdbFindResponse = self
            .get(&url)
            .await?
            .json()
            .await
            .map_err(|e| Error::backend(format!("failed to parse TMDB find response: {e}")))?;

        if let Some(movie) = found.movie_results.into_iter().next() {
            return Ok(Some(MediaRecord {
                imdb_id: id,
                backend_id: Some(movie.id),
                title: movie.title.unwrap_or_default(),
                kind: MediaKind::Movie,
                year: parse_year(&movie.release_date),
                overview: movie.overview,
                poster_path: movie.poster_path,
                backdrop_path: movie.backdrop_path,
            }));
        }

        if let Some(tv) = found.tv_results.into_iter().next() {
            return Ok(Some(MediaRecord {
                imdb_id: id,
                backend_id: Some(tv.id),
                title: tv.name.unwrap_or_default(),
                kind: MediaKind::Series,
                year: parse_year(&tv.first_air_date),
                overview: tv.overview,
                poster_path: tv.poster_path,
                backdrop_path: tv.backdrop_path,
            }));
        }

        Ok(None)
    }

    async fn fetch_season(&self, backend_id: u64, season: u32) -> Result<SeasonRecord> {
        let url = self.url(&format!("/tv/{backend_id}/season/{season}"), &[]);
        debug!(url = %url, "TMDB fetch season");

        let body: TmdbSeasonResponse = self
            .get(&url)
            .await?
            .json()
            .await
            .map_err(|e| Error::backend(format!("failed to parse TMDB season response: {e}")))?;

        Ok(SeasonRecord {
            season_number: body.season_number,
            episodes: body
                .episodes
                .into_iter()
                .map(|e| EpisodeRecord {
                    episode_number: e.episode_number,
                    name: e.name,
                    overview: e.overview,
                    runtime: e.runtime,
                    still_path: e.still_path,
                    air_date: e.air_date,
                })
                .collect(),
        })
    }
}
