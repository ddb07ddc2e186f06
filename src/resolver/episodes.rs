//! Episode resolution with a season-level freshness policy.
//!
//! For each `(identifier, season)` pair a request ends in one of two states:
//! served from a fresh cache entry, or served from a live fetch that was
//! just written back. A season entry is fresh when its `cached_at` stamp is
//! within the freshness TTL; an absent entry, an over-age stamp, or a
//! missing stamp all count as stale and trigger a re-fetch. Stale entries
//! are overwritten in place, never deleted.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use tracing::debug;

use reelid_common::{Error, ImdbId, Result};

use super::records::RecordFetcher;
use crate::metadata::provider::{EpisodeRecord, SearchBackend, SeasonRecord};
use crate::metadata::MetadataCache;

/// Resolves "episode N of season S of show X" through the metadata cache.
pub struct EpisodeResolver {
    backend: Arc<dyn SearchBackend>,
    cache: MetadataCache,
    records: RecordFetcher,
    freshness: Duration,
}

impl EpisodeResolver {
    pub fn new(
        backend: Arc<dyn SearchBackend>,
        cache: MetadataCache,
        records: RecordFetcher,
        freshness_days: i64,
    ) -> Self {
        Self {
            backend,
            cache,
            records,
            freshness: Duration::days(freshness_days),
        }
    }

    /// Resolve one episode's detail blob.
    ///
    /// Fails fatally (propagated, not retried) when the owning show record
    /// is missing a numeric backend id, when the identifier is not an
    /// episodic title, or when the episode is absent from the season.
    pub async fn episode(&self, id: ImdbId, season: u32, episode: u32) -> Result<EpisodeRecord> {
        let record = self.records.record(id).await?;

        if !record.kind.is_episodic() {
            return Err(Error::integrity(format!(
                "{id} is a {}, not an episodic title",
                record.kind
            )));
        }

        let backend_id = record.backend_id.ok_or_else(|| {
            Error::integrity(format!("record for {id} has no numeric backend id"))
        })?;

        let season_record = self.season(id, backend_id, season).await?;

        season_record
            .episodes
            .into_iter()
            .find(|e| e.episode_number == episode)
            .ok_or_else(|| {
                Error::not_found(format!("episode {episode} not found in season {season} of {id}"))
            })
    }

    /// Fetch one season's listing, honoring the freshness TTL.
    async fn season(&self, id: ImdbId, backend_id: u64, season: u32) -> Result<SeasonRecord> {
        let key = format!("{id}_{season}");

        if let Some(value) = self.cache.get(&key)? {
            if is_fresh(&value, self.freshness) {
                debug!(key = %key, "season served from cache");
                return serde_json::from_value(value).map_err(|e| {
                    Error::integrity(format!("cached season {key} is malformed: {e}"))
                });
            }
            debug!(key = %key, "season cache entry is stale, re-fetching");
        }

        let fetched = self.backend.fetch_season(backend_id, season).await?;

        let mut value = serde_json::to_value(&fetched)
            .map_err(|e| Error::internal(format!("season {key} failed to serialize: {e}")))?;
        if let Some(map) = value.as_object_mut() {
            map.insert(
                "cached_at".to_string(),
                Value::String(Utc::now().to_rfc3339()),
            );
        }
        self.cache.set(&key, &value)?;

        debug!(key = %key, episodes = fetched.episodes.len(), "season fetched and cached");
        Ok(fetched)
    }
}

/// A cache entry is fresh when it carries a parseable `cached_at` stamp
/// within the TTL. A missing stamp is stale by definition.
fn is_fresh(value: &Value, ttl: Duration) -> bool {
    value
        .get("cached_at")
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|stamp| Utc::now().signed_duration_since(stamp.with_timezone(&Utc)) <= ttl)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::provider::{Candidate, MediaRecord, SearchFilters};
    use async_trait::async_trait;
    use reelid_common::MediaKind;
    use reelid_store::init_memory_pool;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubBackend {
        record: MediaRecord,
        season_calls: AtomicUsize,
    }

    #[async_trait]
    impl SearchBackend for StubBackend {
        fn name(&self) -> &'static str {
            "stub"
        }

        fn is_available(&self) -> bool {
            true
        }

        async fn search(&self, _title: &str, _filters: &SearchFilters) -> Result<Vec<Candidate>> {
            Ok(Vec::new())
        }

        async fn imdb_id(&self, _raw_id: u64, _kind: MediaKind) -> Result<Option<ImdbId>> {
            Ok(None)
        }

        async fn find_by_imdb(&self, _id: ImdbId) -> Result<Option<MediaRecord>> {
            Ok(Some(self.record.clone()))
        }

        async fn fetch_season(&self, _backend_id: u64, season: u32) -> Result<SeasonRecord> {
            self.season_calls.fetch_add(1, Ordering::SeqCst);
            Ok(SeasonRecord {
                season_number: season,
                episodes: vec![
                    EpisodeRecord {
                        episode_number: 1,
                        name: Some("Pilot".to_string()),
                        overview: None,
                        runtime: Some(47),
                        still_path: None,
                        air_date: Some("2008-01-20".to_string()),
                    },
                    EpisodeRecord {
                        episode_number: 2,
                        name: Some("Cat's in the Bag...".to_string()),
                        overview: None,
                        runtime: Some(48),
                        still_path: None,
                        air_date: Some("2008-01-27".to_string()),
                    },
                ],
            })
        }
    }

    fn show_record() -> MediaRecord {
        MediaRecord {
            imdb_id: ImdbId::from_numeric(903747),
            backend_id: Some(1396),
            title: "Breaking Bad".to_string(),
            kind: MediaKind::Series,
            year: Some(2008),
            overview: None,
            poster_path: None,
            backdrop_path: None,
        }
    }

    fn build(record: MediaRecord) -> (EpisodeResolver, MetadataCache, Arc<StubBackend>) {
        let backend = Arc::new(StubBackend {
            record,
            season_calls: AtomicUsize::new(0),
        });
        let cache = MetadataCache::new(init_memory_pool().unwrap());
        let records = RecordFetcher::new(backend.clone(), cache.clone());
        let resolver = EpisodeResolver::new(backend.clone(), cache.clone(), records, 7);
        (resolver, cache, backend)
    }

    fn season_value(cached_at: Option<DateTime<Utc>>) -> Value {
        let mut value = json!({
            "season_number": 1,
            "episodes": [
                {
                    "episode_number": 1,
                    "name": "Cached Pilot",
                    "overview": null,
                    "runtime": 47,
                    "still_path": null,
                    "air_date": "2008-01-20"
                }
            ]
        });
        if let Some(stamp) = cached_at {
            value["cached_at"] = json!(stamp.to_rfc3339());
        }
        value
    }

    #[tokio::test]
    async fn test_fetches_and_serves_episode() {
        let (resolver, cache, backend) = build(show_record());
        let id = ImdbId::from_numeric(903747);

        let episode = resolver.episode(id, 1, 2).await.unwrap();
        assert_eq!(episode.episode_number, 2);
        assert_eq!(backend.season_calls.load(Ordering::SeqCst), 1);

        // The season listing was written back with a freshness stamp.
        let cached = cache.get("tt0903747_1").unwrap().unwrap();
        assert!(cached.get("cached_at").is_some());
    }

    #[tokio::test]
    async fn test_fresh_cache_entry_skips_fetch() {
        let (resolver, cache, backend) = build(show_record());
        let id = ImdbId::from_numeric(903747);

        let three_days_ago = Utc::now() - Duration::days(3);
        cache
            .set("tt0903747_1", &season_value(Some(three_days_ago)))
            .unwrap();

        let episode = resolver.episode(id, 1, 1).await.unwrap();
        assert_eq!(episode.name.as_deref(), Some("Cached Pilot"));
        assert_eq!(backend.season_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_stale_cache_entry_refetches() {
        let (resolver, cache, backend) = build(show_record());
        let id = ImdbId::from_numeric(903747);

        let eight_days_ago = Utc::now() - Duration::days(8);
        cache
            .set("tt0903747_1", &season_value(Some(eight_days_ago)))
            .unwrap();

        let episode = resolver.episode(id, 1, 1).await.unwrap();
        assert_eq!(episode.name.as_deref(), Some("Pilot"));
        assert_eq!(backend.season_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_timestamp_counts_as_stale() {
        let (resolver, cache, backend) = build(show_record());
        let id = ImdbId::from_numeric(903747);

        cache.set("tt0903747_1", &season_value(None)).unwrap();

        resolver.episode(id, 1, 1).await.unwrap();
        assert_eq!(backend.season_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_movie_is_an_integrity_fault() {
        let mut record = show_record();
        record.kind = MediaKind::Movie;
        let (resolver, _cache, _backend) = build(record);

        let err = resolver
            .episode(ImdbId::from_numeric(903747), 1, 1)
            .await
            .expect_err("expected integrity fault");
        assert!(matches!(err, Error::DataIntegrity(_)));
    }

    #[tokio::test]
    async fn test_missing_backend_id_is_an_integrity_fault() {
        let mut record = show_record();
        record.backend_id = None;
        let (resolver, _cache, _backend) = build(record);

        let err = resolver
            .episode(ImdbId::from_numeric(903747), 1, 1)
            .await
            .expect_err("expected integrity fault");
        assert!(matches!(err, Error::DataIntegrity(_)));
        assert!(err.to_string().contains("numeric backend id"));
    }

    #[tokio::test]
    async fn test_absent_episode_is_not_found() {
        let (resolver, _cache, _backend) = build(show_record());

        let err = resolver
            .episode(ImdbId::from_numeric(903747), 1, 99)
            .await
            .expect_err("expected not-found");
        assert!(matches!(err, Error::NotFound(_)));
    }
}
