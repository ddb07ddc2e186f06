//! Metadata cache facade over the durable key/value store.
//!
//! Keys are canonical identifiers (`tt0133093`) for show/movie records and
//! `identifier_season` (`tt0903747_2`) for season listings. The cache itself
//! has no notion of freshness — the episode resolver decides when a season
//! entry is stale and overwrites it in place.

use reelid_store::{get_conn, kv, DbPool};
use serde_json::Value;

use reelid_common::Result;

/// Shared handle to the durable metadata cache.
#[derive(Clone)]
pub struct MetadataCache {
    pool: DbPool,
}

impl MetadataCache {
    /// Wrap a store pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Fetch a cached value. `None` when the key has never been written.
    pub fn get(&self, key: &str) -> Result<Option<Value>> {
        let conn = get_conn(&self.pool)?;
        kv::get(&conn, key)
    }

    /// Store a value, replacing any existing record for the key.
    pub fn set(&self, key: &str, value: &Value) -> Result<()> {
        let conn = get_conn(&self.pool)?;
        kv::set(&conn, key, value)
    }

    /// Check whether a key has ever been written.
    pub fn has(&self, key: &str) -> Result<bool> {
        let conn = get_conn(&self.pool)?;
        kv::has(&conn, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelid_store::init_memory_pool;
    use serde_json::json;

    #[test]
    fn test_cache_round_trip() {
        let cache = MetadataCache::new(init_memory_pool().unwrap());

        assert!(!cache.has("tt0133093").unwrap());
        assert!(cache.get("tt0133093").unwrap().is_none());

        let value = json!({"title": "The Matrix"});
        cache.set("tt0133093", &value).unwrap();

        assert!(cache.has("tt0133093").unwrap());
        assert_eq!(cache.get("tt0133093").unwrap(), Some(value));
    }

    #[test]
    fn test_cache_overwrites_whole_record() {
        let cache = MetadataCache::new(init_memory_pool().unwrap());

        cache
            .set("tt0903747_2", &json!({"episodes": [1, 2], "cached_at": "a"}))
            .unwrap();
        cache
            .set("tt0903747_2", &json!({"episodes": [1, 2, 3]}))
            .unwrap();

        let value = cache.get("tt0903747_2").unwrap().unwrap();
        // Whole-record replacement: the old cached_at must not survive.
        assert!(value.get("cached_at").is_none());
        assert_eq!(value["episodes"].as_array().unwrap().len(), 3);
    }
}
