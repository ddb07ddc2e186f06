//! Cache-through access to full media records.
//!
//! Show and movie records are cached forever under their canonical
//! identifier: unlike season listings they have no freshness rule, and a
//! stale overview is harmless. A cache miss triggers one live backend fetch
//! and a write-back.

use std::sync::Arc;

use reelid_common::{Error, ImdbId, Result};
use tracing::debug;

use crate::metadata::provider::{MediaRecord, SearchBackend};
use crate::metadata::MetadataCache;

/// Cache-through fetcher for full media records.
#[derive(Clone)]
pub struct RecordFetcher {
    backend: Arc<dyn SearchBackend>,
    cache: MetadataCache,
}

impl RecordFetcher {
    pub fn new(backend: Arc<dyn SearchBackend>, cache: MetadataCache) -> Self {
        Self { backend, cache }
    }

    /// Fetch the full record for an identifier, preferring the cache.
    pub async fn record(&self, id: ImdbId) -> Result<MediaRecord> {
        let key = id.to_string();

        if let Some(value) = self.cache.get(&key)? {
            debug!(id = %key, "record served from cache");
            return serde_json::from_value(value)
                .map_err(|e| Error::integrity(format!("cached record for {key} is malformed: {e}")));
        }

        let record = self
            .backend
            .find_by_imdb(id)
            .await?
            .ok_or_else(|| Error::not_found(format!("no record found for {key}")))?;

        let value = serde_json::to_value(&record)
            .map_err(|e| Error::internal(format!("record for {key} failed to serialize: {e}")))?;
        self.cache.set(&key, &value)?;

        debug!(id = %key, "record fetched and cached");
        Ok(record)
    }
}
