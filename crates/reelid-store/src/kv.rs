//! Key/value cache queries.
//!
//! The cache contract is deliberately small: `get`, `set`, `has`. Values are
//! arbitrary JSON documents. `set` is a whole-record upsert, so concurrent
//! writers racing on the same key can only replace complete records — a
//! redundant re-fetch is acceptable, a torn record is not.

use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;

use reelid_common::{Error, Result};

/// Fetch a value by key. Returns `None` when the key is absent.
pub fn get(conn: &Connection, key: &str) -> Result<Option<Value>> {
    let raw: Option<String> = conn
        .query_row("SELECT value FROM cache WHERE key = ?1", params![key], |row| {
            row.get(0)
        })
        .optional()
        .map_err(|e| Error::storage(format!("cache get failed for {key}: {e}")))?;

    match raw {
        Some(text) => {
            let value = serde_json::from_str(&text)
                .map_err(|e| Error::storage(format!("cache entry for {key} is not JSON: {e}")))?;
            Ok(Some(value))
        }
        None => Ok(None),
    }
}

/// Store a value under a key, replacing any existing record.
pub fn set(conn: &Connection, key: &str, value: &Value) -> Result<()> {
    let text = serde_json::to_string(value)
        .map_err(|e| Error::storage(format!("cache value for {key} failed to serialize: {e}")))?;

    conn.execute(
        "INSERT INTO cache (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        params![key, text],
    )
    .map_err(|e| Error::storage(format!("cache set failed for {key}: {e}")))?;

    Ok(())
}

/// Check whether a key exists.
pub fn has(conn: &Connection, key: &str) -> Result<bool> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM cache WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .map_err(|e| Error::storage(format!("cache has failed for {key}: {e}")))?;

    Ok(count > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{get_conn, init_memory_pool};
    use serde_json::json;

    #[test]
    fn test_get_absent_key() {
        let pool = init_memory_pool().unwrap();
        let conn = get_conn(&pool).unwrap();

        assert!(get(&conn, "tt0000001").unwrap().is_none());
        assert!(!has(&conn, "tt0000001").unwrap());
    }

    #[test]
    fn test_set_then_get() {
        let pool = init_memory_pool().unwrap();
        let conn = get_conn(&pool).unwrap();

        let value = json!({"title": "The Matrix", "year": 1999});
        set(&conn, "tt0133093", &value).unwrap();

        assert!(has(&conn, "tt0133093").unwrap());
        assert_eq!(get(&conn, "tt0133093").unwrap(), Some(value));
    }

    #[test]
    fn test_set_overwrites_in_place() {
        let pool = init_memory_pool().unwrap();
        let conn = get_conn(&pool).unwrap();

        set(&conn, "tt0133093_1", &json!({"cached_at": "old"})).unwrap();
        set(&conn, "tt0133093_1", &json!({"cached_at": "new"})).unwrap();

        let value = get(&conn, "tt0133093_1").unwrap().unwrap();
        assert_eq!(value["cached_at"], "new");

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM cache", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_season_keys_share_namespace_with_show_keys() {
        let pool = init_memory_pool().unwrap();
        let conn = get_conn(&pool).unwrap();

        set(&conn, "tt0903747", &json!({"title": "Breaking Bad"})).unwrap();
        set(&conn, "tt0903747_2", &json!({"episodes": []})).unwrap();

        assert!(has(&conn, "tt0903747").unwrap());
        assert!(has(&conn, "tt0903747_2").unwrap());
        assert!(!has(&conn, "tt0903747_3").unwrap());
    }
}
