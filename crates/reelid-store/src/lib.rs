//! # reelid-store
//!
//! Durable key/value storage for cached metadata records.
//!
//! The store is a single flat namespace of string keys mapping to JSON
//! values, backed by SQLite with r2d2 connection pooling. Writes are
//! whole-record replacements; entries are overwritten in place and never
//! deleted. Freshness policy is the caller's concern — the store itself
//! enforces no TTL.

pub mod kv;
pub mod migrations;
pub mod pool;

pub use pool::{get_conn, init_memory_pool, init_pool, DbPool, PooledConnection};
