//! Database connection pool management.
//!
//! This module provides connection pooling for SQLite using r2d2. It handles
//! pool initialization, connection customization, and running migrations.

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use reelid_common::{Error, Result};

use crate::migrations;

/// Type alias for the database connection pool.
pub type DbPool = Pool<SqliteConnectionManager>;

/// Type alias for a pooled database connection.
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Initialize a new store pool with the given file path.
///
/// Creates the SQLite file if it doesn't exist, sets up pooling, and runs
/// pending migrations.
///
/// # Example
///
/// ```no_run
/// use reelid_store::pool::init_pool;
///
/// let pool = init_pool("/var/lib/reelid/cache.sqlite").unwrap();
/// let conn = pool.get().unwrap();
/// ```
pub fn init_pool(db_path: &str) -> Result<DbPool> {
    let manager = SqliteConnectionManager::file(db_path);

    let pool = Pool::builder()
        .max_size(4)
        .build(manager)
        .map_err(|e| Error::storage(format!("Failed to create connection pool: {}", e)))?;

    let conn = pool
        .get()
        .map_err(|e| Error::storage(format!("Failed to get connection for migrations: {}", e)))?;

    migrations::run_migrations(&conn)
        .map_err(|e| Error::storage(format!("Failed to run migrations: {}", e)))?;

    Ok(pool)
}

/// Initialize an in-memory store pool for testing.
///
/// The database is lost when the pool is dropped.
///
/// # Example
///
/// ```
/// use reelid_store::pool::init_memory_pool;
///
/// let pool = init_memory_pool().unwrap();
/// let conn = pool.get().unwrap();
/// ```
pub fn init_memory_pool() -> Result<DbPool> {
    let manager = SqliteConnectionManager::memory();

    // A single connection so every test handle sees the same in-memory
    // database.
    let pool = Pool::builder()
        .max_size(1)
        .build(manager)
        .map_err(|e| Error::storage(format!("Failed to create in-memory pool: {}", e)))?;

    let conn = pool
        .get()
        .map_err(|e| Error::storage(format!("Failed to get connection for migrations: {}", e)))?;

    migrations::run_migrations(&conn)
        .map_err(|e| Error::storage(format!("Failed to run migrations: {}", e)))?;

    Ok(pool)
}

/// Get a connection from the pool.
///
/// Convenience wrapper around `pool.get()` that converts the r2d2 error into
/// our common Error type.
pub fn get_conn(pool: &DbPool) -> Result<PooledConnection> {
    pool.get()
        .map_err(|e| Error::storage(format!("Failed to get connection from pool: {}", e)))
}
