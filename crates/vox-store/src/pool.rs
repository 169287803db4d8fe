//! Connection pool over rusqlite.

use std::path::Path;

use r2d2_sqlite::SqliteConnectionManager;

use crate::errors::Result;
use crate::migrations::run_migrations;

/// Pooled SQLite connections.
pub type ConnectionPool = r2d2::Pool<SqliteConnectionManager>;
/// One checked-out connection.
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

const MAX_POOL_SIZE: u32 = 8;

/// Open (or create) the database at `path`, run migrations, and return the
/// pool. Every connection gets WAL mode, foreign keys, and a busy timeout.
pub fn open_pool(path: &Path) -> Result<ConnectionPool> {
    let manager = SqliteConnectionManager::file(path).with_init(|conn| {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )
    });
    let pool = r2d2::Pool::builder().max_size(MAX_POOL_SIZE).build(manager)?;
    let conn = pool.get()?;
    run_migrations(&conn)?;
    Ok(pool)
}
