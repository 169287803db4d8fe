//! Store-internal error type.

use vox_core::StoreError;

/// Errors from the SQLite layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// SQLite failure.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Connection pool failure.
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),
    /// Payload (de)serialization failure.
    #[error("payload serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Store-internal result alias.
pub type Result<T> = std::result::Result<T, DbError>;

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        StoreError::Backend(err.to_string())
    }
}
