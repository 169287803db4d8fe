//! Async facade over the pooled repositories.
//!
//! SQLite calls are blocking; every method hops to the blocking pool so the
//! interpreter's async path never stalls a runtime worker.

use std::path::Path;

use async_trait::async_trait;
use tracing::instrument;

use vox_core::{HistoryEntry, HistoryRecord, HistoryStore, StoreError};

use crate::errors::Result;
use crate::history::HistoryRepo;
use crate::pool::{ConnectionPool, open_pool};
use crate::session::{SessionRepo, SessionRow};

/// SQLite-backed session and history store. Cheap to clone (shared pool).
#[derive(Clone)]
pub struct SqliteStore {
    pool: ConnectionPool,
}

impl SqliteStore {
    /// Open (or create) the database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self {
            pool: open_pool(path)?,
        })
    }

    /// Wrap an existing pool.
    #[must_use]
    pub fn with_pool(pool: ConnectionPool) -> Self {
        Self { pool }
    }

    /// Create a session with the given persona.
    #[instrument(skip(self))]
    pub async fn create_session(
        &self,
        user_name: &str,
        assistant_name: &str,
    ) -> std::result::Result<SessionRow, StoreError> {
        let pool = self.pool.clone();
        let user_name = user_name.to_owned();
        let assistant_name = assistant_name.to_owned();
        run_blocking(move || {
            let conn = pool.get().map_err(crate::DbError::from)?;
            Ok(SessionRepo::create(&conn, &user_name, &assistant_name)?)
        })
        .await
    }

    /// Look up a session by id.
    pub async fn get_session(
        &self,
        session_id: &str,
    ) -> std::result::Result<Option<SessionRow>, StoreError> {
        let pool = self.pool.clone();
        let session_id = session_id.to_owned();
        run_blocking(move || {
            let conn = pool.get().map_err(crate::DbError::from)?;
            Ok(SessionRepo::get_by_id(&conn, &session_id)?)
        })
        .await
    }

    /// Every history entry for a session, oldest first.
    pub async fn session_history(
        &self,
        session_id: &str,
    ) -> std::result::Result<Vec<HistoryEntry>, StoreError> {
        let pool = self.pool.clone();
        let session_id = session_id.to_owned();
        run_blocking(move || {
            let conn = pool.get().map_err(crate::DbError::from)?;
            require_session(&conn, &session_id)?;
            Ok(HistoryRepo::list(&conn, &session_id)?)
        })
        .await
    }
}

#[async_trait]
impl HistoryStore for SqliteStore {
    async fn load(
        &self,
        session_id: &str,
        limit: usize,
    ) -> std::result::Result<Vec<HistoryEntry>, StoreError> {
        let pool = self.pool.clone();
        let session_id = session_id.to_owned();
        run_blocking(move || {
            let conn = pool.get().map_err(crate::DbError::from)?;
            require_session(&conn, &session_id)?;
            Ok(HistoryRepo::recent(&conn, &session_id, limit)?)
        })
        .await
    }

    async fn append(
        &self,
        session_id: &str,
        entry: HistoryEntry,
    ) -> std::result::Result<(), StoreError> {
        let pool = self.pool.clone();
        let session_id = session_id.to_owned();
        run_blocking(move || {
            let conn = pool.get().map_err(crate::DbError::from)?;
            require_session(&conn, &session_id)?;
            Ok(HistoryRepo::insert(
                &conn,
                &session_id,
                &HistoryRecord::from(entry),
            )?)
        })
        .await
    }
}

fn require_session(
    conn: &rusqlite::Connection,
    session_id: &str,
) -> std::result::Result<(), StoreError> {
    let exists = SessionRepo::exists(conn, session_id).map_err(crate::DbError::from)?;
    if exists {
        Ok(())
    } else {
        Err(StoreError::UnknownSession(session_id.to_owned()))
    }
}

async fn run_blocking<T: Send + 'static>(
    f: impl FnOnce() -> std::result::Result<T, StoreError> + Send + 'static,
) -> std::result::Result<T, StoreError> {
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|err| StoreError::Backend(format!("blocking task failed: {err}")))?
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
