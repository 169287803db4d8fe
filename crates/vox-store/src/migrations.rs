//! Schema setup. Idempotent: safe to run on every open.

use rusqlite::Connection;

use crate::errors::Result;

/// Create tables and indexes if missing.
///
/// `history.payload` holds one serialized `HistoryRecord` per row; rows
/// written before the structured format are bare JSON strings and are
/// upgraded at read time, never rewritten.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS sessions (
            id             TEXT PRIMARY KEY,
            user_name      TEXT NOT NULL,
            assistant_name TEXT NOT NULL,
            created_at     TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS history (
            id         TEXT PRIMARY KEY,
            session_id TEXT NOT NULL REFERENCES sessions(id) ON DELETE CASCADE,
            payload    TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_history_session_created
            ON history(session_id, created_at);",
    )?;
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
