//! Session repository — CRUD for the `sessions` table.
//!
//! A session is the minimal identity the pipeline needs: who the user is,
//! what the assistant is called, and which history log exchanges belong to.

use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use uuid::Uuid;

use crate::errors::Result;

/// One stored session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRow {
    /// Session id (`ses_` + UUIDv7).
    pub id: String,
    /// The user's display name.
    pub user_name: String,
    /// The assistant's configured name.
    pub assistant_name: String,
    /// Creation timestamp, RFC 3339.
    pub created_at: String,
}

/// Session repository — stateless, every method takes `&Connection`.
pub struct SessionRepo;

impl SessionRepo {
    /// Create a new session.
    pub fn create(conn: &Connection, user_name: &str, assistant_name: &str) -> Result<SessionRow> {
        let id = format!("ses_{}", Uuid::now_v7());
        let now = chrono::Utc::now().to_rfc3339();
        let _ = conn.execute(
            "INSERT INTO sessions (id, user_name, assistant_name, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![id, user_name, assistant_name, now],
        )?;
        Ok(SessionRow {
            id,
            user_name: user_name.to_string(),
            assistant_name: assistant_name.to_string(),
            created_at: now,
        })
    }

    /// Get session by ID.
    pub fn get_by_id(conn: &Connection, session_id: &str) -> Result<Option<SessionRow>> {
        let row = conn
            .query_row(
                "SELECT id, user_name, assistant_name, created_at
                 FROM sessions WHERE id = ?1",
                params![session_id],
                |row| {
                    Ok(SessionRow {
                        id: row.get(0)?,
                        user_name: row.get(1)?,
                        assistant_name: row.get(2)?,
                        created_at: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    /// Check if a session exists.
    pub fn exists(conn: &Connection, session_id: &str) -> Result<bool> {
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sessions WHERE id = ?1)",
            params![session_id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
