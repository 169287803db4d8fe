//! History repository — append-only log over the `history` table.
//!
//! Each row's `payload` column holds one serialized
//! [`vox_core::HistoryRecord`]. Ordering is by insertion (rowid); reads
//! upgrade legacy bare-string payloads and skip rows that fail to parse.

use rusqlite::{Connection, params};
use tracing::warn;
use uuid::Uuid;

use vox_core::{HistoryEntry, HistoryRecord};

use crate::errors::Result;

/// History repository — stateless, every method takes `&Connection`.
pub struct HistoryRepo;

impl HistoryRepo {
    /// Append one record to a session's log.
    pub fn insert(conn: &Connection, session_id: &str, record: &HistoryRecord) -> Result<()> {
        let id = format!("hst_{}", Uuid::now_v7());
        let payload = serde_json::to_string(record)?;
        let now = chrono::Utc::now().to_rfc3339();
        let _ = conn.execute(
            "INSERT INTO history (id, session_id, payload, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![id, session_id, payload, now],
        )?;
        Ok(())
    }

    /// The most recent `limit` entries for a session, oldest first.
    pub fn recent(conn: &Connection, session_id: &str, limit: usize) -> Result<Vec<HistoryEntry>> {
        let mut stmt = conn.prepare(
            "SELECT payload FROM history
             WHERE session_id = ?1
             ORDER BY rowid DESC LIMIT ?2",
        )?;
        let payloads = stmt
            .query_map(params![session_id, limit as i64], |row| {
                row.get::<_, String>(0)
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(decode_payloads(payloads.into_iter().rev()))
    }

    /// Every entry for a session, oldest first.
    pub fn list(conn: &Connection, session_id: &str) -> Result<Vec<HistoryEntry>> {
        let mut stmt = conn.prepare(
            "SELECT payload FROM history
             WHERE session_id = ?1
             ORDER BY rowid ASC",
        )?;
        let payloads = stmt
            .query_map(params![session_id], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(decode_payloads(payloads.into_iter()))
    }

    /// Count entries for a session.
    pub fn count(conn: &Connection, session_id: &str) -> Result<i64> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM history WHERE session_id = ?1",
            params![session_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

/// Decode stored payloads, upgrading legacy shapes and skipping unreadable
/// rows. A corrupt row costs one context entry, never the whole read.
fn decode_payloads(payloads: impl Iterator<Item = String>) -> Vec<HistoryEntry> {
    payloads
        .filter_map(|payload| match serde_json::from_str::<HistoryRecord>(&payload) {
            Ok(record) => Some(record.into_entry()),
            Err(err) => {
                warn!(%err, "skipping unreadable history payload");
                None
            }
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(unused_results)]
mod tests {
    use super::*;
    use crate::migrations::run_migrations;
    use crate::session::SessionRepo;
    use vox_core::IntentKind;

    fn setup() -> (Connection, String) {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        run_migrations(&conn).unwrap();
        let session = SessionRepo::create(&conn, "Sam", "Friday").unwrap();
        (conn, session.id)
    }

    fn record(command: &str, response: &str) -> HistoryRecord {
        HistoryRecord::from(HistoryEntry::new(command, response, IntentKind::General))
    }

    #[test]
    fn insert_and_list_in_order() {
        let (conn, sid) = setup();
        HistoryRepo::insert(&conn, &sid, &record("one", "1")).unwrap();
        HistoryRepo::insert(&conn, &sid, &record("two", "2")).unwrap();
        HistoryRepo::insert(&conn, &sid, &record("three", "3")).unwrap();

        let entries = HistoryRepo::list(&conn, &sid).unwrap();
        let commands: Vec<_> = entries.iter().map(|e| e.command.as_str()).collect();
        assert_eq!(commands, vec!["one", "two", "three"]);
    }

    #[test]
    fn recent_returns_newest_window_oldest_first() {
        let (conn, sid) = setup();
        for i in 1..=5 {
            HistoryRepo::insert(&conn, &sid, &record(&format!("cmd{i}"), "r")).unwrap();
        }

        let entries = HistoryRepo::recent(&conn, &sid, 3).unwrap();
        let commands: Vec<_> = entries.iter().map(|e| e.command.as_str()).collect();
        assert_eq!(commands, vec!["cmd3", "cmd4", "cmd5"]);
    }

    #[test]
    fn recent_with_fewer_entries_than_limit() {
        let (conn, sid) = setup();
        HistoryRepo::insert(&conn, &sid, &record("only", "1")).unwrap();
        let entries = HistoryRepo::recent(&conn, &sid, 3).unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn legacy_string_payload_upgrades_on_read() {
        let (conn, sid) = setup();
        // A pre-migration row: the payload is a bare JSON string.
        conn.execute(
            "INSERT INTO history (id, session_id, payload, created_at)
             VALUES ('hst_legacy', ?1, '\"open calculator\"', '2024-01-01T00:00:00Z')",
            params![sid],
        )
        .unwrap();

        let entries = HistoryRepo::list(&conn, &sid).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].command, "open calculator");
        assert_eq!(entries[0].response, "");
        assert!(!entries[0].is_complete());
    }

    #[test]
    fn unreadable_payload_is_skipped() {
        let (conn, sid) = setup();
        conn.execute(
            "INSERT INTO history (id, session_id, payload, created_at)
             VALUES ('hst_bad', ?1, 'not json at all', '2024-01-01T00:00:00Z')",
            params![sid],
        )
        .unwrap();
        HistoryRepo::insert(&conn, &sid, &record("good", "ok")).unwrap();

        let entries = HistoryRepo::list(&conn, &sid).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].command, "good");
    }

    #[test]
    fn sessions_are_isolated() {
        let (conn, sid_a) = setup();
        let sid_b = SessionRepo::create(&conn, "Max", "Jarvis").unwrap().id;
        HistoryRepo::insert(&conn, &sid_a, &record("a", "1")).unwrap();
        HistoryRepo::insert(&conn, &sid_b, &record("b", "2")).unwrap();

        assert_eq!(HistoryRepo::count(&conn, &sid_a).unwrap(), 1);
        assert_eq!(HistoryRepo::list(&conn, &sid_b).unwrap()[0].command, "b");
    }

    #[test]
    fn deleting_session_cascades_history() {
        let (conn, sid) = setup();
        HistoryRepo::insert(&conn, &sid, &record("x", "y")).unwrap();
        conn.execute("DELETE FROM sessions WHERE id = ?1", params![sid])
            .unwrap();
        assert_eq!(HistoryRepo::count(&conn, &sid).unwrap(), 0);
    }
}
