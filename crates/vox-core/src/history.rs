//! Conversation history types and the store trait.
//!
//! History is an ordered, append-only-per-session log. Entries written before
//! the structured format existed are bare command strings; [`HistoryRecord`]
//! absorbs both shapes and upgrades legacy records at read time. The legacy
//! shape is never written going forward.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::intent::IntentKind;

/// One completed exchange: what the user said and what the assistant answered.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// The user's command text.
    pub command: String,
    /// The final spoken response (post-override, post-degradation).
    pub response: String,
    /// The intent the command resolved to.
    #[serde(rename = "type", default, deserialize_with = "coerce_intent")]
    pub intent: IntentKind,
    /// When the exchange completed.
    pub timestamp: DateTime<Utc>,
}

/// Deserialize an intent tag, coercing unknown tags to `general`.
///
/// Stored rows predating a vocabulary change must stay readable.
fn coerce_intent<'de, D>(deserializer: D) -> Result<IntentKind, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let tag = String::deserialize(deserializer)?;
    Ok(IntentKind::coerce(&tag))
}

impl HistoryEntry {
    /// Build an entry stamped with the current time.
    #[must_use]
    pub fn new(
        command: impl Into<String>,
        response: impl Into<String>,
        intent: IntentKind,
    ) -> Self {
        Self {
            command: command.into(),
            response: response.into(),
            intent,
            timestamp: Utc::now(),
        }
    }

    /// True when both sides of the exchange are populated — only such entries
    /// are worth embedding as prompt context.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.command.trim().is_empty() && !self.response.trim().is_empty()
    }
}

/// A stored history record in either the legacy or the structured shape.
///
/// Pre-migration records are bare command strings. serde tries the structured
/// shape first, then falls back to the string.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HistoryRecord {
    /// Current structured shape.
    Entry(HistoryEntry),
    /// Legacy bare command string.
    Legacy(String),
}

impl HistoryRecord {
    /// Normalize to the structured shape.
    ///
    /// Legacy records upgrade to an entry with an empty response, `general`
    /// intent, and the current timestamp.
    #[must_use]
    pub fn into_entry(self) -> HistoryEntry {
        match self {
            HistoryRecord::Entry(entry) => entry,
            HistoryRecord::Legacy(command) => HistoryEntry {
                command,
                response: String::new(),
                intent: IntentKind::General,
                timestamp: Utc::now(),
            },
        }
    }
}

impl From<HistoryEntry> for HistoryRecord {
    fn from(entry: HistoryEntry) -> Self {
        HistoryRecord::Entry(entry)
    }
}

/// Error from a history/session store backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The session id does not exist.
    #[error("unknown session: {0}")]
    UnknownSession(String),
    /// Backend failure (connection, SQL, serialization).
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Ordered, append-only conversation log keyed by session.
///
/// The interpreter treats `append` failures as non-fatal: they are logged,
/// never surfaced to the caller.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Load the most recent `limit` entries for a session, oldest first.
    async fn load(&self, session_id: &str, limit: usize) -> Result<Vec<HistoryEntry>, StoreError>;

    /// Append one entry to a session's log.
    async fn append(&self, session_id: &str, entry: HistoryEntry) -> Result<(), StoreError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_new_stamps_now() {
        let entry = HistoryEntry::new("what time is it", "current time is 03:15 PM", IntentKind::GetTime);
        assert_eq!(entry.intent, IntentKind::GetTime);
        assert!(entry.timestamp <= Utc::now());
    }

    #[test]
    fn is_complete_requires_both_sides() {
        assert!(HistoryEntry::new("hi", "Hello.", IntentKind::General).is_complete());
        assert!(!HistoryEntry::new("hi", "", IntentKind::General).is_complete());
        assert!(!HistoryEntry::new("  ", "Hello.", IntentKind::General).is_complete());
    }

    #[test]
    fn record_parses_structured_shape() {
        let json = r#"{"command":"hi","response":"Hello.","type":"general","timestamp":"2026-01-15T12:00:00Z"}"#;
        let record: HistoryRecord = serde_json::from_str(json).unwrap();
        let entry = record.into_entry();
        assert_eq!(entry.command, "hi");
        assert_eq!(entry.response, "Hello.");
    }

    #[test]
    fn record_parses_legacy_string() {
        let record: HistoryRecord = serde_json::from_str(r#""open calculator""#).unwrap();
        assert_eq!(record, HistoryRecord::Legacy("open calculator".into()));
    }

    #[test]
    fn legacy_upgrades_to_empty_entry() {
        let entry = HistoryRecord::Legacy("open calculator".into()).into_entry();
        assert_eq!(entry.command, "open calculator");
        assert_eq!(entry.response, "");
        assert_eq!(entry.intent, IntentKind::General);
    }

    #[test]
    fn structured_record_round_trips() {
        let entry = HistoryEntry::new("hi", "Hello.", IntentKind::General);
        let record = HistoryRecord::from(entry.clone());
        let json = serde_json::to_string(&record).unwrap();
        let back: HistoryRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.into_entry(), entry);
    }

    #[test]
    fn unknown_intent_tag_in_stored_entry_coerces() {
        // Rows written under an older vocabulary must stay readable.
        let json = r#"{"command":"x","response":"y","type":"mystery","timestamp":"2026-01-15T12:00:00Z"}"#;
        let record: HistoryRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.into_entry().intent, IntentKind::General);
    }
}
