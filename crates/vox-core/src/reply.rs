//! Parsed replies — the structured result of interpreting one command.

use serde::{Deserialize, Serialize};

use crate::intent::IntentKind;

/// The validated result of interpreting one command.
///
/// INVARIANT: `response` is non-empty in every value handed back to a caller;
/// upstream failures substitute a canned apology rather than an empty string.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedReply {
    /// What action the command maps to.
    #[serde(rename = "type")]
    pub intent: IntentKind,
    /// The original user command, echoed back.
    pub user_input: String,
    /// The text to speak or display.
    pub response: String,
    /// Extracted search term; only meaningful for search/video kinds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_query: Option<String>,
}

impl ParsedReply {
    /// Build a general reply with no search query.
    #[must_use]
    pub fn general(user_input: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            intent: IntentKind::General,
            user_input: user_input.into(),
            response: response.into(),
            search_query: None,
        }
    }

    /// The query to hand to a search/video page.
    ///
    /// Falls back to the raw user input when the model did not extract a
    /// dedicated term.
    #[must_use]
    pub fn search_query(&self) -> &str {
        match self.search_query.as_deref() {
            Some(q) if !q.trim().is_empty() => q,
            _ => &self.user_input,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
