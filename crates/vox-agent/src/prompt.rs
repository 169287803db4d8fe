//! Prompt builder — one instruction block per interpretation.
//!
//! The output-format directive and brevity rules are the one place the model
//! can be steered: the reply is spoken aloud or shown on a single line, so
//! the prompt forbids greetings, follow-up questions, and long answers.

use vox_core::{HistoryEntry, IntentKind};

/// How many recent exchanges to embed as context.
pub const HISTORY_WINDOW: usize = 3;

/// Build the instruction block for one command.
///
/// Pure and deterministic: identical inputs produce identical prompts, and no
/// wall-clock content is embedded. Only history entries with both sides
/// populated become `Q:`/`A:` context lines.
#[must_use]
pub fn build_prompt(
    command: &str,
    assistant_name: &str,
    user_name: &str,
    recent_history: &[HistoryEntry],
) -> String {
    let mut history_context = String::new();
    let window = recent_history
        .iter()
        .rev()
        .take(HISTORY_WINDOW)
        .filter(|e| e.is_complete())
        .collect::<Vec<_>>();
    if !window.is_empty() {
        history_context.push_str("\nRecent context:\n");
        for entry in window.into_iter().rev() {
            history_context.push_str(&format!("Q: {}\nA: {}\n", entry.command, entry.response));
        }
    }

    let vocabulary = IntentKind::ALL
        .iter()
        .map(|k| k.as_tag())
        .collect::<Vec<_>>()
        .join("|");

    let escaped_command = command.replace('"', "\\\"");

    format!(
        r#"You are {assistant_name}, {user_name}'s assistant. Respond DIRECTLY and CONCISELY (20-30 words max).

{history_context}
RESPOND ONLY with valid JSON (no extra text):
{{
  "type": "{vocabulary}",
  "userInput": "{escaped_command}",
  "response": "Direct answer only, 20-50 words max",
  "searchQuery": "extracted search term (for search/youtube only)"
}}

Rules:
- DIRECT answers only. NO greetings, NO questions back
- 20-50 words MAX
- 'general' type for most queries
- 'google-search' only if user asks to search - EXTRACT search term in searchQuery
- 'youtube-play' only if user asks to play/watch/open video - EXTRACT video name in searchQuery
- Do NOT ask follow-up questions or add extra text

User command: {command}"#
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(command: &str, response: &str) -> HistoryEntry {
        HistoryEntry::new(command, response, IntentKind::General)
    }

    #[test]
    fn names_persona_and_command() {
        let prompt = build_prompt("what time is it", "Friday", "Sam", &[]);
        assert!(prompt.starts_with("You are Friday, Sam's assistant."));
        assert!(prompt.ends_with("User command: what time is it"));
    }

    #[test]
    fn enumerates_full_intent_vocabulary() {
        let prompt = build_prompt("hi", "Friday", "Sam", &[]);
        for kind in IntentKind::ALL {
            assert!(prompt.contains(kind.as_tag()), "missing tag {kind}");
        }
    }

    #[test]
    fn embeds_last_three_complete_entries() {
        let history = vec![
            entry("one", "1"),
            entry("two", "2"),
            entry("three", "3"),
            entry("four", "4"),
        ];
        let prompt = build_prompt("hi", "Friday", "Sam", &history);
        assert!(!prompt.contains("Q: one"));
        assert!(prompt.contains("Q: two\nA: 2"));
        assert!(prompt.contains("Q: three\nA: 3"));
        assert!(prompt.contains("Q: four\nA: 4"));
        // Order preserved: oldest of the window first.
        let two = prompt.find("Q: two").unwrap();
        let four = prompt.find("Q: four").unwrap();
        assert!(two < four);
    }

    #[test]
    fn skips_incomplete_entries() {
        let history = vec![entry("lost command", ""), entry("kept", "answer")];
        let prompt = build_prompt("hi", "Friday", "Sam", &history);
        assert!(!prompt.contains("Q: lost command"));
        assert!(prompt.contains("Q: kept"));
    }

    #[test]
    fn no_context_block_for_empty_history() {
        let prompt = build_prompt("hi", "Friday", "Sam", &[]);
        assert!(!prompt.contains("Recent context:"));
    }

    #[test]
    fn escapes_quotes_in_echoed_command() {
        let prompt = build_prompt(r#"say "hello""#, "Friday", "Sam", &[]);
        assert!(prompt.contains(r#""userInput": "say \"hello\"""#));
    }

    #[test]
    fn deterministic() {
        let history = vec![entry("a", "b")];
        let one = build_prompt("hi", "Friday", "Sam", &history);
        let two = build_prompt("hi", "Friday", "Sam", &history);
        assert_eq!(one, two);
    }
}
